// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The recorded call stream.

use quill_core::renderer::*;
use std::cell::RefCell;
use std::rc::Rc;

/// One GL call as seen by a [`RecordingDevice`](super::RecordingDevice).
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum GlCall {
    UseProgram(ProgramId),
    DeleteProgram(ProgramId),
    EnableDepthTest,
    EnablePremultipliedBlending,
    Viewport(PixelRect),
    Scissor(Option<PixelRect>),
    BindFramebuffer(FramebufferId),
    BindTexture {
        slot: TextureSlot,
        target: TextureTarget,
        texture: TextureId,
    },
    CreateVertexArray(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    DeleteVertexArray(VertexArrayId),
    CreateBuffer(BufferId),
    DeleteBuffer(BufferId),
    BindArrayBuffer(Option<BufferId>),
    AllocateArrayBuffer {
        size: usize,
    },
    WriteArrayBuffer {
        offset: usize,
        len: usize,
    },
    VertexAttribute {
        location: u32,
        components: u32,
        stride: usize,
        offset: usize,
    },
    /// Any `glUniform{1,2,3,4}f[v]` call; `components` is the vector width.
    UniformFloat {
        location: UniformLocation,
        components: u32,
        values: Vec<f32>,
    },
    /// Any `glUniform{1,2,3,4}i` call.
    UniformInt {
        location: UniformLocation,
        components: u32,
        values: Vec<i32>,
    },
    UniformMatrix4 {
        location: UniformLocation,
        values: [f32; 16],
    },
    Clear(ClearFlags),
    DrawArrays {
        first: u32,
        count: u32,
    },
    PushDebugGroup(String),
    PopDebugGroup,
    CreateTexture(TextureId),
    SetTextureFilters {
        min_filter: FilterMode,
        mag_filter: FilterMode,
    },
    AllocateTexture2d {
        width: u32,
        height: u32,
        with_pixels: bool,
    },
    DeleteTextures(Vec<TextureId>),
    CreateFramebuffer(FramebufferId),
    AttachColorTexture(TextureId),
    CheckFramebufferStatus,
    DeleteFramebuffers(Vec<FramebufferId>),
}

impl GlCall {
    /// Returns the uniform location this call uploads to, if it is a uniform upload.
    pub fn uniform_location(&self) -> Option<UniformLocation> {
        match self {
            GlCall::UniformFloat { location, .. }
            | GlCall::UniformInt { location, .. }
            | GlCall::UniformMatrix4 { location, .. } => Some(*location),
            _ => None,
        }
    }
}

/// A shared, append-only log of [`GlCall`]s.
///
/// Cloning the log yields another handle onto the same stream, so a test can
/// keep one while the device is boxed away inside a command queue.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Rc<RefCell<Vec<GlCall>>>,
}

impl CallLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, call: GlCall) {
        self.calls.borrow_mut().push(call);
    }

    /// Returns a copy of every recorded call, oldest first.
    pub fn calls(&self) -> Vec<GlCall> {
        self.calls.borrow().clone()
    }

    /// Removes and returns every recorded call.
    pub fn take(&self) -> Vec<GlCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    /// Forgets every recorded call.
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// The number of recorded calls.
    pub fn len(&self) -> usize {
        self.calls.borrow().len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    /// Counts the calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&GlCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| predicate(call)).count()
    }

    /// Returns `(first, count)` for every `draw_arrays` call, in order.
    pub fn draws(&self) -> Vec<(u32, u32)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                GlCall::DrawArrays { first, count } => Some((*first, *count)),
                _ => None,
            })
            .collect()
    }

    /// Returns every program made current, in order.
    pub fn program_switches(&self) -> Vec<ProgramId> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                GlCall::UseProgram(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Returns every uniform upload targeting `location`, in order.
    pub fn uniform_uploads(&self, location: UniformLocation) -> Vec<GlCall> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.uniform_location() == Some(location))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_the_stream() {
        let log = CallLog::new();
        let other = log.clone();
        other.push(GlCall::UseProgram(ProgramId(3)));
        other.push(GlCall::DrawArrays { first: 0, count: 6 });

        assert_eq!(log.len(), 2);
        assert_eq!(log.program_switches(), vec![ProgramId(3)]);
        assert_eq!(log.draws(), vec![(0, 6)]);

        assert_eq!(log.take().len(), 2);
        assert!(other.is_empty());
    }
}
