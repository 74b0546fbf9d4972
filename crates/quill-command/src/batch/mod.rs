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

//! Batches: the indivisible units of replay.

mod list;

pub use self::list::{BatchId, BatchList, Iter};

use crate::attachment::BindOp;
use crate::uniform::UniformOp;
use quill_core::renderer::{ClearFlags, FramebufferId, PixelRect, ProgramId};
use smallvec::SmallVec;

/// What a batch does when replayed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BatchKind {
    /// Draws its spans with its program.
    #[default]
    Draw,
    /// Clears the selected buffers of its framebuffer.
    Clear(ClearFlags),
    /// Opens a named debug group.
    PushDebugGroup(String),
    /// Closes the innermost debug group.
    PopDebugGroup,
}

/// A contiguous range of the frame's vertex stream drawn by one call.
///
/// The two `*_before` counters tell replay how many of the batch's bind and
/// uniform ops must have been applied before this span is drawn. They only
/// differ between spans once batches have been merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawSpan {
    /// Index of the first vertex.
    pub offset: u32,
    /// Number of vertices.
    pub count: u32,
    /// Bind ops applied before drawing this span.
    pub binds_before: u32,
    /// Uniform ops applied before drawing this span.
    pub uniforms_before: u32,
}

/// The doubly linked list position of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Link {
    pub(crate) prev: Option<BatchId>,
    pub(crate) next: Option<BatchId>,
}

/// One unit of replay together with the state deltas it applies.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    /// What the batch does.
    pub kind: BatchKind,
    /// The program drawing this batch; [`ProgramId::NONE`] for clears and markers.
    pub program: ProgramId,
    /// Set when replay has to switch to `program`.
    pub program_changed: bool,
    /// The framebuffer this batch renders into.
    pub framebuffer: FramebufferId,
    /// Set when `framebuffer` differs from the previous batch's.
    pub framebuffer_changed: bool,
    /// The viewport, or `None` to keep whatever is applied.
    pub viewport: Option<PixelRect>,
    /// The scissor clip, or `None` for no clipping.
    pub clip: Option<PixelRect>,
    /// Texture binds applied before drawing, in order.
    pub binds: SmallVec<[BindOp; 1]>,
    /// Vertex ranges to draw.
    pub spans: SmallVec<[DrawSpan; 1]>,
    /// Uniform uploads applied before drawing, in order.
    pub uniforms: Vec<UniformOp>,
    pub(crate) seq: u64,
    pub(crate) order: Link,
    pub(crate) program_link: Option<Link>,
}

impl Batch {
    /// Returns `true` for draw batches.
    pub fn is_draw(&self) -> bool {
        self.kind == BatchKind::Draw
    }

    /// Returns `true` for a draw batch that has not received any vertices yet.
    pub fn is_empty(&self) -> bool {
        self.is_draw() && self.spans.is_empty()
    }

    /// The total number of vertices drawn.
    pub fn vertex_count(&self) -> u32 {
        self.spans.iter().map(|span| span.count).sum()
    }

    /// The position of the batch in recording order; increases along the chain.
    pub fn sequence(&self) -> u64 {
        self.seq
    }

    /// Returns `true` if no draw may be moved across this batch.
    pub fn is_reorder_barrier(&self) -> bool {
        !self.is_draw() || self.framebuffer_changed || !self.binds.is_empty()
    }

    /// Appends a vertex range, extending the last span when contiguous.
    pub fn push_span(&mut self, offset: u32, count: u32) {
        match self.spans.last_mut() {
            Some(last) if last.offset + last.count == offset => last.count += count,
            _ => self.spans.push(DrawSpan {
                offset,
                count,
                binds_before: 0,
                uniforms_before: 0,
            }),
        }
    }

    /// Marks every span as drawn after all of the batch's ops.
    pub(crate) fn seal(&mut self) {
        let binds = self.binds.len() as u32;
        let uniforms = self.uniforms.len() as u32;
        for span in &mut self.spans {
            span.binds_before = binds;
            span.uniforms_before = uniforms;
        }
    }

    /// Moves the spans and ops of `other` behind this batch's own.
    ///
    /// Spans of `other` keep seeing `other`'s ops; contiguous spans with no
    /// ops between them collapse into one.
    pub(crate) fn absorb(&mut self, other: &mut Batch) {
        let binds_base = self.binds.len() as u32;
        let uniforms_base = self.uniforms.len() as u32;
        self.binds.extend(other.binds.drain(..));
        self.uniforms.append(&mut other.uniforms);

        for mut span in other.spans.drain(..) {
            span.binds_before += binds_base;
            span.uniforms_before += uniforms_base;
            match self.spans.last_mut() {
                Some(last)
                    if last.offset + last.count == span.offset
                        && last.binds_before == span.binds_before
                        && last.uniforms_before == span.uniforms_before =>
                {
                    last.count += span.count
                }
                _ => self.spans.push(span),
            }
        }
    }

    fn reset(&mut self) {
        self.kind = BatchKind::Draw;
        self.program = ProgramId::NONE;
        self.program_changed = false;
        self.framebuffer = FramebufferId::DEFAULT;
        self.framebuffer_changed = false;
        self.viewport = None;
        self.clip = None;
        self.binds.clear();
        self.spans.clear();
        self.uniforms.clear();
        self.seq = 0;
        self.order = Link::default();
        self.program_link = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniform::{UniformFlags, UniformFormat};
    use quill_core::renderer::{TextureId, TextureSlot, TextureTarget, UniformLocation};

    fn uniform(location: u32) -> UniformOp {
        UniformOp {
            location: UniformLocation(location),
            format: UniformFormat::Float1,
            flags: UniformFlags::NONE,
            offset: 0,
            array_count: 1,
        }
    }

    #[test]
    fn test_contiguous_spans_collapse() {
        let mut batch = Batch::default();
        batch.push_span(0, 6);
        batch.push_span(6, 6);
        batch.push_span(18, 6);
        assert_eq!(batch.spans.len(), 2);
        assert_eq!(batch.vertex_count(), 18);
    }

    #[test]
    fn test_absorb_keeps_op_boundaries() {
        let mut a = Batch::default();
        a.push_span(0, 6);
        a.uniforms.push(uniform(1));
        a.seal();

        let mut b = Batch::default();
        b.push_span(6, 6);
        b.uniforms.push(uniform(1));
        b.binds.push(BindOp {
            slot: TextureSlot::new(0),
            target: TextureTarget::Texture2D,
            texture: TextureId(3),
        });
        b.seal();

        a.absorb(&mut b);
        assert_eq!(a.spans.len(), 2);
        assert_eq!(a.spans[0].uniforms_before, 1);
        assert_eq!(a.spans[1].uniforms_before, 2);
        assert_eq!(a.spans[1].binds_before, 1);
        assert_eq!(a.uniforms.len(), 2);
        assert!(b.spans.is_empty() && b.uniforms.is_empty() && b.binds.is_empty());
    }

    #[test]
    fn test_absorb_without_ops_collapses_spans() {
        let mut a = Batch::default();
        a.push_span(0, 6);
        a.seal();
        let mut b = Batch::default();
        b.push_span(6, 6);
        b.seal();

        a.absorb(&mut b);
        assert_eq!(a.spans.len(), 1);
        assert_eq!(a.spans[0].count, 12);
    }
}
