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

//! An append-only vertex store uploaded to the GPU once per frame.
//!
//! Vertices accumulate in a CPU-side array while a frame is recorded. At
//! execution the whole array is copied in a single transfer into one of
//! several GPU-side *shadow* buffers, chosen round-robin so that a frame never
//! overwrites the buffer the GPU may still be drawing the previous frame from.
//!
//! ```text
//! Frame N:     [Shadow 0: CPU uploads]  [Shadow 1: GPU may read]
//! Frame N+1:   [Shadow 0: GPU may read] [Shadow 1: CPU uploads]
//! ```

use crate::settings::MIN_SHADOW_BUFFERS;
use quill_core::renderer::{BufferId, GlDevice, ResourceError, Vertex};

/// Shadow buffers grow in whole pages.
const PAGE_SIZE: usize = 4096;

/// Extra pages allocated on top of the rounded-down upload size when growing.
const GROWTH_PAGES: usize = 4;

/// The GPU size a shadow is reallocated to for an upload of `upload_size` bytes.
pub fn grown_size(upload_size: usize) -> usize {
    (upload_size & !(PAGE_SIZE - 1)) + GROWTH_PAGES * PAGE_SIZE
}

#[derive(Debug)]
struct ShadowBuffer {
    id: BufferId,
    size_on_gpu: usize,
}

/// The double-buffered vertex stream of a command queue.
#[derive(Debug)]
pub struct VertexStreamBuffer {
    vertices: Vec<Vertex>,
    shadows: Vec<ShadowBuffer>,
    current: usize,
    reallocations: u32,
}

impl VertexStreamBuffer {
    /// Creates the stream with `shadow_count` GPU buffers, each able to hold
    /// `reserved` vertices without growing.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if a buffer cannot be created. Buffers
    /// created before the failure are deleted again.
    pub fn new(
        device: &mut dyn GlDevice,
        shadow_count: usize,
        reserved: usize,
    ) -> Result<Self, ResourceError> {
        let shadow_count = shadow_count.max(MIN_SHADOW_BUFFERS);
        let initial_size = reserved * Vertex::STRIDE;
        let mut shadows: Vec<ShadowBuffer> = Vec::with_capacity(shadow_count);

        for _ in 0..shadow_count {
            let id = match device.create_buffer() {
                Ok(id) => id,
                Err(e) => {
                    for shadow in &shadows {
                        device.delete_buffer(shadow.id);
                    }
                    return Err(e);
                }
            };
            device.bind_array_buffer(Some(id));
            device.allocate_array_buffer(initial_size);
            shadows.push(ShadowBuffer {
                id,
                size_on_gpu: initial_size,
            });
        }
        device.bind_array_buffer(None);

        Ok(Self {
            vertices: Vec::with_capacity(reserved),
            shadows,
            current: 0,
            reallocations: 0,
        })
    }

    /// Reserves `count` vertices at the end of this frame's array.
    ///
    /// Returns the zero-initialised slice to write them through, together with
    /// the index of the first one, which is also its position in the uploaded
    /// GPU buffer.
    pub fn advance(&mut self, count: usize) -> (&mut [Vertex], u32) {
        let offset = self.vertices.len();
        self.vertices.resize(offset + count, Vertex::default());
        (&mut self.vertices[offset..], offset as u32)
    }

    /// Appends `vertices` and returns the index of the first one.
    pub fn push(&mut self, vertices: &[Vertex]) -> u32 {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        offset
    }

    /// Uploads the accumulated vertices into this frame's shadow buffer, which
    /// stays bound to `GL_ARRAY_BUFFER`, then selects the next shadow and
    /// empties the array.
    ///
    /// # Returns
    ///
    /// `true` if the shadow buffer had to be reallocated.
    pub fn submit(&mut self, device: &mut dyn GlDevice) -> Result<bool, ResourceError> {
        let bytes: &[u8] = bytemuck::cast_slice(&self.vertices);
        let shadow = &mut self.shadows[self.current];
        let grown = bytes.len() > shadow.size_on_gpu;

        if grown {
            let size_on_gpu = grown_size(bytes.len());
            log::debug!(
                "VertexStreamBuffer: growing shadow {} from {} to {} bytes",
                self.current,
                shadow.size_on_gpu,
                size_on_gpu
            );
            let id = device.create_buffer()?;
            device.bind_array_buffer(None);
            device.delete_buffer(shadow.id);
            shadow.id = id;
            device.bind_array_buffer(Some(shadow.id));
            device.allocate_array_buffer(size_on_gpu);
            shadow.size_on_gpu = size_on_gpu;
            self.reallocations += 1;
        } else {
            device.bind_array_buffer(Some(shadow.id));
        }

        if !bytes.is_empty() {
            device.write_array_buffer(0, bytes);
        }

        self.current = (self.current + 1) % self.shadows.len();
        self.vertices.clear();
        Ok(grown)
    }

    /// Drops the accumulated vertices without uploading them.
    pub fn discard(&mut self) {
        self.vertices.clear();
    }

    /// Deletes every shadow buffer.
    pub fn destroy(&mut self, device: &mut dyn GlDevice) {
        for shadow in self.shadows.drain(..) {
            device.delete_buffer(shadow.id);
        }
    }

    /// The number of vertices recorded this frame.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if no vertex was recorded this frame.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The vertices recorded this frame.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// The index of the shadow buffer the next `submit` uploads into.
    pub fn current_shadow(&self) -> usize {
        self.current
    }

    /// The number of shadow buffers.
    pub fn shadow_count(&self) -> usize {
        self.shadows.len()
    }

    /// The allocated GPU size in bytes of shadow `index`.
    pub fn shadow_size(&self, index: usize) -> usize {
        self.shadows[index].size_on_gpu
    }

    /// Total number of shadow reallocations since creation.
    pub fn reallocations(&self) -> u32 {
        self.reallocations
    }
}
