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

//! Replay of the recorded batch chain.

use super::CommandQueue;
use crate::batch::{Batch, BatchKind};
use crate::stats::FrameStats;
use crate::uniform::{UniformFlags, UniformFormat, UniformOp, UniformState};
use quill_core::renderer::{
    FramebufferId, GlDevice, PixelRect, ResourceError, Vertex,
};

/// Vertex attribute locations shared by every program.
const POSITION_ATTRIBUTE: u32 = 0;
const UV_ATTRIBUTE: u32 = 1;

/// The render target state replay has applied so far. `None` means unknown.
#[derive(Debug, Default)]
struct AppliedTarget {
    framebuffer: Option<FramebufferId>,
    viewport: Option<PixelRect>,
    clip: Option<Option<PixelRect>>,
}

impl AppliedTarget {
    fn apply(&mut self, device: &mut dyn GlDevice, batch: &Batch, stats: &mut FrameStats) {
        if self.framebuffer != Some(batch.framebuffer) {
            device.bind_framebuffer(batch.framebuffer);
            self.framebuffer = Some(batch.framebuffer);
            stats.framebuffer_switches += 1;
        }
        if let Some(viewport) = batch.viewport {
            if self.viewport != Some(viewport) {
                device.viewport(viewport);
                self.viewport = Some(viewport);
            }
        }
        if self.clip != Some(batch.clip) {
            device.scissor(batch.clip);
            self.clip = Some(batch.clip);
        }
    }
}

impl CommandQueue {
    /// Closes the open batch and replays the whole chain on the device.
    ///
    /// The vertex stream is uploaded once, then every batch issues only the
    /// state it changes. The frame's statistics are logged and become
    /// available through [`last_frame_stats`](Self::last_frame_stats).
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the vertex array object cannot be
    /// created or the vertex stream cannot be uploaded.
    ///
    /// # Panics
    ///
    /// Panics if no frame is being recorded.
    pub fn execute(&mut self) -> Result<(), ResourceError> {
        assert!(self.in_frame, "CommandQueue: execute without begin_frame");
        self.close_current();

        if self.batches.is_empty() {
            log::trace!("CommandQueue: nothing to execute");
            self.last_frame_stats = self.stats;
            return Ok(());
        }

        self.device.enable_depth_test();
        self.device.enable_premultiplied_blending();

        let vao = self.device.create_vertex_array()?;
        self.device.bind_vertex_array(Some(vao));
        let result = self.replay();
        self.device.bind_vertex_array(None);
        self.device.delete_vertex_array(vao);
        result?;

        self.last_frame_stats = self.stats;
        log::debug!("CommandQueue: {}", self.stats);
        Ok(())
    }

    fn replay(&mut self) -> Result<(), ResourceError> {
        let Self {
            device,
            batches,
            uniforms,
            vertices,
            stats,
            ..
        } = self;
        let device = device.as_mut();

        if vertices.submit(device)? {
            stats.buffer_reallocations += 1;
        }
        device.vertex_attribute(
            POSITION_ATTRIBUTE,
            2,
            Vertex::STRIDE,
            Vertex::POSITION_OFFSET,
        );
        device.vertex_attribute(UV_ATTRIBUTE, 2, Vertex::STRIDE, Vertex::UV_OFFSET);

        let mut target = AppliedTarget::default();
        for (_, batch) in batches.iter() {
            stats.batches_executed += 1;
            match &batch.kind {
                BatchKind::PushDebugGroup(label) => device.push_debug_group(label),
                BatchKind::PopDebugGroup => device.pop_debug_group(),
                BatchKind::Clear(flags) => {
                    target.apply(device, batch, stats);
                    device.clear(*flags);
                    stats.clears += 1;
                }
                BatchKind::Draw => {
                    target.apply(device, batch, stats);
                    if batch.program_changed {
                        device.use_program(batch.program);
                        stats.program_switches += 1;
                    }
                    draw_spans(device, uniforms, batch, stats);
                }
            }
        }
        Ok(())
    }
}

/// Draws each span after applying the bind and uniform ops it depends on.
fn draw_spans(
    device: &mut dyn GlDevice,
    uniforms: &UniformState,
    batch: &Batch,
    stats: &mut FrameStats,
) {
    let mut binds = 0;
    let mut ops = 0;
    for span in &batch.spans {
        let binds_before = span.binds_before as usize;
        for bind in &batch.binds[binds..binds_before] {
            device.bind_texture(bind.slot, bind.target, bind.texture);
            stats.texture_binds += 1;
        }
        binds = binds_before;

        let uniforms_before = span.uniforms_before as usize;
        for op in &batch.uniforms[ops..uniforms_before] {
            upload_uniform(device, uniforms, op);
            stats.uniform_uploads += 1;
        }
        ops = uniforms_before;

        device.draw_arrays(span.offset, span.count);
        stats.draw_calls += 1;
        stats.vertices += span.count;
    }
}

/// Issues the typed upload call matching the format of `op`.
fn upload_uniform(device: &mut dyn GlDevice, uniforms: &UniformState, op: &UniformOp) {
    let location = op.location;
    let count = op.array_count as usize;
    let floats = |n: usize| uniforms.floats(op.offset, n);
    let ints = |n: usize| uniforms.ints(op.offset, n);

    match op.format {
        UniformFormat::Float1 => device.uniform_1f(location, floats(1)[0]),
        UniformFormat::Float2 => {
            let v = floats(2);
            device.uniform_2f(location, v[0], v[1]);
        }
        UniformFormat::Float3 => {
            let v = floats(3);
            device.uniform_3f(location, v[0], v[1], v[2]);
        }
        UniformFormat::Float4 => {
            let v = floats(4);
            device.uniform_4f(location, v[0], v[1], v[2], v[3]);
        }
        UniformFormat::Float1v => device.uniform_1fv(location, floats(count)),
        UniformFormat::Float2v => device.uniform_2fv(location, floats(2 * count)),
        UniformFormat::Float3v => device.uniform_3fv(location, floats(3 * count)),
        UniformFormat::Float4v => device.uniform_4fv(location, floats(4 * count)),
        UniformFormat::Int1 => device.uniform_1i(location, ints(1)[0]),
        UniformFormat::Int2 => {
            let v = ints(2);
            device.uniform_2i(location, v[0], v[1]);
        }
        UniformFormat::Int3 => {
            let v = ints(3);
            device.uniform_3i(location, v[0], v[1], v[2]);
        }
        UniformFormat::Int4 => {
            let v = ints(4);
            device.uniform_4i(location, v[0], v[1], v[2], v[3]);
        }
        UniformFormat::Texture => device.uniform_1i(location, ints(1)[0]),
        UniformFormat::Matrix => {
            let v = floats(16);
            let matrix: [f32; 16] = std::array::from_fn(|i| v[i]);
            device.uniform_matrix_4fv(location, &matrix);
        }
        // bounds, then the four corner sizes as two vec4s
        UniformFormat::RoundedRect => {
            if op.flags.contains(UniformFlags::SEND_CORNERS) {
                device.uniform_4fv(location, floats(12));
            } else {
                device.uniform_4fv(location, floats(4));
            }
        }
        UniformFormat::Color => device.uniform_4fv(location, floats(4)),
    }
}
