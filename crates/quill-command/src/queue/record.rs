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

//! Recording: the calls that build the batch chain.

use super::CommandQueue;
use crate::batch::{BatchId, BatchKind};
use crate::uniform::{UniformOp, UniformState};
use quill_core::math::{Mat4, Rgba, RoundedRect};
use quill_core::renderer::{
    ClearFlags, FramebufferId, PixelRect, ProgramId, TextureId, TextureSlot, TextureTarget,
    UniformLocation, Vertex, QUAD_VERTICES,
};
use smallvec::SmallVec;

impl CommandQueue {
    /// Switches the program subsequent draws use.
    ///
    /// An open batch without vertices is reassigned in place; otherwise it is
    /// closed and a new batch is opened.
    pub fn use_program(&mut self, program: ProgramId) {
        self.assert_recording();
        self.program = program;

        match self.current {
            Some(id) if self.batches.get(id).is_empty() => {
                self.batches.set_program(id, program);
                let changed = self.last_draw_program(id) != program;
                self.batches.get_mut(id).program_changed = changed;
            }
            _ => {
                self.close_current();
                self.open_batch(BatchKind::Draw);
            }
        }
    }

    /// Appends one quad and returns the index of its first vertex.
    ///
    /// # Panics
    ///
    /// Panics if no program is in use.
    pub fn draw(&mut self, vertices: &[Vertex; QUAD_VERTICES]) -> u32 {
        let id = self.open_draw();
        let offset = self.vertices.push(vertices);
        self.batches
            .get_mut(id)
            .push_span(offset, QUAD_VERTICES as u32);
        offset
    }

    /// Appends one quad and returns its zeroed vertices to be written in place.
    ///
    /// # Panics
    ///
    /// Panics if no program is in use.
    pub fn reserve_draw(&mut self) -> &mut [Vertex] {
        let id = self.open_draw();
        let (vertices, offset) = self.vertices.advance(QUAD_VERTICES);
        self.batches
            .get_mut(id)
            .push_span(offset, QUAD_VERTICES as u32);
        vertices
    }

    /// Binds `texture` to `target` on `slot` for subsequent draws.
    pub fn bind_texture(&mut self, target: TextureTarget, slot: TextureSlot, texture: TextureId) {
        if self.attachments.is_texture_bound(target, slot, texture) {
            return;
        }
        self.split_before_state_change();
        self.attachments.bind_texture(target, slot, texture);
    }

    /// Makes subsequent draws and clears render into `framebuffer`.
    pub fn bind_framebuffer(&mut self, framebuffer: FramebufferId) {
        if self.attachments.framebuffer() == framebuffer {
            return;
        }
        self.split_before_state_change();
        self.attachments.bind_framebuffer(framebuffer);
        self.sync_open_batch();
    }

    /// Sets the viewport of subsequent batches; `None` keeps whatever is applied.
    pub fn set_viewport(&mut self, viewport: Option<PixelRect>) {
        if self.viewport == viewport {
            return;
        }
        self.split_before_state_change();
        self.viewport = viewport;
        self.sync_open_batch();
    }

    /// Sets the scissor clip of subsequent batches; `None` disables clipping.
    pub fn set_clip(&mut self, clip: Option<PixelRect>) {
        if self.clip == clip {
            return;
        }
        self.split_before_state_change();
        self.clip = clip;
        self.sync_open_batch();
    }

    /// Clears the current framebuffer. An empty mask clears every buffer.
    pub fn clear(&mut self, flags: ClearFlags) {
        self.assert_recording();
        self.append_marker(BatchKind::Clear(flags.or_all()));
    }

    /// Opens a named debug group around the batches recorded next.
    pub fn push_debug_group(&mut self, label: impl Into<String>) {
        self.assert_recording();
        if self.settings.debug_groups {
            self.append_marker(BatchKind::PushDebugGroup(label.into()));
        }
    }

    /// Closes the innermost debug group.
    pub fn pop_debug_group(&mut self) {
        self.assert_recording();
        if self.settings.debug_groups {
            self.append_marker(BatchKind::PopDebugGroup);
        }
    }

    /// Sets a `float` uniform of `program`.
    pub fn set_uniform1f(&mut self, program: ProgramId, location: UniformLocation, v0: f32) {
        self.update_uniforms(program, |u| u.set1f(program, location, v0));
    }

    /// Sets a `vec2` uniform.
    pub fn set_uniform2f(&mut self, program: ProgramId, location: UniformLocation, v0: f32, v1: f32) {
        self.update_uniforms(program, |u| u.set2f(program, location, v0, v1));
    }

    /// Sets a `vec3` uniform.
    pub fn set_uniform3f(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        v0: f32,
        v1: f32,
        v2: f32,
    ) {
        self.update_uniforms(program, |u| u.set3f(program, location, v0, v1, v2));
    }

    /// Sets a `vec4` uniform.
    pub fn set_uniform4f(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        v0: f32,
        v1: f32,
        v2: f32,
        v3: f32,
    ) {
        self.update_uniforms(program, |u| u.set4f(program, location, v0, v1, v2, v3));
    }

    /// Sets a `float[]` uniform. The array length is fixed by the first set.
    pub fn set_uniform1fv(&mut self, program: ProgramId, location: UniformLocation, values: &[f32]) {
        self.update_uniforms(program, |u| u.set1fv(program, location, values));
    }

    /// Sets a `vec2[]` uniform.
    pub fn set_uniform2fv(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        values: &[[f32; 2]],
    ) {
        self.update_uniforms(program, |u| u.set2fv(program, location, values));
    }

    /// Sets a `vec3[]` uniform.
    pub fn set_uniform3fv(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        values: &[[f32; 3]],
    ) {
        self.update_uniforms(program, |u| u.set3fv(program, location, values));
    }

    /// Sets a `vec4[]` uniform.
    pub fn set_uniform4fv(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        values: &[[f32; 4]],
    ) {
        self.update_uniforms(program, |u| u.set4fv(program, location, values));
    }

    /// Sets an `int` uniform.
    pub fn set_uniform1i(&mut self, program: ProgramId, location: UniformLocation, v0: i32) {
        self.update_uniforms(program, |u| u.set1i(program, location, v0));
    }

    /// Sets an `ivec2` uniform.
    pub fn set_uniform2i(&mut self, program: ProgramId, location: UniformLocation, v0: i32, v1: i32) {
        self.update_uniforms(program, |u| u.set2i(program, location, v0, v1));
    }

    /// Sets an `ivec3` uniform.
    pub fn set_uniform3i(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        v0: i32,
        v1: i32,
        v2: i32,
    ) {
        self.update_uniforms(program, |u| u.set3i(program, location, v0, v1, v2));
    }

    /// Sets an `ivec4` uniform.
    pub fn set_uniform4i(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        v0: i32,
        v1: i32,
        v2: i32,
        v3: i32,
    ) {
        self.update_uniforms(program, |u| u.set4i(program, location, v0, v1, v2, v3));
    }

    /// Sets a `mat4` uniform.
    pub fn set_uniform_matrix(&mut self, program: ProgramId, location: UniformLocation, matrix: &Mat4) {
        self.update_uniforms(program, |u| u.set_matrix(program, location, matrix));
    }

    /// Sets a rounded-rectangle uniform.
    pub fn set_uniform_rounded_rect(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        rounded_rect: &RoundedRect,
    ) {
        self.update_uniforms(program, |u| u.set_rounded_rect(program, location, rounded_rect));
    }

    /// Sets a color uniform; `None` uploads transparent black.
    pub fn set_uniform_color(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        color: Option<&Rgba>,
    ) {
        self.update_uniforms(program, |u| u.set_color(program, location, color));
    }

    /// Binds `texture` on `slot` and points the sampler at `location` to it.
    pub fn set_uniform_texture(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        target: TextureTarget,
        slot: TextureSlot,
        texture: TextureId,
    ) {
        self.bind_texture(target, slot, texture);
        self.update_uniforms(program, |u| u.set_texture(program, location, slot));
    }

    fn assert_recording(&self) {
        assert!(
            self.in_frame,
            "CommandQueue: recording outside of begin_frame/end_frame"
        );
    }

    fn update_uniforms(&mut self, program: ProgramId, update: impl FnOnce(&mut UniformState)) {
        let splits = self
            .current
            .is_some_and(|id| self.batches.get(id).program == program);
        if splits {
            self.split_before_state_change();
        }
        update(&mut self.uniforms);
    }

    /// Returns the open draw batch, opening one if needed.
    fn open_draw(&mut self) -> BatchId {
        self.assert_recording();
        assert!(
            !self.program.is_none(),
            "CommandQueue: draw called without a program in use"
        );
        match self.current {
            Some(id) if self.batches.get(id).is_draw() => id,
            _ => {
                self.close_current();
                self.open_batch(BatchKind::Draw)
            }
        }
    }

    /// Appends a clear or debug marker, reusing an empty open draw batch.
    fn append_marker(&mut self, kind: BatchKind) {
        match self.current {
            Some(id) if self.batches.get(id).is_empty() => {
                self.batches.set_program(id, ProgramId::NONE);
                let batch = self.batches.get_mut(id);
                batch.kind = kind;
                batch.program_changed = false;
                self.last_barrier = Some(batch.seq);
            }
            _ => {
                self.close_current();
                self.open_batch(kind);
            }
        }
    }

    /// Closes the open draw batch if it already holds vertices, so they keep
    /// the state they were recorded with, and opens an empty one in its place.
    pub(super) fn split_before_state_change(&mut self) {
        let Some(id) = self.current else {
            return;
        };
        let batch = self.batches.get(id);
        if batch.is_draw() && !batch.spans.is_empty() {
            self.close_current();
            self.open_batch(BatchKind::Draw);
        }
    }

    /// Copies the recording state into an empty open draw batch.
    pub(super) fn sync_open_batch(&mut self) {
        let Some(id) = self.current else {
            return;
        };
        if !self.batches.get(id).is_empty() {
            return;
        }
        let framebuffer = self.attachments.framebuffer();
        self.attachments.take_framebuffer_change();
        let changed = self.previous_framebuffer(id) != framebuffer;

        let batch = self.batches.get_mut(id);
        batch.framebuffer = framebuffer;
        batch.framebuffer_changed = changed;
        batch.viewport = self.viewport;
        batch.clip = self.clip;
    }

    pub(super) fn open_batch(&mut self, kind: BatchKind) -> BatchId {
        let is_draw = kind == BatchKind::Draw;
        let program = if is_draw { self.program } else { ProgramId::NONE };
        let id = self.batches.push_back(kind, program);

        let framebuffer = self.attachments.framebuffer();
        self.attachments.take_framebuffer_change();
        let framebuffer_changed = self.previous_framebuffer(id) != framebuffer;
        let program_changed = is_draw && self.last_draw_program(id) != program;

        let batch = self.batches.get_mut(id);
        batch.framebuffer = framebuffer;
        batch.framebuffer_changed = framebuffer_changed;
        batch.program_changed = program_changed;
        batch.viewport = self.viewport;
        batch.clip = self.clip;
        if !is_draw {
            self.last_barrier = Some(batch.seq);
        }

        log::trace!("CommandQueue: opened {:?} batch on program {}", batch.kind, program.0);
        self.current = Some(id);
        id
    }

    /// Closes the open batch: captures the uniform and bind diffs of a draw
    /// batch and tries to merge it into an earlier one. An empty draw batch
    /// is dropped.
    pub(super) fn close_current(&mut self) {
        let Some(id) = self.current.take() else {
            return;
        };
        let batch = self.batches.get_mut(id);
        if !batch.is_draw() {
            return;
        }
        if batch.spans.is_empty() {
            self.batches.remove(id);
            return;
        }

        let program = batch.program;
        self.uniforms.snapshot(program, |info, location| {
            batch.uniforms.push(UniformOp::new(info, location))
        });
        let mut binds = SmallVec::new();
        self.attachments.take_texture_changes(|op| binds.push(op));
        batch.binds = binds;
        batch.seal();

        if !self.try_merge(id) && self.batches.get(id).is_reorder_barrier() {
            self.last_barrier = Some(self.batches.get(id).seq);
        }
    }

    /// Folds the closed batch `id` into an earlier batch of its program when
    /// replaying its draws there renders the same result.
    fn try_merge(&mut self, id: BatchId) -> bool {
        let candidate = self.batches.get(id);
        let adjacent = self.batches.prev(id);
        let carries_ops = !candidate.uniforms.is_empty() || !candidate.binds.is_empty();

        let mut cursor = self.batches.program_prev(id);
        let mut steps = 0;
        while let Some(target_id) = cursor {
            if steps == self.settings.merge_window {
                break;
            }
            steps += 1;

            let target = self.batches.get(target_id);
            if self.last_barrier.is_some_and(|barrier| barrier > target.seq) {
                break;
            }
            if Some(target_id) != adjacent && (carries_ops || candidate.viewport.is_none()) {
                break;
            }

            if target.is_draw()
                && target.framebuffer == candidate.framebuffer
                && target.clip == candidate.clip
                && target.viewport == candidate.viewport
            {
                let (target, candidate) = self.batches.pair_mut(target_id, id);
                target.absorb(candidate);
                let target_seq = target.seq;
                let barrier = target.is_reorder_barrier();
                self.batches.remove(id);
                if barrier {
                    self.last_barrier = self.last_barrier.max(Some(target_seq));
                }

                self.stats.batches_merged += 1;
                log::trace!("CommandQueue: merged batch into an earlier one ({} steps back)", steps);
                return true;
            }

            if !target.uniforms.is_empty() {
                break;
            }
            cursor = self.batches.program_prev(target_id);
        }
        false
    }

    /// The framebuffer replay is bound to right before batch `id`.
    fn previous_framebuffer(&self, id: BatchId) -> FramebufferId {
        self.batches
            .prev(id)
            .map_or(FramebufferId::DEFAULT, |prev| self.batches.get(prev).framebuffer)
    }

    /// The program replay is using right before batch `id`.
    fn last_draw_program(&self, id: BatchId) -> ProgramId {
        let mut cursor = self.batches.prev(id);
        while let Some(prev) = cursor {
            let batch = self.batches.get(prev);
            if batch.is_draw() {
                return batch.program;
            }
            cursor = self.batches.prev(prev);
        }
        ProgramId::NONE
    }
}
