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

use super::call::{CallLog, GlCall};
use quill_core::renderer::*;
use std::collections::HashMap;

/// The maximum texture size a fresh [`RecordingDevice`] reports.
const DEFAULT_MAX_TEXTURE_SIZE: u32 = 4096;

/// A [`GlDevice`] that issues nothing and records everything.
///
/// Object names are handed out from a single counter starting at 1. Uniform
/// locations are only known for names registered with
/// [`with_uniform`](Self::with_uniform), which mirrors a program that was
/// linked with exactly those active uniforms.
#[derive(Debug)]
pub struct RecordingDevice {
    log: CallLog,
    next_name: u32,
    max_texture_size: u32,
    gles: bool,
    uniforms: HashMap<(ProgramId, String), UniformLocation>,
    incomplete_framebuffers: bool,
    buffer_limit: Option<u32>,
    buffers_created: u32,
}

impl RecordingDevice {
    /// Creates a recording device reporting a desktop GL context.
    pub fn new() -> Self {
        Self {
            log: CallLog::new(),
            next_name: 1,
            max_texture_size: DEFAULT_MAX_TEXTURE_SIZE,
            gles: false,
            uniforms: HashMap::new(),
            incomplete_framebuffers: false,
            buffer_limit: None,
            buffers_created: 0,
        }
    }

    /// Overrides the reported maximum texture size.
    pub fn with_max_texture_size(mut self, size: u32) -> Self {
        self.max_texture_size = size;
        self
    }

    /// Reports an OpenGL ES context.
    pub fn with_gles(mut self, gles: bool) -> Self {
        self.gles = gles;
        self
    }

    /// Registers an active uniform of `program`.
    pub fn with_uniform(mut self, program: ProgramId, name: &str, location: u32) -> Self {
        self.uniforms
            .insert((program, name.to_owned()), UniformLocation(location));
        self
    }

    /// Makes every framebuffer completeness check fail.
    pub fn with_incomplete_framebuffers(mut self) -> Self {
        self.incomplete_framebuffers = true;
        self
    }

    /// Refuses to create more than `limit` array buffers.
    pub fn with_buffer_limit(mut self, limit: u32) -> Self {
        self.buffer_limit = Some(limit);
        self
    }

    /// Returns a handle onto the call log.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn next_name(&mut self) -> u32 {
        let name = self.next_name;
        self.next_name += 1;
        name
    }

    fn uniform_float(&mut self, location: UniformLocation, components: u32, values: &[f32]) {
        self.log.push(GlCall::UniformFloat {
            location,
            components,
            values: values.to_vec(),
        });
    }

    fn uniform_int(&mut self, location: UniformLocation, values: &[i32]) {
        self.log.push(GlCall::UniformInt {
            location,
            components: values.len() as u32,
            values: values.to_vec(),
        });
    }
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl GlDevice for RecordingDevice {
    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn is_gles(&self) -> bool {
        self.gles
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.uniforms.get(&(program, name.to_owned())).copied()
    }

    fn use_program(&mut self, program: ProgramId) {
        self.log.push(GlCall::UseProgram(program));
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.log.push(GlCall::DeleteProgram(program));
    }

    fn enable_depth_test(&mut self) {
        self.log.push(GlCall::EnableDepthTest);
    }

    fn enable_premultiplied_blending(&mut self) {
        self.log.push(GlCall::EnablePremultipliedBlending);
    }

    fn viewport(&mut self, rect: PixelRect) {
        self.log.push(GlCall::Viewport(rect));
    }

    fn scissor(&mut self, rect: Option<PixelRect>) {
        self.log.push(GlCall::Scissor(rect));
    }

    fn bind_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.log.push(GlCall::BindFramebuffer(framebuffer));
    }

    fn bind_texture(&mut self, slot: TextureSlot, target: TextureTarget, texture: TextureId) {
        self.log.push(GlCall::BindTexture {
            slot,
            target,
            texture,
        });
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, ResourceError> {
        let id = VertexArrayId(self.next_name());
        self.log.push(GlCall::CreateVertexArray(id));
        Ok(id)
    }

    fn bind_vertex_array(&mut self, vao: Option<VertexArrayId>) {
        self.log.push(GlCall::BindVertexArray(vao));
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayId) {
        self.log.push(GlCall::DeleteVertexArray(vao));
    }

    fn create_buffer(&mut self) -> Result<BufferId, ResourceError> {
        if self.buffer_limit.is_some_and(|limit| self.buffers_created >= limit) {
            return Err(ResourceError::CreationFailed {
                resource: "buffer",
                details: "buffer limit reached".to_owned(),
            });
        }
        self.buffers_created += 1;
        let id = BufferId(self.next_name());
        self.log.push(GlCall::CreateBuffer(id));
        Ok(id)
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        self.log.push(GlCall::DeleteBuffer(buffer));
    }

    fn bind_array_buffer(&mut self, buffer: Option<BufferId>) {
        self.log.push(GlCall::BindArrayBuffer(buffer));
    }

    fn allocate_array_buffer(&mut self, size: usize) {
        self.log.push(GlCall::AllocateArrayBuffer { size });
    }

    fn write_array_buffer(&mut self, offset: usize, data: &[u8]) {
        self.log.push(GlCall::WriteArrayBuffer {
            offset,
            len: data.len(),
        });
    }

    fn vertex_attribute(&mut self, location: u32, components: u32, stride: usize, offset: usize) {
        self.log.push(GlCall::VertexAttribute {
            location,
            components,
            stride,
            offset,
        });
    }

    fn uniform_1f(&mut self, location: UniformLocation, x: f32) {
        self.uniform_float(location, 1, &[x]);
    }

    fn uniform_2f(&mut self, location: UniformLocation, x: f32, y: f32) {
        self.uniform_float(location, 2, &[x, y]);
    }

    fn uniform_3f(&mut self, location: UniformLocation, x: f32, y: f32, z: f32) {
        self.uniform_float(location, 3, &[x, y, z]);
    }

    fn uniform_4f(&mut self, location: UniformLocation, x: f32, y: f32, z: f32, w: f32) {
        self.uniform_float(location, 4, &[x, y, z, w]);
    }

    fn uniform_1fv(&mut self, location: UniformLocation, values: &[f32]) {
        self.uniform_float(location, 1, values);
    }

    fn uniform_2fv(&mut self, location: UniformLocation, values: &[f32]) {
        self.uniform_float(location, 2, values);
    }

    fn uniform_3fv(&mut self, location: UniformLocation, values: &[f32]) {
        self.uniform_float(location, 3, values);
    }

    fn uniform_4fv(&mut self, location: UniformLocation, values: &[f32]) {
        self.uniform_float(location, 4, values);
    }

    fn uniform_1i(&mut self, location: UniformLocation, x: i32) {
        self.uniform_int(location, &[x]);
    }

    fn uniform_2i(&mut self, location: UniformLocation, x: i32, y: i32) {
        self.uniform_int(location, &[x, y]);
    }

    fn uniform_3i(&mut self, location: UniformLocation, x: i32, y: i32, z: i32) {
        self.uniform_int(location, &[x, y, z]);
    }

    fn uniform_4i(&mut self, location: UniformLocation, x: i32, y: i32, z: i32, w: i32) {
        self.uniform_int(location, &[x, y, z, w]);
    }

    fn uniform_matrix_4fv(&mut self, location: UniformLocation, values: &[f32; 16]) {
        self.log.push(GlCall::UniformMatrix4 {
            location,
            values: *values,
        });
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.log.push(GlCall::Clear(flags));
    }

    fn draw_arrays(&mut self, first: u32, count: u32) {
        self.log.push(GlCall::DrawArrays { first, count });
    }

    fn push_debug_group(&mut self, label: &str) {
        self.log.push(GlCall::PushDebugGroup(label.to_owned()));
    }

    fn pop_debug_group(&mut self) {
        self.log.push(GlCall::PopDebugGroup);
    }

    fn create_texture(&mut self) -> Result<TextureId, ResourceError> {
        let id = TextureId(self.next_name());
        self.log.push(GlCall::CreateTexture(id));
        Ok(id)
    }

    fn set_texture_filters(&mut self, min_filter: FilterMode, mag_filter: FilterMode) {
        self.log.push(GlCall::SetTextureFilters {
            min_filter,
            mag_filter,
        });
    }

    fn allocate_texture_2d(&mut self, width: u32, height: u32, pixels: Option<&[u8]>) {
        self.log.push(GlCall::AllocateTexture2d {
            width,
            height,
            with_pixels: pixels.is_some(),
        });
    }

    fn delete_textures(&mut self, textures: &[TextureId]) {
        self.log.push(GlCall::DeleteTextures(textures.to_vec()));
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId, ResourceError> {
        let id = FramebufferId(self.next_name());
        self.log.push(GlCall::CreateFramebuffer(id));
        Ok(id)
    }

    fn attach_color_texture(&mut self, texture: TextureId) {
        self.log.push(GlCall::AttachColorTexture(texture));
    }

    fn framebuffer_status(&mut self) -> FramebufferStatus {
        self.log.push(GlCall::CheckFramebufferStatus);
        if self.incomplete_framebuffers {
            // GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT
            FramebufferStatus::Incomplete(0x8CD6)
        } else {
            FramebufferStatus::Complete
        }
    }

    fn delete_framebuffers(&mut self, framebuffers: &[FramebufferId]) {
        self.log.push(GlCall::DeleteFramebuffers(framebuffers.to_vec()));
    }
}
