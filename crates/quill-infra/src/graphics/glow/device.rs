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

use super::conversions;
use glow::{HasContext, NativeUniformLocation, PixelUnpackData};
use quill_core::renderer::*;
use std::fmt;

/// A [`GlDevice`] issuing real OpenGL / OpenGL ES calls through `glow`.
///
/// The context must be current on the calling thread for the whole lifetime
/// of the device; every `unsafe` GL call below relies on it. Context creation
/// and buffer swapping belong to the windowing layer and are not handled here.
pub struct GlowDevice {
    gl: glow::Context,
    gles: bool,
    max_texture_size: u32,
}

impl GlowDevice {
    /// Wraps a current `glow` context and queries its limits.
    pub fn new(gl: glow::Context) -> Self {
        let gles = gl.version().is_embedded;
        let max_texture_size = unsafe { gl.get_parameter_i32(glow::MAX_TEXTURE_SIZE) }.max(0) as u32;
        log::info!(
            "GlowDevice: {} context, max texture size {}",
            if gles { "OpenGL ES" } else { "OpenGL" },
            max_texture_size
        );

        Self {
            gl,
            gles,
            max_texture_size,
        }
    }

    /// Returns the underlying `glow` context.
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    fn creation_failed(resource: &'static str, details: String) -> ResourceError {
        log::error!("GlowDevice: failed to create {resource}: {details}");
        ResourceError::CreationFailed { resource, details }
    }
}

impl fmt::Debug for GlowDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlowDevice")
            .field("gles", &self.gles)
            .field("max_texture_size", &self.max_texture_size)
            .finish_non_exhaustive()
    }
}

fn location(location: UniformLocation) -> NativeUniformLocation {
    NativeUniformLocation(location.0)
}

impl GlDevice for GlowDevice {
    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    fn is_gles(&self) -> bool {
        self.gles
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let program = conversions::program(program)?;
        unsafe { self.gl.get_uniform_location(program, name) }.map(|loc| UniformLocation(loc.0))
    }

    fn use_program(&mut self, program: ProgramId) {
        unsafe { self.gl.use_program(conversions::program(program)) }
    }

    fn delete_program(&mut self, program: ProgramId) {
        if let Some(program) = conversions::program(program) {
            unsafe { self.gl.delete_program(program) }
        }
    }

    fn enable_depth_test(&mut self) {
        unsafe {
            self.gl.enable(glow::DEPTH_TEST);
            self.gl.depth_func(glow::LEQUAL);
        }
    }

    fn enable_premultiplied_blending(&mut self) {
        unsafe {
            self.gl.enable(glow::BLEND);
            self.gl.blend_func(glow::ONE, glow::ONE_MINUS_SRC_ALPHA);
            self.gl.blend_equation(glow::FUNC_ADD);
        }
    }

    fn viewport(&mut self, rect: PixelRect) {
        unsafe { self.gl.viewport(rect.x, rect.y, rect.width, rect.height) }
    }

    fn scissor(&mut self, rect: Option<PixelRect>) {
        unsafe {
            match rect {
                Some(rect) => {
                    self.gl.enable(glow::SCISSOR_TEST);
                    self.gl.scissor(rect.x, rect.y, rect.width, rect.height);
                }
                None => self.gl.disable(glow::SCISSOR_TEST),
            }
        }
    }

    fn bind_framebuffer(&mut self, framebuffer: FramebufferId) {
        unsafe {
            self.gl
                .bind_framebuffer(glow::FRAMEBUFFER, conversions::framebuffer(framebuffer))
        }
    }

    fn bind_texture(&mut self, slot: TextureSlot, target: TextureTarget, texture: TextureId) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + slot.index() as u32);
            self.gl.bind_texture(
                conversions::texture_target(target),
                conversions::texture(texture),
            );
        }
    }

    fn create_vertex_array(&mut self) -> Result<VertexArrayId, ResourceError> {
        unsafe { self.gl.create_vertex_array() }
            .map(|vao| VertexArrayId(vao.0.get()))
            .map_err(|e| Self::creation_failed("vertex array", e))
    }

    fn bind_vertex_array(&mut self, vao: Option<VertexArrayId>) {
        unsafe {
            self.gl
                .bind_vertex_array(vao.and_then(conversions::vertex_array))
        }
    }

    fn delete_vertex_array(&mut self, vao: VertexArrayId) {
        if let Some(vao) = conversions::vertex_array(vao) {
            unsafe { self.gl.delete_vertex_array(vao) }
        }
    }

    fn create_buffer(&mut self) -> Result<BufferId, ResourceError> {
        unsafe { self.gl.create_buffer() }
            .map(|buffer| BufferId(buffer.0.get()))
            .map_err(|e| Self::creation_failed("buffer", e))
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(buffer) = conversions::buffer(buffer) {
            unsafe { self.gl.delete_buffer(buffer) }
        }
    }

    fn bind_array_buffer(&mut self, buffer: Option<BufferId>) {
        unsafe {
            self.gl
                .bind_buffer(glow::ARRAY_BUFFER, buffer.and_then(conversions::buffer))
        }
    }

    fn allocate_array_buffer(&mut self, size: usize) {
        unsafe {
            self.gl
                .buffer_data_size(glow::ARRAY_BUFFER, size as i32, glow::STREAM_DRAW)
        }
    }

    fn write_array_buffer(&mut self, offset: usize, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_sub_data_u8_slice(glow::ARRAY_BUFFER, offset as i32, data)
        }
    }

    fn vertex_attribute(&mut self, location: u32, components: u32, stride: usize, offset: usize) {
        unsafe {
            self.gl.enable_vertex_attrib_array(location);
            self.gl.vertex_attrib_pointer_f32(
                location,
                components as i32,
                glow::FLOAT,
                false,
                stride as i32,
                offset as i32,
            );
        }
    }

    fn uniform_1f(&mut self, loc: UniformLocation, x: f32) {
        unsafe { self.gl.uniform_1_f32(Some(&location(loc)), x) }
    }

    fn uniform_2f(&mut self, loc: UniformLocation, x: f32, y: f32) {
        unsafe { self.gl.uniform_2_f32(Some(&location(loc)), x, y) }
    }

    fn uniform_3f(&mut self, loc: UniformLocation, x: f32, y: f32, z: f32) {
        unsafe { self.gl.uniform_3_f32(Some(&location(loc)), x, y, z) }
    }

    fn uniform_4f(&mut self, loc: UniformLocation, x: f32, y: f32, z: f32, w: f32) {
        unsafe { self.gl.uniform_4_f32(Some(&location(loc)), x, y, z, w) }
    }

    fn uniform_1fv(&mut self, loc: UniformLocation, values: &[f32]) {
        unsafe { self.gl.uniform_1_f32_slice(Some(&location(loc)), values) }
    }

    fn uniform_2fv(&mut self, loc: UniformLocation, values: &[f32]) {
        unsafe { self.gl.uniform_2_f32_slice(Some(&location(loc)), values) }
    }

    fn uniform_3fv(&mut self, loc: UniformLocation, values: &[f32]) {
        unsafe { self.gl.uniform_3_f32_slice(Some(&location(loc)), values) }
    }

    fn uniform_4fv(&mut self, loc: UniformLocation, values: &[f32]) {
        unsafe { self.gl.uniform_4_f32_slice(Some(&location(loc)), values) }
    }

    fn uniform_1i(&mut self, loc: UniformLocation, x: i32) {
        unsafe { self.gl.uniform_1_i32(Some(&location(loc)), x) }
    }

    fn uniform_2i(&mut self, loc: UniformLocation, x: i32, y: i32) {
        unsafe { self.gl.uniform_2_i32(Some(&location(loc)), x, y) }
    }

    fn uniform_3i(&mut self, loc: UniformLocation, x: i32, y: i32, z: i32) {
        unsafe { self.gl.uniform_3_i32(Some(&location(loc)), x, y, z) }
    }

    fn uniform_4i(&mut self, loc: UniformLocation, x: i32, y: i32, z: i32, w: i32) {
        unsafe { self.gl.uniform_4_i32(Some(&location(loc)), x, y, z, w) }
    }

    fn uniform_matrix_4fv(&mut self, loc: UniformLocation, values: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(&location(loc)), false, values)
        }
    }

    fn clear(&mut self, flags: ClearFlags) {
        unsafe { self.gl.clear(conversions::clear_mask(flags)) }
    }

    fn draw_arrays(&mut self, first: u32, count: u32) {
        unsafe {
            self.gl
                .draw_arrays(glow::TRIANGLES, first as i32, count as i32)
        }
    }

    fn push_debug_group(&mut self, label: &str) {
        unsafe {
            self.gl
                .push_debug_group(glow::DEBUG_SOURCE_APPLICATION, 0, label)
        }
    }

    fn pop_debug_group(&mut self) {
        unsafe { self.gl.pop_debug_group() }
    }

    fn create_texture(&mut self) -> Result<TextureId, ResourceError> {
        unsafe { self.gl.create_texture() }
            .map(|texture| TextureId(texture.0.get()))
            .map_err(|e| Self::creation_failed("texture", e))
    }

    fn set_texture_filters(&mut self, min_filter: FilterMode, mag_filter: FilterMode) {
        unsafe {
            let target = glow::TEXTURE_2D;
            self.gl.tex_parameter_i32(
                target,
                glow::TEXTURE_MIN_FILTER,
                conversions::filter(min_filter),
            );
            self.gl.tex_parameter_i32(
                target,
                glow::TEXTURE_MAG_FILTER,
                conversions::filter(mag_filter),
            );
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
            self.gl
                .tex_parameter_i32(target, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
        }
    }

    fn allocate_texture_2d(&mut self, width: u32, height: u32, pixels: Option<&[u8]>) {
        let (format, ty) = if self.gles {
            (glow::RGBA, glow::UNSIGNED_BYTE)
        } else {
            (glow::BGRA, glow::UNSIGNED_INT_8_8_8_8_REV)
        };
        unsafe {
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width as i32,
                height as i32,
                0,
                format,
                ty,
                PixelUnpackData::Slice(pixels),
            );
        }
    }

    fn delete_textures(&mut self, textures: &[TextureId]) {
        for texture in textures.iter().copied().filter_map(conversions::texture) {
            unsafe { self.gl.delete_texture(texture) }
        }
    }

    fn create_framebuffer(&mut self) -> Result<FramebufferId, ResourceError> {
        unsafe { self.gl.create_framebuffer() }
            .map(|fbo| FramebufferId(fbo.0.get()))
            .map_err(|e| Self::creation_failed("framebuffer", e))
    }

    fn attach_color_texture(&mut self, texture: TextureId) {
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                conversions::texture(texture),
                0,
            );
        }
    }

    fn framebuffer_status(&mut self) -> FramebufferStatus {
        match unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) } {
            glow::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
            status => FramebufferStatus::Incomplete(status),
        }
    }

    fn delete_framebuffers(&mut self, framebuffers: &[FramebufferId]) {
        for fbo in framebuffers.iter().copied().filter_map(conversions::framebuffer) {
            unsafe { self.gl.delete_framebuffer(fbo) }
        }
    }
}
