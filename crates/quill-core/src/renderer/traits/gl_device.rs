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

use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// The immediate-mode GL surface the renderer core drives.
///
/// Every method maps to one or a handful of real GL calls issued right away.
/// There is no caching at this level: deduplication is the job of the
/// command queue sitting on top. A device is used from a single thread with
/// its context current, so methods take `&mut self`.
pub trait GlDevice: Debug {
    /// Returns the largest texture edge length the context supports (`GL_MAX_TEXTURE_SIZE`).
    fn max_texture_size(&self) -> u32;

    /// Returns `true` when the context is OpenGL ES rather than desktop GL.
    fn is_gles(&self) -> bool;

    /// Looks up the location of a named uniform in a linked program.
    /// ## Arguments
    /// * `program` - The linked program to query.
    /// * `name` - The uniform's name in the shader source.
    /// ## Returns
    /// `None` if the program has no active uniform of that name.
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;

    /// Makes `program` current. `ProgramId::NONE` unbinds.
    fn use_program(&mut self, program: ProgramId);

    /// Deletes a linked program.
    fn delete_program(&mut self, program: ProgramId);

    /// Enables depth testing with the `LEQUAL` comparison.
    fn enable_depth_test(&mut self);

    /// Enables premultiplied-alpha blending: `ONE, ONE_MINUS_SRC_ALPHA` with `FUNC_ADD`.
    fn enable_premultiplied_blending(&mut self);

    /// Sets the viewport transform.
    fn viewport(&mut self, rect: PixelRect);

    /// Enables the scissor test with `rect`, or disables it when `None`.
    fn scissor(&mut self, rect: Option<PixelRect>);

    /// Binds `framebuffer` as both draw and read target.
    fn bind_framebuffer(&mut self, framebuffer: FramebufferId);

    /// Activates texture unit `slot` and binds `texture` to `target` on it.
    fn bind_texture(&mut self, slot: TextureSlot, target: TextureTarget, texture: TextureId);

    // --- Vertex input ---

    /// Creates a vertex array object.
    /// ## Errors
    /// * `ResourceError::CreationFailed` - If the driver cannot allocate a name.
    fn create_vertex_array(&mut self) -> Result<VertexArrayId, ResourceError>;

    /// Binds a vertex array object, or unbinds when `None`.
    fn bind_vertex_array(&mut self, vao: Option<VertexArrayId>);

    /// Deletes a vertex array object.
    fn delete_vertex_array(&mut self, vao: VertexArrayId);

    /// Creates a buffer object.
    /// ## Errors
    /// * `ResourceError::CreationFailed` - If the driver cannot allocate a name.
    fn create_buffer(&mut self) -> Result<BufferId, ResourceError>;

    /// Deletes a buffer object.
    fn delete_buffer(&mut self, buffer: BufferId);

    /// Binds `buffer` to `GL_ARRAY_BUFFER`, or unbinds when `None`.
    fn bind_array_buffer(&mut self, buffer: Option<BufferId>);

    /// (Re)allocates the storage of the bound array buffer as `STREAM_DRAW` without initial data.
    fn allocate_array_buffer(&mut self, size: usize);

    /// Writes `data` into the bound array buffer at byte `offset`.
    fn write_array_buffer(&mut self, offset: usize, data: &[u8]);

    /// Declares a float vertex attribute sourced from the bound array buffer and enables it.
    /// ## Arguments
    /// * `location` - The attribute index.
    /// * `components` - Number of `f32` components (1 to 4).
    /// * `stride` - Byte distance between consecutive vertices.
    /// * `offset` - Byte offset of the attribute inside a vertex.
    fn vertex_attribute(&mut self, location: u32, components: u32, stride: usize, offset: usize);

    // --- Uniform uploads, applied to the current program ---

    /// `glUniform1f`.
    fn uniform_1f(&mut self, location: UniformLocation, x: f32);
    /// `glUniform2f`.
    fn uniform_2f(&mut self, location: UniformLocation, x: f32, y: f32);
    /// `glUniform3f`.
    fn uniform_3f(&mut self, location: UniformLocation, x: f32, y: f32, z: f32);
    /// `glUniform4f`.
    fn uniform_4f(&mut self, location: UniformLocation, x: f32, y: f32, z: f32, w: f32);
    /// `glUniform1fv`; `values.len()` is the array length.
    fn uniform_1fv(&mut self, location: UniformLocation, values: &[f32]);
    /// `glUniform2fv`; `values` holds `2 * count` floats.
    fn uniform_2fv(&mut self, location: UniformLocation, values: &[f32]);
    /// `glUniform3fv`; `values` holds `3 * count` floats.
    fn uniform_3fv(&mut self, location: UniformLocation, values: &[f32]);
    /// `glUniform4fv`; `values` holds `4 * count` floats.
    fn uniform_4fv(&mut self, location: UniformLocation, values: &[f32]);
    /// `glUniform1i`.
    fn uniform_1i(&mut self, location: UniformLocation, x: i32);
    /// `glUniform2i`.
    fn uniform_2i(&mut self, location: UniformLocation, x: i32, y: i32);
    /// `glUniform3i`.
    fn uniform_3i(&mut self, location: UniformLocation, x: i32, y: i32, z: i32);
    /// `glUniform4i`.
    fn uniform_4i(&mut self, location: UniformLocation, x: i32, y: i32, z: i32, w: i32);
    /// `glUniformMatrix4fv` with a single, non-transposed, column-major matrix.
    fn uniform_matrix_4fv(&mut self, location: UniformLocation, values: &[f32; 16]);

    // --- Drawing ---

    /// Clears the selected buffers of the bound framebuffer.
    fn clear(&mut self, flags: ClearFlags);

    /// Draws `count` vertices as triangles, starting at vertex `first` of the bound array buffer.
    fn draw_arrays(&mut self, first: u32, count: u32);

    /// Opens a named debug group (`glPushDebugGroup`).
    fn push_debug_group(&mut self, label: &str);

    /// Closes the innermost debug group.
    fn pop_debug_group(&mut self);

    // --- Textures and framebuffers ---

    /// Creates a texture object.
    /// ## Errors
    /// * `ResourceError::CreationFailed` - If the driver cannot allocate a name.
    fn create_texture(&mut self) -> Result<TextureId, ResourceError>;

    /// Sets the filters and `CLAMP_TO_EDGE` wrapping of the texture bound to `TEXTURE_2D`.
    fn set_texture_filters(&mut self, min_filter: FilterMode, mag_filter: FilterMode);

    /// Allocates RGBA8 storage for the texture bound to `TEXTURE_2D`.
    /// ## Arguments
    /// * `width`, `height` - The texture size in pixels.
    /// * `pixels` - Optional initial contents, `width * height * 4` bytes. The
    ///   byte order is BGRA on desktop GL and RGBA on GLES.
    fn allocate_texture_2d(&mut self, width: u32, height: u32, pixels: Option<&[u8]>);

    /// Deletes texture objects.
    fn delete_textures(&mut self, textures: &[TextureId]);

    /// Creates a framebuffer object.
    /// ## Errors
    /// * `ResourceError::CreationFailed` - If the driver cannot allocate a name.
    fn create_framebuffer(&mut self) -> Result<FramebufferId, ResourceError>;

    /// Attaches `texture` as `COLOR_ATTACHMENT0` of the bound framebuffer.
    fn attach_color_texture(&mut self, texture: TextureId);

    /// Checks the completeness of the bound framebuffer.
    fn framebuffer_status(&mut self) -> FramebufferStatus;

    /// Deletes framebuffer objects.
    fn delete_framebuffers(&mut self, framebuffers: &[FramebufferId]);
}
