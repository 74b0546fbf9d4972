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

//! A linked GPU program and its uniform table.

use crate::shared::SharedUniform;
use quill_command::uniform::MAX_UNIFORM_LOCATIONS;
use quill_command::CommandQueue;
use quill_core::math::{Mat4, Rect, Rgba, RoundedRect};
use quill_core::renderer::{
    GlDevice, PixelRect, ProgramId, TextureId, TextureSlot, TextureTarget, UniformLocation,
};

/// A linked program together with the locations of the uniforms it uses.
///
/// Uniforms are addressed by small integer keys, resolved once at load time.
/// A key the shader does not use resolves to no location, and every setter
/// silently skips it.
#[derive(Debug)]
pub struct Program {
    id: ProgramId,
    name: String,
    locations: Vec<Option<UniformLocation>>,
    deleted: bool,
}

impl Program {
    /// Wraps an already linked program.
    pub fn new(id: ProgramId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            locations: Vec::new(),
            deleted: false,
        }
    }

    /// The GPU program id.
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// The debug name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolves `name` and stores its location under `key`.
    ///
    /// Returns `false` if the program has no active uniform called `name`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not below the uniform location limit.
    pub fn add_uniform(&mut self, device: &mut dyn GlDevice, name: &str, key: u32) -> bool {
        let index = key as usize;
        assert!(
            index < MAX_UNIFORM_LOCATIONS,
            "Program: uniform key {} out of range",
            key
        );
        if self.locations.len() <= index {
            self.locations.resize(index + 1, None);
        }

        let location = device.uniform_location(self.id, name);
        self.locations[index] = location;
        if location.is_none() {
            log::trace!("Program: '{}' has no active uniform '{}'", self.name, name);
        }
        location.is_some()
    }

    /// The location stored under `key`, if any.
    pub fn location(&self, key: u32) -> Option<UniformLocation> {
        self.locations.get(key as usize).copied().flatten()
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    /// Uploads the viewport uniform, applies the viewport and makes this
    /// program current.
    pub fn begin_draw(&self, queue: &mut CommandQueue, viewport: &Rect) {
        let [x, y, width, height] = viewport.to_array();
        self.set_uniform4f(queue, SharedUniform::Viewport.key(), x, y, width, height);
        queue.set_viewport(Some(PixelRect::new(
            x.round() as i32,
            y.round() as i32,
            width.round() as i32,
            height.round() as i32,
        )));
        queue.use_program(self.id);
    }

    /// Sets a `float` uniform by key.
    pub fn set_uniform1f(&self, queue: &mut CommandQueue, key: u32, v0: f32) {
        if let Some(location) = self.location(key) {
            queue.set_uniform1f(self.id, location, v0);
        }
    }

    /// Sets a `vec2` uniform by key.
    pub fn set_uniform2f(&self, queue: &mut CommandQueue, key: u32, v0: f32, v1: f32) {
        if let Some(location) = self.location(key) {
            queue.set_uniform2f(self.id, location, v0, v1);
        }
    }

    /// Sets a `vec3` uniform by key.
    pub fn set_uniform3f(&self, queue: &mut CommandQueue, key: u32, v0: f32, v1: f32, v2: f32) {
        if let Some(location) = self.location(key) {
            queue.set_uniform3f(self.id, location, v0, v1, v2);
        }
    }

    /// Sets a `vec4` uniform by key.
    pub fn set_uniform4f(
        &self,
        queue: &mut CommandQueue,
        key: u32,
        v0: f32,
        v1: f32,
        v2: f32,
        v3: f32,
    ) {
        if let Some(location) = self.location(key) {
            queue.set_uniform4f(self.id, location, v0, v1, v2, v3);
        }
    }

    /// Sets a `float[]` uniform by key.
    pub fn set_uniform1fv(&self, queue: &mut CommandQueue, key: u32, values: &[f32]) {
        if let Some(location) = self.location(key) {
            queue.set_uniform1fv(self.id, location, values);
        }
    }

    /// Sets a `vec2[]` uniform by key.
    pub fn set_uniform2fv(&self, queue: &mut CommandQueue, key: u32, values: &[[f32; 2]]) {
        if let Some(location) = self.location(key) {
            queue.set_uniform2fv(self.id, location, values);
        }
    }

    /// Sets a `vec3[]` uniform by key.
    pub fn set_uniform3fv(&self, queue: &mut CommandQueue, key: u32, values: &[[f32; 3]]) {
        if let Some(location) = self.location(key) {
            queue.set_uniform3fv(self.id, location, values);
        }
    }

    /// Sets a `vec4[]` uniform by key.
    pub fn set_uniform4fv(&self, queue: &mut CommandQueue, key: u32, values: &[[f32; 4]]) {
        if let Some(location) = self.location(key) {
            queue.set_uniform4fv(self.id, location, values);
        }
    }

    /// Sets an `int` uniform by key.
    pub fn set_uniform1i(&self, queue: &mut CommandQueue, key: u32, v0: i32) {
        if let Some(location) = self.location(key) {
            queue.set_uniform1i(self.id, location, v0);
        }
    }

    /// Sets an `ivec2` uniform by key.
    pub fn set_uniform2i(&self, queue: &mut CommandQueue, key: u32, v0: i32, v1: i32) {
        if let Some(location) = self.location(key) {
            queue.set_uniform2i(self.id, location, v0, v1);
        }
    }

    /// Sets an `ivec3` uniform by key.
    pub fn set_uniform3i(&self, queue: &mut CommandQueue, key: u32, v0: i32, v1: i32, v2: i32) {
        if let Some(location) = self.location(key) {
            queue.set_uniform3i(self.id, location, v0, v1, v2);
        }
    }

    /// Sets an `ivec4` uniform by key.
    pub fn set_uniform4i(
        &self,
        queue: &mut CommandQueue,
        key: u32,
        v0: i32,
        v1: i32,
        v2: i32,
        v3: i32,
    ) {
        if let Some(location) = self.location(key) {
            queue.set_uniform4i(self.id, location, v0, v1, v2, v3);
        }
    }

    /// Sets a `mat4` uniform by key.
    pub fn set_uniform_matrix(&self, queue: &mut CommandQueue, key: u32, matrix: &Mat4) {
        if let Some(location) = self.location(key) {
            queue.set_uniform_matrix(self.id, location, matrix);
        }
    }

    /// Sets a rounded-rectangle uniform by key.
    pub fn set_uniform_rounded_rect(
        &self,
        queue: &mut CommandQueue,
        key: u32,
        rounded_rect: &RoundedRect,
    ) {
        if let Some(location) = self.location(key) {
            queue.set_uniform_rounded_rect(self.id, location, rounded_rect);
        }
    }

    /// Sets a color uniform by key; `None` is transparent.
    pub fn set_uniform_color(&self, queue: &mut CommandQueue, key: u32, color: Option<&Rgba>) {
        if let Some(location) = self.location(key) {
            queue.set_uniform_color(self.id, location, color);
        }
    }

    /// Binds `texture` on `slot` and points the sampler under `key` at it.
    ///
    /// The texture is bound even when the program does not use the sampler.
    pub fn set_uniform_texture(
        &self,
        queue: &mut CommandQueue,
        key: u32,
        target: TextureTarget,
        slot: TextureSlot,
        texture: TextureId,
    ) {
        match self.location(key) {
            Some(location) => queue.set_uniform_texture(self.id, location, target, slot, texture),
            None => queue.bind_texture(target, slot, texture),
        }
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        if !self.deleted {
            log::warn!(
                "Program: '{}' ({}) dropped without being deleted, leaking it",
                self.name,
                self.id.0
            );
        }
    }
}
