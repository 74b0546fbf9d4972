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

//! The driver: frame calls, program registry and resource creation.

use crate::program::Program;
use crate::shared::SharedUniform;
use anyhow::{ensure, Context, Result};
use quill_command::{CommandQueue, FrameStats, QueueSettings};
use quill_core::renderer::{FilterMode, FramebufferId, GlDevice, ProgramId, TextureId};
use std::collections::HashMap;

/// Owns the command queue and every loaded program.
#[derive(Debug)]
pub struct Driver {
    queue: CommandQueue,
    programs: HashMap<ProgramId, Program>,
    in_frame: bool,
}

impl Driver {
    /// Creates a driver drawing through `device`.
    pub fn new(device: Box<dyn GlDevice>, settings: QueueSettings) -> Result<Self> {
        let queue = CommandQueue::new(device, settings).context("Failed to create the command queue")?;
        Ok(Self {
            queue,
            programs: HashMap::new(),
            in_frame: false,
        })
    }

    /// The command queue.
    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// The command queue, mutably.
    pub fn queue_mut(&mut self) -> &mut CommandQueue {
        &mut self.queue
    }

    // --- Frame ---

    /// Starts a frame.
    ///
    /// # Panics
    ///
    /// Panics if a frame is already in progress.
    pub fn begin_frame(&mut self) {
        assert!(!self.in_frame, "Driver: begin_frame while a frame is in progress");
        self.in_frame = true;
        self.queue.begin_frame();
    }

    /// Replays the recorded frame and returns its statistics.
    ///
    /// # Panics
    ///
    /// Panics outside of a frame.
    pub fn execute(&mut self) -> Result<FrameStats> {
        assert!(self.in_frame, "Driver: execute outside of a frame");
        self.queue.execute().context("Failed to execute the frame")?;
        Ok(self.queue.last_frame_stats())
    }

    /// Ends the frame and releases its transient resources.
    ///
    /// # Panics
    ///
    /// Panics outside of a frame.
    pub fn end_frame(&mut self) {
        assert!(self.in_frame, "Driver: end_frame outside of a frame");
        self.queue.end_frame();
        self.in_frame = false;
    }

    /// Returns `true` between `begin_frame` and `end_frame`.
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    // --- Programs ---

    /// Registers the linked program `id` under `name`.
    ///
    /// Every [`SharedUniform`] is resolved, followed by `extra_uniforms` as
    /// `(name, key)` pairs with keys starting at [`SharedUniform::COUNT`].
    /// The alpha uniform starts at 1.0.
    pub fn load_program(
        &mut self,
        name: &str,
        id: ProgramId,
        extra_uniforms: &[(&str, u32)],
    ) -> Result<ProgramId> {
        ensure!(!id.is_none(), "Cannot load program 0 as '{}'", name);
        ensure!(
            !self.programs.contains_key(&id),
            "Program {} is already loaded",
            id.0
        );
        for &(uniform, key) in extra_uniforms {
            ensure!(
                key >= SharedUniform::COUNT,
                "Uniform '{}' of '{}' uses key {}, which is reserved for shared uniforms",
                uniform,
                name,
                key
            );
        }

        let mut program = Program::new(id, name);
        let device = self.queue.device_mut();
        for shared in SharedUniform::ALL {
            program.add_uniform(device, shared.name(), shared.key());
        }
        for &(uniform, key) in extra_uniforms {
            program.add_uniform(device, uniform, key);
        }
        program.set_uniform1f(&mut self.queue, SharedUniform::Alpha.key(), 1.0);

        log::info!("Driver: loaded program '{}' ({})", name, id.0);
        self.programs.insert(id, program);
        Ok(id)
    }

    /// A loaded program.
    pub fn program(&self, id: ProgramId) -> Option<&Program> {
        self.programs.get(&id)
    }

    /// Runs `f` with a loaded program and the queue.
    ///
    /// Returns `None` if `id` is not loaded.
    pub fn with_program<R>(
        &mut self,
        id: ProgramId,
        f: impl FnOnce(&Program, &mut CommandQueue) -> R,
    ) -> Option<R> {
        let program = self.programs.get(&id)?;
        Some(f(program, &mut self.queue))
    }

    /// Deletes a program on the GPU and drops its cached uniforms.
    ///
    /// Returns `false` if `id` was not loaded.
    pub fn delete_program(&mut self, id: ProgramId) -> bool {
        let Some(mut program) = self.programs.remove(&id) else {
            return false;
        };
        self.queue.delete_program(id);
        program.mark_deleted();
        log::debug!("Driver: deleted program '{}' ({})", program.name(), id.0);
        true
    }

    // --- Resources ---

    /// Creates an empty texture.
    pub fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        min_filter: FilterMode,
        mag_filter: FilterMode,
    ) -> Result<TextureId> {
        self.queue
            .create_texture(width, height, min_filter, mag_filter)
            .with_context(|| format!("Failed to create a {}x{} texture", width, height))
    }

    /// Creates a texture filled with RGBA8 `pixels`.
    pub fn upload_texture(
        &mut self,
        width: u32,
        height: u32,
        min_filter: FilterMode,
        mag_filter: FilterMode,
        pixels: &[u8],
    ) -> Result<TextureId> {
        ensure!(
            pixels.len() == width as usize * height as usize * 4,
            "Expected {} bytes of RGBA8 pixels for a {}x{} texture, got {}",
            width as usize * height as usize * 4,
            width,
            height,
            pixels.len()
        );
        self.queue
            .upload_texture(width, height, min_filter, mag_filter, pixels)
            .with_context(|| format!("Failed to upload a {}x{} texture", width, height))
    }

    /// Creates an empty framebuffer.
    pub fn create_framebuffer(&mut self) -> Result<FramebufferId> {
        self.queue
            .create_framebuffer()
            .context("Failed to create a framebuffer")
    }

    /// Creates a framebuffer with a `width` x `height` color texture.
    pub fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<(FramebufferId, TextureId)> {
        self.queue
            .create_render_target(width, height)
            .with_context(|| format!("Failed to create a {}x{} render target", width, height))
    }

    /// Deletes `texture` when the frame ends.
    pub fn autorelease_texture(&mut self, texture: TextureId) {
        self.queue.autorelease_texture(texture);
    }

    /// Deletes `framebuffer` when the frame ends.
    pub fn autorelease_framebuffer(&mut self, framebuffer: FramebufferId) {
        self.queue.autorelease_framebuffer(framebuffer);
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        for (id, mut program) in self.programs.drain() {
            self.queue.delete_program(id);
            program.mark_deleted();
        }
    }
}
