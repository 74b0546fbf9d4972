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

//! GPU resources created through the queue.
//!
//! Creating a texture or framebuffer binds it on the real context. Each of
//! these operations therefore runs inside a saved attachment scope, so the
//! bindings the recording side relies on are restored afterwards.

use super::CommandQueue;
use quill_core::renderer::{
    FilterMode, FramebufferId, FramebufferStatus, ProgramId, ResourceError, TextureId,
    TextureSlot, TextureTarget, UniformLocation,
};

impl CommandQueue {
    /// Creates an uninitialised RGBA8 texture.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::TextureTooLarge`] if a dimension exceeds
    /// [`max_texture_size`](Self::max_texture_size), and
    /// [`ResourceError::InvalidDimensions`] if one is zero.
    pub fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        min_filter: FilterMode,
        mag_filter: FilterMode,
    ) -> Result<TextureId, ResourceError> {
        self.texture_with_data(width, height, min_filter, mag_filter, None)
    }

    /// Creates an RGBA8 texture filled with `pixels`.
    ///
    /// # Errors
    ///
    /// Same as [`create_texture`](Self::create_texture).
    pub fn upload_texture(
        &mut self,
        width: u32,
        height: u32,
        min_filter: FilterMode,
        mag_filter: FilterMode,
        pixels: &[u8],
    ) -> Result<TextureId, ResourceError> {
        self.texture_with_data(width, height, min_filter, mag_filter, Some(pixels))
    }

    fn texture_with_data(
        &mut self,
        width: u32,
        height: u32,
        min_filter: FilterMode,
        mag_filter: FilterMode,
        pixels: Option<&[u8]>,
    ) -> Result<TextureId, ResourceError> {
        if width > self.max_texture_size || height > self.max_texture_size {
            return Err(ResourceError::TextureTooLarge {
                width,
                height,
                max_size: self.max_texture_size,
            });
        }
        if width == 0 || height == 0 {
            return Err(ResourceError::InvalidDimensions { width, height });
        }

        self.with_saved_attachments(|queue| {
            let device = queue.device.as_mut();
            let texture = device.create_texture()?;
            device.bind_texture(TextureSlot::ZERO, TextureTarget::Texture2D, texture);
            device.set_texture_filters(min_filter, mag_filter);
            device.allocate_texture_2d(width, height, pixels);
            Ok(texture)
        })
    }

    /// Creates an empty framebuffer object.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::CreationFailed`] if the driver refuses.
    pub fn create_framebuffer(&mut self) -> Result<FramebufferId, ResourceError> {
        self.device.create_framebuffer()
    }

    /// Creates a framebuffer rendering into a fresh `width` x `height` texture.
    ///
    /// Returns the framebuffer and its color texture.
    ///
    /// # Errors
    ///
    /// Fails like [`create_texture`](Self::create_texture) and
    /// [`create_framebuffer`](Self::create_framebuffer).
    ///
    /// # Panics
    ///
    /// Panics if the driver reports the framebuffer incomplete.
    pub fn create_render_target(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<(FramebufferId, TextureId), ResourceError> {
        self.with_saved_attachments(|queue| {
            let texture =
                queue.create_texture(width, height, FilterMode::Nearest, FilterMode::Nearest)?;
            let device = queue.device.as_mut();
            let framebuffer = match device.create_framebuffer() {
                Ok(framebuffer) => framebuffer,
                Err(e) => {
                    device.delete_textures(&[texture]);
                    return Err(e);
                }
            };
            device.bind_framebuffer(framebuffer);
            device.attach_color_texture(texture);

            let status = device.framebuffer_status();
            assert_eq!(
                status,
                FramebufferStatus::Complete,
                "CommandQueue: render target {}x{} is not complete",
                width,
                height
            );
            log::trace!(
                "CommandQueue: created render target {}x{} (fbo {}, texture {})",
                width,
                height,
                framebuffer.0,
                texture.0
            );
            Ok((framebuffer, texture))
        })
    }

    /// Deletes `texture` at the end of the frame.
    ///
    /// # Panics
    ///
    /// Panics on [`TextureId::NONE`].
    pub fn autorelease_texture(&mut self, texture: TextureId) {
        assert_ne!(texture, TextureId::NONE, "CommandQueue: cannot autorelease texture 0");
        self.autorelease_textures.push(texture);
    }

    /// Deletes `framebuffer` at the end of the frame.
    ///
    /// # Panics
    ///
    /// Panics on the default framebuffer.
    pub fn autorelease_framebuffer(&mut self, framebuffer: FramebufferId) {
        assert_ne!(
            framebuffer,
            FramebufferId::DEFAULT,
            "CommandQueue: cannot autorelease the default framebuffer"
        );
        self.autorelease_framebuffers.push(framebuffer);
    }

    /// The number of resources waiting for the end of the frame.
    pub fn pending_autoreleases(&self) -> usize {
        self.autorelease_textures.len() + self.autorelease_framebuffers.len()
    }

    /// Deletes a program and forgets its cached uniforms.
    pub fn delete_program(&mut self, program: ProgramId) {
        self.device.delete_program(program);
        self.uniforms.clear_program(program);
    }

    /// Looks up a uniform of a linked program.
    pub fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        self.device.uniform_location(program, name)
    }

    /// Pushes a copy of the attachment state onto the save stack.
    pub fn save_attachments(&mut self) {
        self.saved_attachments.push(self.attachments.save());
    }

    /// Pops the last saved attachment state and rebinds it on the device.
    ///
    /// When the restore rolls a binding back, the open draw batch is closed
    /// first so the draws recorded under the scoped bindings keep them, and
    /// later draws pick up the restored ones.
    ///
    /// # Panics
    ///
    /// Panics without a matching [`save_attachments`](Self::save_attachments).
    pub fn restore_attachments(&mut self) {
        let Some(saved) = self.saved_attachments.pop() else {
            panic!("CommandQueue: restore_attachments without a matching save");
        };
        let rolls_back = !self.attachments.same_bindings(&saved);
        if rolls_back {
            self.split_before_state_change();
        }
        self.attachments.restore(saved, self.device.as_mut());
        if rolls_back {
            self.sync_open_batch();
        }
    }

    /// Runs `f` between a save and a restore of the attachment state.
    pub fn with_saved_attachments<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.save_attachments();
        let result = f(self);
        self.restore_attachments();
        result
    }
}
