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

//! Texture binding points, sampler filters and framebuffer status.

/// The number of texture units the attachment cache tracks.
pub const MAX_TEXTURE_SLOTS: usize = 16;

/// The binding target of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureTarget {
    /// `GL_TEXTURE_1D`.
    Texture1D,
    /// `GL_TEXTURE_2D`.
    #[default]
    Texture2D,
    /// `GL_TEXTURE_3D`.
    Texture3D,
}

/// A texture unit, `GL_TEXTURE0 + index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TextureSlot(u8);

impl TextureSlot {
    /// The first texture unit.
    pub const ZERO: Self = Self(0);

    /// Creates a slot for texture unit `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`MAX_TEXTURE_SLOTS`].
    pub const fn new(index: u8) -> Self {
        assert!(
            (index as usize) < MAX_TEXTURE_SLOTS,
            "texture slot out of range"
        );
        Self(index)
    }

    /// The unit index, i.e. the slot minus `GL_TEXTURE0`.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Iterates over every tracked slot in order.
    pub fn all() -> impl Iterator<Item = TextureSlot> {
        (0..MAX_TEXTURE_SLOTS as u8).map(TextureSlot)
    }
}

/// A texture sampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// `GL_NEAREST`.
    Nearest,
    /// `GL_LINEAR`.
    #[default]
    Linear,
}

/// The result of a framebuffer completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    /// The framebuffer can be rendered to.
    Complete,
    /// The framebuffer is incomplete; carries the raw GL status code.
    Incomplete(u32),
}
