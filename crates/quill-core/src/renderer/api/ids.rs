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

//! Opaque handles to GPU objects.
//!
//! Every id wraps the raw GL object name. Zero is the GL "no object" name:
//! the default framebuffer, no program, no texture.

/// A handle to a linked GPU program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ProgramId(pub u32);

impl ProgramId {
    /// No program bound.
    pub const NONE: Self = Self(0);

    /// Returns `true` if this is the "no program" id.
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// The id as a table index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A handle to a GPU texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureId(pub u32);

impl TextureId {
    /// No texture bound.
    pub const NONE: Self = Self(0);
}

/// A handle to a GPU framebuffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FramebufferId(pub u32);

impl FramebufferId {
    /// The window-system provided framebuffer.
    pub const DEFAULT: Self = Self(0);
}

/// A handle to a GPU buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// A handle to a vertex array object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

/// The location of a uniform inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UniformLocation(pub u32);

impl UniformLocation {
    /// The location as a table index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
