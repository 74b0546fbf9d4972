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

use std::ops::{BitOr, BitOrAssign};

/// The storage and upload format of a cached uniform.
///
/// The format of a location is fixed by the first value set on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformFormat {
    /// `float`.
    Float1,
    /// `vec2`.
    Float2,
    /// `vec3`.
    Float3,
    /// `vec4`.
    Float4,
    /// `float[]`.
    Float1v,
    /// `vec2[]`.
    Float2v,
    /// `vec3[]`.
    Float3v,
    /// `vec4[]`.
    Float4v,
    /// `int`.
    Int1,
    /// `ivec2`.
    Int2,
    /// `ivec3`.
    Int3,
    /// `ivec4`.
    Int4,
    /// A sampler, stored as the texture unit index.
    Texture,
    /// `mat4`.
    Matrix,
    /// A rounded rectangle: bounds plus four corner radii, uploaded as `vec4[3]`.
    RoundedRect,
    /// A color, uploaded as `vec4`.
    Color,
}

impl UniformFormat {
    /// The size in bytes of one array element of this format.
    pub const fn element_size(self) -> usize {
        match self {
            UniformFormat::Float1
            | UniformFormat::Float1v
            | UniformFormat::Int1
            | UniformFormat::Texture => 4,
            UniformFormat::Float2 | UniformFormat::Float2v | UniformFormat::Int2 => 8,
            UniformFormat::Float3 | UniformFormat::Float3v | UniformFormat::Int3 => 12,
            UniformFormat::Float4
            | UniformFormat::Float4v
            | UniformFormat::Int4
            | UniformFormat::Color => 16,
            UniformFormat::RoundedRect => 48,
            UniformFormat::Matrix => 64,
        }
    }

    /// Returns `true` for the `*v` array formats.
    pub const fn is_array(self) -> bool {
        matches!(
            self,
            UniformFormat::Float1v
                | UniformFormat::Float2v
                | UniformFormat::Float3v
                | UniformFormat::Float4v
        )
    }
}

/// Per-uniform flags carried from the cache into a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UniformFlags {
    bits: u8,
}

impl UniformFlags {
    /// No flags.
    pub const NONE: Self = Self { bits: 0 };
    /// The corners of a rounded rectangle changed and must be uploaded.
    pub const SEND_CORNERS: Self = Self { bits: 1 << 0 };

    /// Returns `true` if every flag in `other` is also set in `self`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Clears the flags in `other`.
    pub fn remove(&mut self, other: Self) {
        self.bits &= !other.bits;
    }
}

impl BitOr for UniformFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

impl BitOrAssign for UniformFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}
