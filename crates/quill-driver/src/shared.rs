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

//! Uniforms every program may declare.

/// The uniform keys shared by all programs.
///
/// Program-specific keys start at [`SharedUniform::COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharedUniform {
    /// Global opacity, `u_alpha`.
    Alpha,
    /// The source texture sampler, `u_source`.
    Source,
    /// The clip rounded rectangle, `u_clip_rect`.
    ClipRect,
    /// The viewport rectangle, `u_viewport`.
    Viewport,
    /// The projection matrix, `u_projection`.
    Projection,
    /// The modelview matrix, `u_modelview`.
    Modelview,
}

impl SharedUniform {
    /// The number of shared keys.
    pub const COUNT: u32 = 6;

    /// Every shared uniform, in key order.
    pub const ALL: [SharedUniform; Self::COUNT as usize] = [
        SharedUniform::Alpha,
        SharedUniform::Source,
        SharedUniform::ClipRect,
        SharedUniform::Viewport,
        SharedUniform::Projection,
        SharedUniform::Modelview,
    ];

    /// The key this uniform occupies in every program.
    pub const fn key(self) -> u32 {
        self as u32
    }

    /// The GLSL name of the uniform.
    pub const fn name(self) -> &'static str {
        match self {
            SharedUniform::Alpha => "u_alpha",
            SharedUniform::Source => "u_source",
            SharedUniform::ClipRect => "u_clip_rect",
            SharedUniform::Viewport => "u_viewport",
            SharedUniform::Projection => "u_projection",
            SharedUniform::Modelview => "u_modelview",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_follow_declaration_order() {
        for (index, uniform) in SharedUniform::ALL.iter().enumerate() {
            assert_eq!(uniform.key(), index as u32);
        }
        assert_eq!(SharedUniform::Viewport.name(), "u_viewport");
    }
}
