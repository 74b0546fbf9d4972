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

//! Conversions between quill's renderer types and `glow` handles and enums.

use glow::{NativeBuffer, NativeFramebuffer, NativeProgram, NativeTexture, NativeVertexArray};
use quill_core::renderer::{
    BufferId, ClearFlags, FilterMode, FramebufferId, ProgramId, TextureId, TextureTarget,
    VertexArrayId,
};
use std::num::NonZeroU32;

pub(super) fn program(id: ProgramId) -> Option<NativeProgram> {
    NonZeroU32::new(id.0).map(NativeProgram)
}

pub(super) fn texture(id: TextureId) -> Option<NativeTexture> {
    NonZeroU32::new(id.0).map(NativeTexture)
}

pub(super) fn framebuffer(id: FramebufferId) -> Option<NativeFramebuffer> {
    NonZeroU32::new(id.0).map(NativeFramebuffer)
}

pub(super) fn buffer(id: BufferId) -> Option<NativeBuffer> {
    NonZeroU32::new(id.0).map(NativeBuffer)
}

pub(super) fn vertex_array(id: VertexArrayId) -> Option<NativeVertexArray> {
    NonZeroU32::new(id.0).map(NativeVertexArray)
}

pub(super) fn texture_target(target: TextureTarget) -> u32 {
    match target {
        TextureTarget::Texture1D => glow::TEXTURE_1D,
        TextureTarget::Texture2D => glow::TEXTURE_2D,
        TextureTarget::Texture3D => glow::TEXTURE_3D,
    }
}

pub(super) fn filter(mode: FilterMode) -> i32 {
    match mode {
        FilterMode::Nearest => glow::NEAREST as i32,
        FilterMode::Linear => glow::LINEAR as i32,
    }
}

pub(super) fn clear_mask(flags: ClearFlags) -> u32 {
    let mut mask = 0;
    if flags.contains(ClearFlags::COLOR) {
        mask |= glow::COLOR_BUFFER_BIT;
    }
    if flags.contains(ClearFlags::DEPTH) {
        mask |= glow::DEPTH_BUFFER_BIT;
    }
    if flags.contains(ClearFlags::STENCIL) {
        mask |= glow::STENCIL_BUFFER_BIT;
    }
    mask
}
