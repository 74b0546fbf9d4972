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

//! The texture and framebuffer binding cache.
//!
//! Binding calls made while recording a frame are not issued to the GPU.
//! They update this cache, which detects no-op rebinds and marks real changes
//! dirty until a batch captures them as [`BindOp`]s for replay.

use quill_core::renderer::{
    FramebufferId, GlDevice, TextureId, TextureSlot, TextureTarget, MAX_TEXTURE_SLOTS,
};

/// The cached binding of one texture unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    /// The target the texture is bound to.
    pub target: TextureTarget,
    /// The bound texture.
    pub texture: TextureId,
    /// Set when the binding changed and no batch has captured it yet.
    pub changed: bool,
    /// Set until the slot is bound for the first time this frame.
    pub initial: bool,
}

impl Default for TextureBinding {
    fn default() -> Self {
        Self {
            target: TextureTarget::Texture2D,
            texture: TextureId::NONE,
            changed: false,
            initial: true,
        }
    }
}

/// The cached framebuffer binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FramebufferBinding {
    /// The bound framebuffer.
    pub id: FramebufferId,
    /// Set when the binding changed and has not been consumed yet.
    pub changed: bool,
}

/// A texture bind recorded into a batch and issued at replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindOp {
    /// The texture unit.
    pub slot: TextureSlot,
    /// The binding target.
    pub target: TextureTarget,
    /// The texture to bind.
    pub texture: TextureId,
}

/// The current framebuffer and per-unit texture bindings of a command queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentState {
    framebuffer: FramebufferBinding,
    textures: [TextureBinding; MAX_TEXTURE_SLOTS],
    has_texture_change: bool,
}

impl AttachmentState {
    /// Creates a cache matching a freshly reset context: default framebuffer, nothing bound.
    pub fn new() -> Self {
        Self {
            framebuffer: FramebufferBinding::default(),
            textures: [TextureBinding::default(); MAX_TEXTURE_SLOTS],
            has_texture_change: false,
        }
    }

    /// Records a texture bind.
    ///
    /// # Returns
    ///
    /// `false` if `texture` was already bound to `target` on `slot`; the cache
    /// is then left untouched.
    pub fn bind_texture(
        &mut self,
        target: TextureTarget,
        slot: TextureSlot,
        texture: TextureId,
    ) -> bool {
        if self.is_texture_bound(target, slot, texture) {
            return false;
        }

        let binding = &mut self.textures[slot.index()];
        binding.target = target;
        binding.texture = texture;
        binding.changed = true;
        binding.initial = false;
        self.has_texture_change = true;
        true
    }

    /// Returns `true` if `texture` is the current binding of `target` on `slot`.
    pub fn is_texture_bound(
        &self,
        target: TextureTarget,
        slot: TextureSlot,
        texture: TextureId,
    ) -> bool {
        let binding = &self.textures[slot.index()];
        binding.target == target && binding.texture == texture
    }

    /// Records a framebuffer bind. Returns `false` if it was already bound.
    pub fn bind_framebuffer(&mut self, framebuffer: FramebufferId) -> bool {
        if self.framebuffer.id == framebuffer {
            return false;
        }
        self.framebuffer.id = framebuffer;
        self.framebuffer.changed = true;
        true
    }

    /// The currently bound framebuffer.
    pub fn framebuffer(&self) -> FramebufferId {
        self.framebuffer.id
    }

    /// Clears and returns the framebuffer dirty flag.
    pub fn take_framebuffer_change(&mut self) -> bool {
        std::mem::take(&mut self.framebuffer.changed)
    }

    /// The cached binding of `slot`.
    pub fn texture(&self, slot: TextureSlot) -> &TextureBinding {
        &self.textures[slot.index()]
    }

    /// Returns `true` if any texture binding is dirty.
    pub fn has_texture_change(&self) -> bool {
        self.has_texture_change
    }

    /// Hands every dirty texture binding, in slot order, to `capture` and
    /// clears the dirty flags.
    pub fn take_texture_changes(&mut self, mut capture: impl FnMut(BindOp)) {
        if !self.has_texture_change {
            return;
        }

        for (index, binding) in self.textures.iter_mut().enumerate() {
            if binding.changed {
                binding.changed = false;
                capture(BindOp {
                    slot: TextureSlot::new(index as u8),
                    target: binding.target,
                    texture: binding.texture,
                });
            }
        }
        self.has_texture_change = false;
    }

    /// Returns `true` if `other` binds the same framebuffer and textures,
    /// whatever their dirty flags.
    pub fn same_bindings(&self, other: &Self) -> bool {
        self.framebuffer.id == other.framebuffer.id
            && self
                .textures
                .iter()
                .zip(&other.textures)
                .all(|(a, b)| a.target == b.target && a.texture == b.texture)
    }

    /// Returns a copy of the cache with every dirty flag cleared.
    pub fn save(&self) -> Self {
        let mut saved = self.clone();
        saved.framebuffer.changed = false;
        for binding in &mut saved.textures {
            binding.changed = false;
        }
        saved.has_texture_change = false;
        saved
    }

    /// Reinstates `saved` and resynchronises the real GPU bindings with it.
    ///
    /// The framebuffer is always rebound, as is every texture unit that has
    /// been bound at least once, because the work done since `save` may have
    /// clobbered any of them behind the cache's back. Dirty flags pending in
    /// the live cache survive, and every binding that differs from the live
    /// one becomes dirty so the next capture rebinds it at replay.
    pub fn restore(&mut self, saved: Self, device: &mut dyn GlDevice) {
        device.bind_framebuffer(saved.framebuffer.id);
        for (index, binding) in saved.textures.iter().enumerate() {
            if !binding.initial {
                device.bind_texture(TextureSlot::new(index as u8), binding.target, binding.texture);
            }
        }

        let framebuffer_changed =
            self.framebuffer.changed || self.framebuffer.id != saved.framebuffer.id;
        let pending: [bool; MAX_TEXTURE_SLOTS] = std::array::from_fn(|i| {
            let live = &self.textures[i];
            let restored = &saved.textures[i];
            live.changed || live.target != restored.target || live.texture != restored.texture
        });

        *self = saved;
        self.framebuffer.changed |= framebuffer_changed;
        for (binding, changed) in self.textures.iter_mut().zip(pending) {
            binding.changed |= changed;
        }
        self.has_texture_change = pending.iter().any(|&changed| changed);
    }
}

impl Default for AttachmentState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_infra::{GlCall, RecordingDevice};

    const SLOT_0: TextureSlot = TextureSlot::new(0);
    const SLOT_2: TextureSlot = TextureSlot::new(2);

    fn captured(state: &mut AttachmentState) -> Vec<BindOp> {
        let mut ops = Vec::new();
        state.take_texture_changes(|op| ops.push(op));
        ops
    }

    #[test]
    fn test_identical_rebind_is_a_no_op() {
        let mut state = AttachmentState::new();
        assert!(state.bind_texture(TextureTarget::Texture2D, SLOT_0, TextureId(5)));
        assert!(!state.bind_texture(TextureTarget::Texture2D, SLOT_0, TextureId(5)));

        let ops = captured(&mut state);
        assert_eq!(
            ops,
            vec![BindOp {
                slot: SLOT_0,
                target: TextureTarget::Texture2D,
                texture: TextureId(5)
            }]
        );
        assert!(!state.has_texture_change());
        assert!(captured(&mut state).is_empty());

        assert!(!state.bind_texture(TextureTarget::Texture2D, SLOT_0, TextureId(5)));
        assert!(captured(&mut state).is_empty());
    }

    #[test]
    fn test_changes_are_captured_in_slot_order() {
        let mut state = AttachmentState::new();
        state.bind_texture(TextureTarget::Texture2D, SLOT_2, TextureId(9));
        state.bind_texture(TextureTarget::Texture2D, SLOT_0, TextureId(4));
        state.bind_texture(TextureTarget::Texture3D, SLOT_0, TextureId(4));

        let ops = captured(&mut state);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[0].slot, SLOT_0);
        assert_eq!(ops[0].target, TextureTarget::Texture3D);
        assert_eq!(ops[1].texture, TextureId(9));
    }

    #[test]
    fn test_framebuffer_rebind() {
        let mut state = AttachmentState::new();
        assert!(!state.bind_framebuffer(FramebufferId::DEFAULT));
        assert!(state.bind_framebuffer(FramebufferId(3)));
        assert!(!state.bind_framebuffer(FramebufferId(3)));
        assert!(state.take_framebuffer_change());
        assert!(!state.take_framebuffer_change());
        assert_eq!(state.framebuffer(), FramebufferId(3));
    }

    #[test]
    fn test_save_clears_dirty_flags_only() {
        let mut state = AttachmentState::new();
        state.bind_framebuffer(FramebufferId(2));
        state.bind_texture(TextureTarget::Texture2D, SLOT_2, TextureId(7));

        let saved = state.save();
        assert!(!saved.has_texture_change());
        assert!(!saved.texture(SLOT_2).changed);
        assert!(!saved.texture(SLOT_2).initial);
        assert_eq!(saved.texture(SLOT_2).texture, TextureId(7));
        assert_eq!(saved.framebuffer(), FramebufferId(2));
    }

    #[test]
    fn test_save_restore_round_trip() {
        let mut device = RecordingDevice::new();
        let log = device.log();
        let mut state = AttachmentState::new();
        state.bind_framebuffer(FramebufferId(2));
        state.bind_texture(TextureTarget::Texture2D, SLOT_0, TextureId(7));
        captured(&mut state);
        state.take_framebuffer_change();

        let saved = state.save();
        state.bind_framebuffer(FramebufferId(11));
        state.bind_texture(TextureTarget::Texture2D, SLOT_0, TextureId(12));
        state.bind_texture(TextureTarget::Texture1D, SLOT_2, TextureId(13));
        state.restore(saved, &mut device);

        assert_eq!(state.framebuffer(), FramebufferId(2));
        assert_eq!(state.texture(SLOT_0).texture, TextureId(7));
        assert_eq!(state.texture(SLOT_2).texture, TextureId::NONE);
        assert!(state.texture(SLOT_2).initial);

        assert_eq!(
            log.calls(),
            vec![
                GlCall::BindFramebuffer(FramebufferId(2)),
                GlCall::BindTexture {
                    slot: SLOT_0,
                    target: TextureTarget::Texture2D,
                    texture: TextureId(7)
                },
            ]
        );
    }

    #[test]
    fn test_restore_keeps_pending_changes() {
        let mut device = RecordingDevice::new();
        let mut state = AttachmentState::new();
        state.bind_texture(TextureTarget::Texture2D, SLOT_0, TextureId(7));

        let saved = state.save();
        state.restore(saved, &mut device);

        assert!(state.has_texture_change());
        assert_eq!(captured(&mut state).len(), 1);
    }

    #[test]
    fn test_restore_marks_rolled_back_bindings_dirty() {
        let mut device = RecordingDevice::new();
        let mut state = AttachmentState::new();
        state.bind_texture(TextureTarget::Texture2D, SLOT_0, TextureId(7));
        captured(&mut state);

        let saved = state.save();
        state.bind_texture(TextureTarget::Texture2D, SLOT_0, TextureId(9));
        captured(&mut state);
        state.restore(saved, &mut device);

        assert_eq!(
            captured(&mut state),
            vec![BindOp {
                slot: SLOT_0,
                target: TextureTarget::Texture2D,
                texture: TextureId(7)
            }]
        );
    }
}
