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

use quill_command::{CommandQueue, QueueSettings};
use quill_core::math::Rect;
use quill_core::renderer::{
    FilterMode, FramebufferId, ProgramId, ResourceError, TextureId, TextureSlot, TextureTarget,
    UniformLocation, Vertex,
};
use quill_infra::{CallLog, GlCall, RecordingDevice};

fn queue_on(device: RecordingDevice) -> (CommandQueue, CallLog) {
    let log = device.log();
    let queue = CommandQueue::new(Box::new(device), QueueSettings::default()).unwrap();
    (queue, log)
}

fn quad(x: f32) -> [Vertex; 6] {
    Vertex::quad(Rect::new(x, 0.0, 10.0, 10.0), Rect::new(0.0, 0.0, 1.0, 1.0))
}

/// Executes the frame and returns the replayed binds and draws.
fn replay_binds_and_draws(queue: &mut CommandQueue, log: &CallLog) -> Vec<GlCall> {
    log.clear();
    queue.execute().unwrap();
    log.calls()
        .into_iter()
        .filter(|call| {
            matches!(
                call,
                GlCall::BindFramebuffer(_) | GlCall::BindTexture { .. } | GlCall::DrawArrays { .. }
            )
        })
        .collect()
}

#[test]
fn test_oversized_texture_is_refused_without_gl_calls() {
    // --- 1. ARRANGE ---
    let (mut queue, log) = queue_on(RecordingDevice::new().with_max_texture_size(2048));
    log.clear();

    // --- 2. ACT ---
    let result = queue.create_texture(4096, 16, FilterMode::Linear, FilterMode::Linear);

    // --- 3. ASSERT ---
    assert_eq!(
        result,
        Err(ResourceError::TextureTooLarge {
            width: 4096,
            height: 16,
            max_size: 2048
        })
    );
    assert!(log.is_empty());
    assert_eq!(
        queue.create_texture(0, 16, FilterMode::Linear, FilterMode::Linear),
        Err(ResourceError::InvalidDimensions {
            width: 0,
            height: 16
        })
    );
}

#[test]
fn test_upload_texture_restores_caller_bindings() {
    // --- 1. ARRANGE ---
    let (mut queue, log) = queue_on(RecordingDevice::new());
    queue.begin_frame();
    let slot = TextureSlot::new(0);
    queue.bind_texture(TextureTarget::Texture2D, slot, TextureId(40));
    log.clear();

    // --- 2. ACT ---
    let pixels = vec![0u8; 4 * 4 * 4];
    let texture = queue
        .upload_texture(4, 4, FilterMode::Nearest, FilterMode::Linear, &pixels)
        .unwrap();

    // --- 3. ASSERT ---
    let calls = log.calls();
    assert_eq!(calls[0], GlCall::CreateTexture(texture));
    assert!(calls.contains(&GlCall::AllocateTexture2d {
        width: 4,
        height: 4,
        with_pixels: true
    }));
    assert_eq!(
        &calls[calls.len() - 2..],
        &[
            GlCall::BindFramebuffer(FramebufferId::DEFAULT),
            GlCall::BindTexture {
                slot,
                target: TextureTarget::Texture2D,
                texture: TextureId(40)
            },
        ]
    );
    assert_eq!(queue.attachments().texture(slot).texture, TextureId(40));
}

#[test]
fn test_render_target_rebinds_current_framebuffer() {
    // --- 1. ARRANGE ---
    let (mut queue, log) = queue_on(RecordingDevice::new());
    queue.begin_frame();
    let current = FramebufferId(77);
    queue.bind_framebuffer(current);
    log.clear();

    // --- 2. ACT ---
    let (framebuffer, texture) = queue.create_render_target(256, 128).unwrap();

    // --- 3. ASSERT ---
    let calls = log.calls();
    assert!(calls.contains(&GlCall::BindFramebuffer(framebuffer)));
    assert!(calls.contains(&GlCall::AttachColorTexture(texture)));
    assert!(calls.contains(&GlCall::SetTextureFilters {
        min_filter: FilterMode::Nearest,
        mag_filter: FilterMode::Nearest
    }));
    assert_eq!(calls.last(), Some(&GlCall::BindFramebuffer(current)));
    assert_eq!(queue.attachments().framebuffer(), current);
}

#[test]
#[should_panic(expected = "is not complete")]
fn test_incomplete_render_target_panics() {
    let (mut queue, _log) = queue_on(RecordingDevice::new().with_incomplete_framebuffers());
    let _ = queue.create_render_target(32, 32);
}

#[test]
fn test_autoreleased_resources_survive_until_end_frame() {
    // --- 1. ARRANGE ---
    let (mut queue, log) = queue_on(RecordingDevice::new());
    queue.begin_frame();
    let (framebuffer, texture) = queue.create_render_target(64, 64).unwrap();

    // --- 2. ACT ---
    queue.autorelease_texture(texture);
    queue.autorelease_framebuffer(framebuffer);
    queue.execute().unwrap();
    let deleted_early = log.count(|call| {
        matches!(call, GlCall::DeleteTextures(_) | GlCall::DeleteFramebuffers(_))
    });
    queue.end_frame();

    // --- 3. ASSERT ---
    assert_eq!(deleted_early, 0);
    let calls = log.calls();
    assert!(calls.contains(&GlCall::DeleteTextures(vec![texture])));
    assert!(calls.contains(&GlCall::DeleteFramebuffers(vec![framebuffer])));
    assert_eq!(queue.pending_autoreleases(), 0);
}

#[test]
#[should_panic(expected = "without a matching save")]
fn test_unbalanced_restore_panics() {
    let (mut queue, _log) = queue_on(RecordingDevice::new());
    queue.save_attachments();
    queue.restore_attachments();
    queue.restore_attachments();
}

#[test]
#[should_panic(expected = "unrestored attachment saves")]
fn test_unbalanced_save_panics_at_end_frame() {
    let (mut queue, _log) = queue_on(RecordingDevice::new());
    queue.begin_frame();
    queue.save_attachments();
    queue.end_frame();
}

#[test]
fn test_restored_texture_applies_only_to_later_draws() {
    // --- 1. ARRANGE ---
    let slot = TextureSlot::new(0);
    let (mut queue, log) = queue_on(RecordingDevice::new());
    queue.begin_frame();
    queue.use_program(ProgramId(3));
    queue.bind_texture(TextureTarget::Texture2D, slot, TextureId(7));
    queue.draw(&quad(0.0));

    // --- 2. ACT ---
    queue.save_attachments();
    queue.bind_texture(TextureTarget::Texture2D, slot, TextureId(9));
    queue.draw(&quad(10.0));
    queue.restore_attachments();
    queue.draw(&quad(20.0));
    let replayed = replay_binds_and_draws(&mut queue, &log);

    // --- 3. ASSERT ---
    let bind = |texture| GlCall::BindTexture {
        slot,
        target: TextureTarget::Texture2D,
        texture: TextureId(texture),
    };
    assert_eq!(
        replayed,
        vec![
            GlCall::BindFramebuffer(FramebufferId::DEFAULT),
            bind(7),
            GlCall::DrawArrays { first: 0, count: 6 },
            bind(9),
            GlCall::DrawArrays { first: 6, count: 6 },
            bind(7),
            GlCall::DrawArrays { first: 12, count: 6 },
        ]
    );
    assert_eq!(queue.attachments().texture(slot).texture, TextureId(7));
}

#[test]
fn test_restored_framebuffer_applies_only_to_later_draws() {
    // --- 1. ARRANGE ---
    let (mut queue, log) = queue_on(RecordingDevice::new());
    queue.begin_frame();
    queue.use_program(ProgramId(3));

    // --- 2. ACT ---
    queue.save_attachments();
    queue.bind_framebuffer(FramebufferId(5));
    queue.draw(&quad(0.0));
    queue.restore_attachments();
    queue.draw(&quad(10.0));
    let replayed = replay_binds_and_draws(&mut queue, &log);

    // --- 3. ASSERT ---
    assert_eq!(queue.attachments().framebuffer(), FramebufferId::DEFAULT);
    assert_eq!(
        replayed,
        vec![
            GlCall::BindFramebuffer(FramebufferId(5)),
            GlCall::DrawArrays { first: 0, count: 6 },
            GlCall::BindFramebuffer(FramebufferId::DEFAULT),
            GlCall::DrawArrays { first: 6, count: 6 },
        ]
    );
}

#[test]
fn test_scoped_bindings_round_trip_through_replay() {
    // --- 1. ARRANGE ---
    let slot = TextureSlot::new(1);
    let (mut queue, log) = queue_on(RecordingDevice::new());
    queue.begin_frame();
    queue.use_program(ProgramId(4));
    queue.bind_texture(TextureTarget::Texture2D, slot, TextureId(20));
    queue.draw(&quad(0.0));

    // --- 2. ACT ---
    queue.with_saved_attachments(|queue| {
        queue.bind_framebuffer(FramebufferId(8));
        queue.bind_texture(TextureTarget::Texture2D, slot, TextureId(21));
        queue.draw(&quad(10.0));
    });
    queue.draw(&quad(20.0));
    let replayed = replay_binds_and_draws(&mut queue, &log);

    // --- 3. ASSERT ---
    let bind = |texture| GlCall::BindTexture {
        slot,
        target: TextureTarget::Texture2D,
        texture: TextureId(texture),
    };
    assert_eq!(
        replayed,
        vec![
            GlCall::BindFramebuffer(FramebufferId::DEFAULT),
            bind(20),
            GlCall::DrawArrays { first: 0, count: 6 },
            GlCall::BindFramebuffer(FramebufferId(8)),
            bind(21),
            GlCall::DrawArrays { first: 6, count: 6 },
            GlCall::BindFramebuffer(FramebufferId::DEFAULT),
            bind(20),
            GlCall::DrawArrays { first: 12, count: 6 },
        ]
    );
    assert_eq!(queue.attachments().framebuffer(), FramebufferId::DEFAULT);
    assert_eq!(queue.attachments().texture(slot).texture, TextureId(20));
}

#[test]
fn test_delete_program_forgets_cached_uniforms() {
    // --- 1. ARRANGE ---
    let program = ProgramId(6);
    let location = UniformLocation(3);
    let (mut queue, log) = queue_on(RecordingDevice::new());
    queue.set_uniform2f(program, location, 1.0, 2.0);

    // --- 2. ACT ---
    queue.delete_program(program);

    // --- 3. ASSERT ---
    assert!(queue.uniforms().info(program, location).is_none());
    assert_eq!(queue.uniforms().dirty_count(program), 0);
    assert!(log.calls().contains(&GlCall::DeleteProgram(program)));
}

#[test]
fn test_dropping_queue_releases_gpu_buffers() {
    // --- 1. ARRANGE ---
    let settings = QueueSettings {
        shadow_buffers: 3,
        ..Default::default()
    };
    let device = RecordingDevice::new();
    let log = device.log();
    let queue = CommandQueue::new(Box::new(device), settings).unwrap();

    // --- 2. ACT ---
    drop(queue);

    // --- 3. ASSERT ---
    let created = log.count(|call| matches!(call, GlCall::CreateBuffer(_)));
    let deleted = log.count(|call| matches!(call, GlCall::DeleteBuffer(_)));
    assert_eq!(created, 3);
    assert_eq!(deleted, 3);
}
