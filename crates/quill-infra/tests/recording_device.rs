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

use quill_core::renderer::{
    FramebufferStatus, GlDevice, ProgramId, TextureSlot, TextureTarget, UniformLocation,
};
use quill_infra::{GlCall, RecordingDevice};

#[test]
fn test_recording_device_logs_calls_in_order() {
    // --- 1. ARRANGE ---
    let mut device = RecordingDevice::new().with_uniform(ProgramId(2), "u_alpha", 4);
    let log = device.log();

    // --- 2. ACT ---
    let texture = device.create_texture().unwrap();
    device.bind_texture(TextureSlot::new(3), TextureTarget::Texture2D, texture);
    let location = device.uniform_location(ProgramId(2), "u_alpha");
    device.uniform_2fv(UniformLocation(4), &[1.0, 2.0, 3.0, 4.0]);
    let status = device.framebuffer_status();

    // --- 3. ASSERT ---
    assert_eq!(location, Some(UniformLocation(4)));
    assert_eq!(status, FramebufferStatus::Complete);
    assert_eq!(
        log.calls(),
        vec![
            GlCall::CreateTexture(texture),
            GlCall::BindTexture {
                slot: TextureSlot::new(3),
                target: TextureTarget::Texture2D,
                texture
            },
            GlCall::UniformFloat {
                location: UniformLocation(4),
                components: 2,
                values: vec![1.0, 2.0, 3.0, 4.0]
            },
            GlCall::CheckFramebufferStatus,
        ]
    );
}

#[test]
fn test_names_are_unique_across_object_kinds() {
    let mut device = RecordingDevice::new();
    let buffer = device.create_buffer().unwrap();
    let texture = device.create_texture().unwrap();
    let framebuffer = device.create_framebuffer().unwrap();
    assert_eq!((buffer.0, texture.0, framebuffer.0), (1, 2, 3));
}

#[test]
fn test_capabilities_are_configurable() {
    let device = RecordingDevice::new().with_max_texture_size(1024).with_gles(true);
    assert_eq!(device.max_texture_size(), 1024);
    assert!(device.is_gles());
    assert!(matches!(
        RecordingDevice::new()
            .with_incomplete_framebuffers()
            .framebuffer_status(),
        FramebufferStatus::Incomplete(_)
    ));
}
