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

use approx::assert_relative_eq;
use quill_command::QueueSettings;
use quill_core::math::{Rect, Rgba};
use quill_core::renderer::{
    FilterMode, PixelRect, ProgramId, TextureId, TextureSlot, TextureTarget, UniformLocation,
    Vertex,
};
use quill_driver::{Driver, SharedUniform};
use quill_infra::{CallLog, GlCall, RecordingDevice};

const COLOR: ProgramId = ProgramId(10);
const TEXTURE: ProgramId = ProgramId(11);
const COLOR_KEY: u32 = SharedUniform::COUNT;

fn driver() -> (Driver, CallLog) {
    let device = RecordingDevice::new()
        .with_uniform(COLOR, "u_alpha", 0)
        .with_uniform(COLOR, "u_viewport", 1)
        .with_uniform(COLOR, "u_color", 2)
        .with_uniform(TEXTURE, "u_alpha", 0)
        .with_uniform(TEXTURE, "u_source", 3);
    let log = device.log();
    let driver = Driver::new(Box::new(device), QueueSettings::default()).unwrap();
    (driver, log)
}

fn quad() -> [Vertex; 6] {
    Vertex::quad(Rect::new(0.0, 0.0, 32.0, 32.0), Rect::new(0.0, 0.0, 1.0, 1.0))
}

#[test]
fn test_load_resolves_shared_and_extra_uniforms() {
    // --- 1. ARRANGE ---
    let (mut driver, _log) = driver();

    // --- 2. ACT ---
    let id = driver
        .load_program("color", COLOR, &[("u_color", COLOR_KEY)])
        .unwrap();

    // --- 3. ASSERT ---
    let program = driver.program(id).unwrap();
    assert_eq!(program.name(), "color");
    assert_eq!(program.location(SharedUniform::Alpha.key()), Some(UniformLocation(0)));
    assert_eq!(program.location(SharedUniform::Viewport.key()), Some(UniformLocation(1)));
    assert_eq!(program.location(SharedUniform::Projection.key()), None);
    assert_eq!(program.location(COLOR_KEY), Some(UniformLocation(2)));

    let alpha = driver.queue().uniforms().info(COLOR, UniformLocation(0)).unwrap();
    assert!(alpha.changed);
    let stored = driver.queue().uniforms().floats(alpha.offset, 1)[0];
    assert_relative_eq!(stored, 1.0);
}

#[test]
fn test_load_rejects_reserved_keys_and_duplicates() {
    let (mut driver, _log) = driver();
    assert!(driver.load_program("bad", COLOR, &[("u_color", 2)]).is_err());
    assert!(driver.load_program("zero", ProgramId::NONE, &[]).is_err());
    driver.load_program("color", COLOR, &[]).unwrap();
    assert!(driver.load_program("again", COLOR, &[]).is_err());
}

#[test]
fn test_frame_through_programs() {
    // --- 1. ARRANGE ---
    let (mut driver, log) = driver();
    driver
        .load_program("color", COLOR, &[("u_color", COLOR_KEY)])
        .unwrap();
    driver.load_program("texture", TEXTURE, &[]).unwrap();
    let viewport = Rect::new(0.0, 0.0, 800.0, 600.0);

    // --- 2. ACT ---
    driver.begin_frame();
    log.clear();
    driver.with_program(COLOR, |program, queue| {
        program.begin_draw(queue, &viewport);
        program.set_uniform_color(queue, COLOR_KEY, Some(&Rgba::BLUE));
        queue.draw(&quad());
    });
    driver.with_program(TEXTURE, |program, queue| {
        program.begin_draw(queue, &viewport);
        program.set_uniform_texture(
            queue,
            SharedUniform::Source.key(),
            TextureTarget::Texture2D,
            TextureSlot::ZERO,
            TextureId(42),
        );
        queue.draw(&quad());
    });
    let stats = driver.execute().unwrap();
    driver.end_frame();

    // --- 3. ASSERT ---
    assert_eq!(log.program_switches(), vec![COLOR, TEXTURE]);
    assert_eq!(stats.draw_calls, 2);
    assert_eq!(stats.texture_binds, 1);
    assert_eq!(log.count(|call| *call == GlCall::Viewport(PixelRect::new(0, 0, 800, 600))), 1);
    // alpha for both programs, viewport and color for the color program, the sampler
    assert_eq!(stats.uniform_uploads, 5);
    assert!(!driver.in_frame());
}

#[test]
fn test_with_unknown_program_does_nothing() {
    let (mut driver, _log) = driver();
    assert_eq!(driver.with_program(ProgramId(99), |_, _| 1), None);
}

#[test]
#[should_panic(expected = "execute outside of a frame")]
fn test_execute_before_begin_panics() {
    let (mut driver, _log) = driver();
    let _ = driver.execute();
}

#[test]
fn test_delete_and_drop_release_programs() {
    // --- 1. ARRANGE ---
    let (mut driver, log) = driver();
    driver.load_program("color", COLOR, &[]).unwrap();
    driver.load_program("texture", TEXTURE, &[]).unwrap();

    // --- 2. ACT ---
    assert!(driver.delete_program(COLOR));
    assert!(!driver.delete_program(COLOR));
    drop(driver);

    // --- 3. ASSERT ---
    let deleted: Vec<_> = log
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            GlCall::DeleteProgram(id) => Some(id),
            _ => None,
        })
        .collect();
    assert_eq!(deleted, vec![COLOR, TEXTURE]);
}

#[test]
fn test_resource_errors_carry_context() {
    let (mut driver, _log) = driver();
    let error = driver
        .create_texture(100_000, 4, FilterMode::Linear, FilterMode::Linear)
        .unwrap_err();
    assert!(error.to_string().contains("100000x4"));

    let short = driver.upload_texture(2, 2, FilterMode::Linear, FilterMode::Linear, &[0; 3]);
    assert!(short.is_err());
}
