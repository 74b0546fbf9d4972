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

// Quill Sandbox
// Records a small two-pass frame on the headless backend and prints the
// resulting statistics. Usage: sandbox [settings.json] [--json] [--dump]

use anyhow::{Context, Result};
use quill_command::QueueSettings;
use quill_core::math::{Mat4, Rect, RoundedRect, Rgba};
use quill_core::renderer::{
    ClearFlags, FramebufferId, ProgramId, TextureSlot, TextureTarget, Vertex,
};
use quill_driver::{Driver, SharedUniform};
use quill_infra::RecordingDevice;
use std::path::Path;

const COLOR: ProgramId = ProgramId(1);
const BLIT: ProgramId = ProgramId(2);
const COLOR_KEY: u32 = SharedUniform::COUNT;

const TARGET_SIZE: u32 = 256;

fn load_settings(path: &Path) -> Result<QueueSettings> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse settings in {}", path.display()))
}

fn device() -> RecordingDevice {
    let mut device = RecordingDevice::new();
    for (index, shared) in SharedUniform::ALL.iter().enumerate() {
        device = device
            .with_uniform(COLOR, shared.name(), index as u32)
            .with_uniform(BLIT, shared.name(), index as u32);
    }
    device.with_uniform(COLOR, "u_color", SharedUniform::COUNT)
}

fn quad(x: f32, y: f32, size: f32) -> [Vertex; 6] {
    Vertex::quad(Rect::new(x, y, size, size), Rect::new(0.0, 0.0, 1.0, 1.0))
}

/// Renders a few swatches offscreen, then composites them onto the window
/// together with an outlined overlay.
fn record_frame(driver: &mut Driver) -> Result<()> {
    let (target, texture) = driver.create_render_target(TARGET_SIZE, TARGET_SIZE)?;
    driver.autorelease_framebuffer(target);
    driver.autorelease_texture(texture);

    let offscreen = Rect::new(0.0, 0.0, TARGET_SIZE as f32, TARGET_SIZE as f32);
    let window = Rect::new(0.0, 0.0, 1280.0, 720.0);
    let projection = Mat4::orthographic(0.0, 1280.0, 720.0, 0.0, -1.0, 1.0);

    let queue = driver.queue_mut();
    queue.push_debug_group("swatches");
    queue.bind_framebuffer(target);
    queue.clear(ClearFlags::COLOR);
    queue.pop_debug_group();

    driver.with_program(COLOR, |program, queue| {
        program.begin_draw(queue, &offscreen);
        for (i, color) in [Rgba::RED, Rgba::GREEN, Rgba::BLUE].iter().enumerate() {
            program.set_uniform_color(queue, COLOR_KEY, Some(color));
            queue.draw(&quad(i as f32 * 64.0, 0.0, 64.0));
        }
    });

    let queue = driver.queue_mut();
    queue.push_debug_group("composite");
    queue.bind_framebuffer(FramebufferId::DEFAULT);
    queue.clear(ClearFlags::empty());

    driver.with_program(BLIT, |program, queue| {
        program.begin_draw(queue, &window);
        program.set_uniform_matrix(queue, SharedUniform::Projection.key(), &projection);
        program.set_uniform_texture(
            queue,
            SharedUniform::Source.key(),
            TextureTarget::Texture2D,
            TextureSlot::ZERO,
            texture,
        );
        queue.draw(&quad(100.0, 100.0, 256.0));
    });
    driver.with_program(COLOR, |program, queue| {
        program.begin_draw(queue, &window);
        program.set_uniform_rounded_rect(
            queue,
            SharedUniform::ClipRect.key(),
            &RoundedRect::uniform(window, 12.0),
        );
        program.set_uniform_color(queue, COLOR_KEY, Some(&Rgba::new(0.0, 0.0, 0.0, 0.5)));
        queue.draw(&quad(0.0, 0.0, 32.0));
    });
    driver.queue_mut().pop_debug_group();
    Ok(())
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut settings_path = None;
    let mut dump = false;
    let mut json = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--dump" => dump = true,
            "--json" => json = true,
            path => settings_path = Some(path.to_owned()),
        }
    }
    let settings = match settings_path {
        Some(path) => load_settings(Path::new(&path))?,
        None => QueueSettings::default(),
    };

    let device = device();
    let log = device.log();
    let mut driver = Driver::new(Box::new(device), settings)?;
    driver.load_program("color", COLOR, &[("u_color", COLOR_KEY)])?;
    driver.load_program("blit", BLIT, &[])?;

    driver.begin_frame();
    let setup_calls = log.len();
    record_frame(&mut driver)?;
    let stats = driver.execute()?;
    driver.end_frame();

    log::info!("Sandbox: {}", stats);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("{}", stats);
    }
    println!("{} GL calls ({} during setup)", log.len(), setup_calls);
    if dump {
        for (index, call) in log.calls().iter().enumerate() {
            println!("{:>4}  {:?}", index, call);
        }
    }

    driver.delete_program(COLOR);
    driver.delete_program(BLIT);
    Ok(())
}
