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

//! # Quill Infra
//!
//! Concrete implementations of the [`GlDevice`](quill_core::renderer::GlDevice)
//! contract: a real OpenGL backend and a headless recording backend.

#![warn(missing_docs)]

pub mod graphics;

#[cfg(feature = "glow")]
pub use graphics::glow::GlowDevice;
pub use graphics::recording::{CallLog, GlCall, RecordingDevice};
