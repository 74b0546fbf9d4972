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

//! Math value types shared by the command queue and its callers.
//!
//! These types are plain `#[repr(C)]` data so they can be stored byte-for-byte
//! in the uniform cache and handed to the GPU without conversion.

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

// --- Declare Sub-Modules ---

pub mod color;
pub mod geometry;
pub mod matrix;

// --- Re-export Principal Types ---

pub use self::color::Rgba;
pub use self::geometry::{Point, Rect, RoundedRect, Size};
pub use self::matrix::Mat4;
