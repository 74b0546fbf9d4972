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

//! # Quill Command
//!
//! The command-batching core of the GL renderer. A [`CommandQueue`] records a
//! frame's draws, clears, binds and uniform changes into a linked list of
//! batches, merges batches that share a program whenever no intervening
//! state forbids it, and replays the result through a
//! [`GlDevice`](quill_core::renderer::GlDevice) with only the state changes
//! each batch actually needs.

#![warn(missing_docs)]

pub mod attachment;
pub mod batch;
pub mod queue;
pub mod settings;
pub mod stats;
pub mod uniform;
pub mod vertex_buffer;

pub use attachment::AttachmentState;
pub use queue::CommandQueue;
pub use settings::QueueSettings;
pub use stats::FrameStats;
pub use uniform::{UniformFormat, UniformState};
pub use vertex_buffer::VertexStreamBuffer;
