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

//! # Quill Driver
//!
//! The thin layer a renderer talks to: it owns the [`CommandQueue`] and the
//! linked programs, resolves symbolic uniform keys to locations, and keeps
//! the frame calls in order.
//!
//! [`CommandQueue`]: quill_command::CommandQueue

#![warn(missing_docs)]

pub mod driver;
pub mod program;
pub mod shared;

pub use driver::Driver;
pub use program::Program;
pub use shared::SharedUniform;
