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

//! Per-frame counters collected by the command queue.

use serde::Serialize;
use std::fmt;

/// Statistics about one recorded and executed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    /// Batches replayed by `execute`.
    pub batches_executed: u32,
    /// Batches folded into an earlier batch of the same program.
    pub batches_merged: u32,
    /// `draw_arrays` calls issued.
    pub draw_calls: u32,
    /// Vertices submitted to the GPU.
    pub vertices: u32,
    /// Program switches issued.
    pub program_switches: u32,
    /// Framebuffer binds issued.
    pub framebuffer_switches: u32,
    /// Texture binds issued.
    pub texture_binds: u32,
    /// Uniform uploads issued.
    pub uniform_uploads: u32,
    /// Clears issued.
    pub clears: u32,
    /// Shadow vertex buffers that had to grow.
    pub buffer_reallocations: u32,
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} batches ({} merged), {} draws / {} vertices, {} program switches, \
             {} framebuffer binds, {} texture binds, {} uniform uploads, {} clears",
            self.batches_executed,
            self.batches_merged,
            self.draw_calls,
            self.vertices,
            self.program_switches,
            self.framebuffer_switches,
            self.texture_binds,
            self.uniform_uploads,
            self.clears
        )
    }
}
