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

//! Tunables of the command queue.

use serde::{Deserialize, Serialize};

/// The smallest number of shadow buffers that avoids writing into a buffer
/// the GPU may still be reading from the previous frame.
pub const MIN_SHADOW_BUFFERS: usize = 2;

/// Settings controlling batching and vertex streaming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// How many earlier batches of the same program are considered when merging.
    pub merge_window: usize,
    /// The number of GPU-side vertex buffers used round-robin across frames.
    pub shadow_buffers: usize,
    /// The initial vertex capacity of the stream buffer.
    pub reserved_vertices: usize,
    /// If `false`, debug-group markers are dropped at record time.
    pub debug_groups: bool,
}

impl QueueSettings {
    /// Returns a copy with out-of-range values clamped, logging each adjustment.
    pub fn sanitized(&self) -> Self {
        let mut settings = self.clone();
        if settings.shadow_buffers < MIN_SHADOW_BUFFERS {
            log::warn!(
                "QueueSettings: shadow_buffers = {} is too low, using {}",
                settings.shadow_buffers,
                MIN_SHADOW_BUFFERS
            );
            settings.shadow_buffers = MIN_SHADOW_BUFFERS;
        }
        if settings.merge_window == 0 {
            log::warn!("QueueSettings: merge_window = 0 is invalid, using 1");
            settings.merge_window = 1;
        }
        settings
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            merge_window: 5,
            shadow_buffers: MIN_SHADOW_BUFFERS,
            reserved_vertices: 1024,
            debug_groups: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_clamps_invalid_values() {
        let settings = QueueSettings {
            merge_window: 0,
            shadow_buffers: 1,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(settings.merge_window, 1);
        assert_eq!(settings.shadow_buffers, MIN_SHADOW_BUFFERS);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: QueueSettings = serde_json::from_str(r#"{ "merge_window": 8 }"#).unwrap();
        assert_eq!(settings.merge_window, 8);
        assert_eq!(settings.shadow_buffers, 2);
        assert_eq!(settings.reserved_vertices, 1024);
        assert!(settings.debug_groups);
    }
}
