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

//! Defines the error types for GPU resource creation.

use std::fmt;

/// An error related to the creation of a GPU resource.
///
/// These are the recoverable failures of the renderer core. Contract
/// violations (mismatched save/restore, drawing without a program) panic
/// instead of returning one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The requested texture is larger than the device supports.
    TextureTooLarge {
        /// The requested width in pixels.
        width: u32,
        /// The requested height in pixels.
        height: u32,
        /// The maximum edge length reported by the device.
        max_size: u32,
    },
    /// A zero-sized texture or render target was requested.
    InvalidDimensions {
        /// The requested width in pixels.
        width: u32,
        /// The requested height in pixels.
        height: u32,
    },
    /// The backend failed to allocate a GPU object.
    CreationFailed {
        /// The kind of object, e.g. `"texture"` or `"framebuffer"`.
        resource: &'static str,
        /// Details reported by the backend.
        details: String,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::TextureTooLarge {
                width,
                height,
                max_size,
            } => write!(
                f,
                "Texture of {width}x{height} exceeds the maximum texture size of {max_size}"
            ),
            ResourceError::InvalidDimensions { width, height } => {
                write!(f, "Invalid texture dimensions {width}x{height}")
            }
            ResourceError::CreationFailed { resource, details } => {
                write!(f, "Failed to create {resource}: {details}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ResourceError::TextureTooLarge {
            width: 9000,
            height: 16,
            max_size: 8192,
        };
        assert_eq!(
            err.to_string(),
            "Texture of 9000x16 exceeds the maximum texture size of 8192"
        );

        let err = ResourceError::CreationFailed {
            resource: "framebuffer",
            details: "out of names".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to create framebuffer: out of names");
    }
}
