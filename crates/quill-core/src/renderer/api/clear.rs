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

//! Flags selecting which buffers a clear operation resets.

use std::ops::{BitOr, BitOrAssign};

/// Flags selecting the buffers a clear resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ClearFlags {
    bits: u32,
}

impl ClearFlags {
    /// The color buffer.
    pub const COLOR: Self = Self { bits: 1 << 0 };
    /// The depth buffer.
    pub const DEPTH: Self = Self { bits: 1 << 1 };
    /// The stencil buffer.
    pub const STENCIL: Self = Self { bits: 1 << 2 };
    /// Color, depth and stencil.
    pub const ALL: Self = Self {
        bits: Self::COLOR.bits | Self::DEPTH.bits | Self::STENCIL.bits,
    };

    /// No buffers.
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Creates flags from raw bits, dropping unknown bits.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self {
            bits: bits & Self::ALL.bits,
        }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Returns `true` if no buffer is selected.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Returns `true` if every flag in `other` is also set in `self`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// An empty mask means "everything".
    pub const fn or_all(self) -> Self {
        if self.is_empty() {
            Self::ALL
        } else {
            self
        }
    }
}

impl BitOr for ClearFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self {
            bits: self.bits | rhs.bits,
        }
    }
}

impl BitOrAssign for ClearFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits |= rhs.bits;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_expands_to_all() {
        assert_eq!(ClearFlags::empty().or_all(), ClearFlags::ALL);
        assert_eq!(ClearFlags::COLOR.or_all(), ClearFlags::COLOR);
    }

    #[test]
    fn test_combination() {
        let mut flags = ClearFlags::COLOR;
        flags |= ClearFlags::STENCIL;
        assert!(flags.contains(ClearFlags::COLOR));
        assert!(!flags.contains(ClearFlags::DEPTH));
        assert_eq!((flags | ClearFlags::DEPTH), ClearFlags::ALL);
        assert_eq!(ClearFlags::from_bits_truncate(0xFF), ClearFlags::ALL);
    }
}
