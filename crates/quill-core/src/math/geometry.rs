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

//! 2D geometry value types: points, sizes, rectangles and rounded rectangles.

use serde::{Deserialize, Serialize};

/// A point in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Point {
    /// The horizontal coordinate.
    pub x: f32,
    /// The vertical coordinate.
    pub y: f32,
}

impl Point {
    /// Creates a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A 2D extent.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Size {
    /// The horizontal extent.
    pub width: f32,
    /// The vertical extent.
    pub height: f32,
}

impl Size {
    /// A zero-sized extent.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a new size.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned rectangle given by its origin and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Rect {
    /// The origin (top-left corner).
    pub origin: Point,
    /// The extent.
    pub size: Size,
}

impl Rect {
    /// Creates a new rectangle from its origin and size components.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// Returns the rectangle as `[x, y, width, height]`, the layout used by `vec4` uniforms.
    pub const fn to_array(self) -> [f32; 4] {
        [self.origin.x, self.origin.y, self.size.width, self.size.height]
    }
}

/// The index of each corner in [`RoundedRect::corners`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    /// The top-left corner.
    TopLeft = 0,
    /// The top-right corner.
    TopRight = 1,
    /// The bottom-right corner.
    BottomRight = 2,
    /// The bottom-left corner.
    BottomLeft = 3,
}

/// A rectangle whose corners are rounded by elliptical radii.
///
/// The layout is twelve consecutive floats: the bounds followed by the four
/// corner sizes. Uploaded to shaders as three `vec4` packets, or only the
/// first one when the corners have not changed since the previous upload.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct RoundedRect {
    /// The outer bounds.
    pub bounds: Rect,
    /// The radii of each corner, indexed by [`Corner`].
    pub corners: [Size; 4],
}

impl RoundedRect {
    /// Creates a rounded rectangle with square corners.
    pub const fn from_rect(bounds: Rect) -> Self {
        Self {
            bounds,
            corners: [Size::ZERO; 4],
        }
    }

    /// Creates a rounded rectangle using the same radius on every corner.
    pub const fn uniform(bounds: Rect, radius: f32) -> Self {
        let corner = Size::new(radius, radius);
        Self {
            bounds,
            corners: [corner; 4],
        }
    }

    /// Returns the radius of a single corner.
    pub fn corner(&self, corner: Corner) -> Size {
        self.corners[corner as usize]
    }

    /// Returns `true` if any corner differs from the corresponding corner of `other`.
    pub fn corners_differ(&self, other: &Self) -> bool {
        self.corners != other.corners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounded_rect_is_twelve_floats() {
        let rr = RoundedRect::uniform(Rect::new(1.0, 2.0, 3.0, 4.0), 5.0);
        let floats: [f32; 12] = bytemuck::cast(rr);
        assert_eq!(&floats[..4], &[1.0, 2.0, 3.0, 4.0]);
        assert!(floats[4..].iter().all(|&r| r == 5.0));
    }

    #[test]
    fn test_corners_differ_ignores_bounds() {
        let a = RoundedRect::uniform(Rect::new(0.0, 0.0, 10.0, 10.0), 2.0);
        let mut b = RoundedRect::uniform(Rect::new(5.0, 5.0, 1.0, 1.0), 2.0);
        assert!(!a.corners_differ(&b));
        b.corners[Corner::BottomLeft as usize] = Size::new(3.0, 2.0);
        assert!(a.corners_differ(&b));
        assert_eq!(b.corner(Corner::BottomLeft), Size::new(3.0, 2.0));
    }
}
