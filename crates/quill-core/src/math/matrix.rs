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

//! Defines the 4x4 column-major matrix type used for projection and model-view uniforms.

use super::EPSILON;
use serde::{Deserialize, Serialize};

/// A 4x4 column-major matrix.
///
/// Only the operations the renderer core needs are provided: construction,
/// flattening for upload, and the two equality checks the uniform cache uses
/// to skip redundant uploads.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Mat4 {
    /// The four columns of the matrix.
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a matrix from four columns.
    #[inline]
    pub const fn from_cols(c0: [f32; 4], c1: [f32; 4], c2: [f32; 4], c3: [f32; 4]) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Creates a translation matrix.
    pub const fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self::from_cols(
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [x, y, z, 1.0],
        )
    }

    /// Creates a scale matrix.
    pub const fn from_scale(x: f32, y: f32, z: f32) -> Self {
        Self::from_cols(
            [x, 0.0, 0.0, 0.0],
            [0.0, y, 0.0, 0.0],
            [0.0, 0.0, z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        )
    }

    /// Creates an orthographic projection mapping the given box to clip space.
    ///
    /// Depth maps to `[-1, 1]` as in OpenGL.
    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let rml = right - left;
        let tmb = top - bottom;
        let fmn = far - near;

        Self::from_cols(
            [2.0 / rml, 0.0, 0.0, 0.0],
            [0.0, 2.0 / tmb, 0.0, 0.0],
            [0.0, 0.0, -2.0 / fmn, 0.0],
            [
                -(right + left) / rml,
                -(top + bottom) / tmb,
                -(far + near) / fmn,
                1.0,
            ],
        )
    }

    /// Returns the sixteen components in column-major order.
    #[inline]
    pub fn to_cols_array(&self) -> [f32; 16] {
        bytemuck::cast(self.cols)
    }

    /// Bitwise equality of all sixteen components.
    ///
    /// Cheaper than [`PartialEq`] and the first check the uniform cache runs.
    pub fn equal_fast(&self, other: &Self) -> bool {
        bytemuck::bytes_of(self) == bytemuck::bytes_of(other)
    }

    /// Component-wise equality within [`EPSILON`].
    pub fn approx_eq(&self, other: &Self) -> bool {
        self.to_cols_array()
            .iter()
            .zip(other.to_cols_array().iter())
            .all(|(&a, &b)| approx::abs_diff_eq!(a, b, epsilon = EPSILON))
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_is_identity() {
        assert_eq!(Mat4::default(), Mat4::IDENTITY);
    }

    #[test]
    fn test_equal_fast_is_bitwise() {
        let a = Mat4::from_translation(1.0, 2.0, 3.0);
        assert!(a.equal_fast(&a));
        assert!(!a.equal_fast(&Mat4::IDENTITY));

        let zero = Mat4::from_scale(0.0, 1.0, 1.0);
        let neg_zero = Mat4::from_scale(-0.0, 1.0, 1.0);
        assert_eq!(zero, neg_zero);
        assert!(!zero.equal_fast(&neg_zero));
    }

    #[test]
    fn test_approx_eq_tolerates_rounding() {
        let a = Mat4::from_translation(1.0, 2.0, 3.0);
        let b = Mat4::from_translation(1.0 + 1e-7, 2.0, 3.0);
        assert!(a.approx_eq(&b));
        assert!(!a.approx_eq(&Mat4::from_translation(1.1, 2.0, 3.0)));
    }

    #[test]
    fn test_orthographic_maps_corners() {
        let m = Mat4::orthographic(0.0, 800.0, 600.0, 0.0, -1.0, 1.0);
        let cols = m.to_cols_array();
        assert_relative_eq!(cols[0], 2.0 / 800.0);
        assert_relative_eq!(cols[5], -2.0 / 600.0);
        assert_relative_eq!(cols[12], -1.0);
        assert_relative_eq!(cols[13], 1.0);
    }
}
