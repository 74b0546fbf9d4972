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

//! The vertex record streamed to the GPU for every draw.

use crate::math::Rect;
use std::mem;

/// The number of vertices a single draw submits: two triangles forming a quad.
pub const QUAD_VERTICES: usize = 6;

/// A vertex with a 2D position and a 2D texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct Vertex {
    /// Position in the program's model-view space.
    pub position: [f32; 2],
    /// Texture coordinate.
    pub uv: [f32; 2],
}

impl Vertex {
    /// The size in bytes of one vertex.
    pub const STRIDE: usize = mem::size_of::<Vertex>();
    /// The byte offset of [`Vertex::position`].
    pub const POSITION_OFFSET: usize = 0;
    /// The byte offset of [`Vertex::uv`].
    pub const UV_OFFSET: usize = mem::size_of::<[f32; 2]>();

    /// Creates a vertex.
    pub const fn new(position: [f32; 2], uv: [f32; 2]) -> Self {
        Self { position, uv }
    }

    /// Builds the six vertices covering `bounds`, sampling the `uv` rectangle.
    pub fn quad(bounds: Rect, uv: Rect) -> [Vertex; QUAD_VERTICES] {
        let [x0, y0, w, h] = bounds.to_array();
        let (x1, y1) = (x0 + w, y0 + h);
        let [u0, v0, uw, vh] = uv.to_array();
        let (u1, v1) = (u0 + uw, v0 + vh);

        [
            Vertex::new([x0, y0], [u0, v0]),
            Vertex::new([x0, y1], [u0, v1]),
            Vertex::new([x1, y0], [u1, v0]),
            Vertex::new([x1, y1], [u1, v1]),
            Vertex::new([x0, y1], [u0, v1]),
            Vertex::new([x1, y0], [u1, v0]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_attribute_offsets() {
        assert_eq!(Vertex::STRIDE, 16);
        assert_eq!(Vertex::UV_OFFSET, 8);
        let v = Vertex::new([1.0, 2.0], [3.0, 4.0]);
        assert_eq!(bytemuck::cast::<Vertex, [f32; 4]>(v), [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_quad_spans_bounds() {
        let q = Vertex::quad(Rect::new(10.0, 20.0, 5.0, 5.0), Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(q[0].position, [10.0, 20.0]);
        assert_eq!(q[3].position, [15.0, 25.0]);
        assert_eq!(q[3].uv, [1.0, 1.0]);
    }
}
