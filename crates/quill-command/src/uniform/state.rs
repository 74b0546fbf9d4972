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

use super::format::{UniformFlags, UniformFormat};
use bytemuck::Pod;
use quill_core::math::{Mat4, Rgba, RoundedRect};
use quill_core::renderer::{ProgramId, TextureSlot, UniformLocation};

/// The exclusive upper bound of uniform locations the cache accepts.
pub const MAX_UNIFORM_LOCATIONS: usize = 1024;

/// The capacity in bytes of a freshly compacted value blob.
const INITIAL_DATA_SIZE: usize = 4096;

/// The cached state of one uniform location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformInfo {
    /// The format fixed by the first set.
    pub format: UniformFormat,
    /// The array length; 1 for non-array formats.
    pub array_count: u32,
    /// Flags accumulated since the last snapshot.
    pub flags: UniformFlags,
    /// Set when the value changed and no batch has captured it yet.
    pub changed: bool,
    /// Set until a value has been stored.
    pub initial: bool,
    /// Byte offset of the value in the blob.
    pub offset: u32,
}

impl UniformInfo {
    /// The size of the stored value in bytes.
    pub fn size(&self) -> usize {
        self.format.element_size() * self.array_count as usize
    }
}

/// A uniform upload captured into a batch.
///
/// The value itself stays in the cache's blob, which is only compacted at
/// the end of the frame, so the offset remains valid until replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformOp {
    /// Where to upload.
    pub location: UniformLocation,
    /// How to interpret and upload the stored bytes.
    pub format: UniformFormat,
    /// Flags at capture time.
    pub flags: UniformFlags,
    /// Byte offset of the value in the blob.
    pub offset: u32,
    /// The array length.
    pub array_count: u32,
}

impl UniformOp {
    /// Captures the current value of `info`.
    pub fn new(info: &UniformInfo, location: UniformLocation) -> Self {
        Self {
            location,
            format: info.format,
            flags: info.flags,
            offset: info.offset,
            array_count: info.array_count,
        }
    }
}

#[derive(Debug, Default)]
struct ProgramUniforms {
    infos: Vec<Option<UniformInfo>>,
    n_changed: u32,
}

/// Last-set uniform values of every program, with change tracking.
///
/// Values live in one shared blob. A changed value is written to fresh
/// space rather than in place, so offsets captured by earlier batches keep
/// pointing at the value they saw. [`end_frame`](Self::end_frame) compacts
/// the blob down to the live values.
#[derive(Debug)]
pub struct UniformState {
    programs: Vec<Option<ProgramUniforms>>,
    data: Vec<u32>,
}

/// Reserves `size` bytes at the end of `data`, 8-byte aligned for anything
/// wider than a scalar, and returns the byte offset.
fn alloc(data: &mut Vec<u32>, size: usize) -> u32 {
    let align = if size > 4 { 8 } else { 4 };
    let start = (data.len() * 4 + align - 1) & !(align - 1);
    data.resize((start + size) / 4, 0);
    start as u32
}

fn bitwise_equal<T: Pod>(a: &[T], b: &[T]) -> bool {
    bytemuck::cast_slice::<T, u32>(a) == bytemuck::cast_slice::<T, u32>(b)
}

impl UniformState {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            programs: Vec::new(),
            data: Vec::with_capacity(INITIAL_DATA_SIZE / 4),
        }
    }

    /// Returns the stored info of a location after checking it against the
    /// requested format, or `None` if nothing was stored there yet.
    ///
    /// # Panics
    ///
    /// Panics if the location already holds a different format or array
    /// length, or lies outside [`MAX_UNIFORM_LOCATIONS`].
    fn existing(
        &self,
        program: ProgramId,
        location: UniformLocation,
        format: UniformFormat,
        array_count: u32,
    ) -> Option<UniformInfo> {
        assert!(
            !program.is_none(),
            "uniforms cannot be set on program 0"
        );
        assert!(
            location.index() < MAX_UNIFORM_LOCATIONS,
            "uniform location {} of program {} is out of range",
            location.0,
            program.0
        );

        let info = self
            .programs
            .get(program.index())?
            .as_ref()?
            .infos
            .get(location.index())?
            .as_ref()?;

        assert!(
            info.format == format,
            "uniform {} of program {} holds {:?} and cannot be set as {:?}",
            location.0,
            program.0,
            info.format,
            format
        );
        assert!(
            info.array_count == array_count,
            "uniform {} of program {} is an array of {} and cannot be set with {} elements",
            location.0,
            program.0,
            info.array_count,
            array_count
        );
        Some(*info)
    }

    fn current<T: Pod>(&self, info: &UniformInfo) -> &[T] {
        let start = info.offset as usize / 4;
        bytemuck::cast_slice(&self.data[start..start + info.size() / 4])
    }

    fn store(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        format: UniformFormat,
        array_count: u32,
        words: &[u32],
        flags: UniformFlags,
    ) {
        let offset = alloc(&mut self.data, words.len() * 4);
        let start = offset as usize / 4;
        self.data[start..start + words.len()].copy_from_slice(words);

        let index = program.index();
        if self.programs.len() <= index {
            self.programs.resize_with(index + 1, || None);
        }
        let entry = self.programs[index].get_or_insert_with(ProgramUniforms::default);

        let loc = location.index();
        if entry.infos.len() <= loc {
            entry.infos.resize(loc + 1, None);
        }
        let info = entry.infos[loc].get_or_insert(UniformInfo {
            format,
            array_count,
            flags: UniformFlags::NONE,
            changed: false,
            initial: true,
            offset,
        });

        info.offset = offset;
        info.initial = false;
        info.flags |= flags;
        if !info.changed {
            info.changed = true;
            entry.n_changed += 1;
        }
    }

    fn update<T: Pod>(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        format: UniformFormat,
        values: &[T],
        same: impl Fn(&[T], &[T]) -> bool,
    ) {
        let array_count = if format.is_array() {
            (std::mem::size_of_val(values) / format.element_size()) as u32
        } else {
            1
        };

        if let Some(info) = self.existing(program, location, format, array_count) {
            if same(self.current(&info), values) {
                return;
            }
        }
        self.store(
            program,
            location,
            format,
            array_count,
            bytemuck::cast_slice(values),
            UniformFlags::NONE,
        );
    }

    /// Sets a `float` uniform.
    pub fn set1f(&mut self, program: ProgramId, location: UniformLocation, v0: f32) {
        self.update(program, location, UniformFormat::Float1, &[v0], |a, b| a == b);
    }

    /// Sets a `vec2` uniform.
    pub fn set2f(&mut self, program: ProgramId, location: UniformLocation, v0: f32, v1: f32) {
        self.update(program, location, UniformFormat::Float2, &[v0, v1], |a, b| a == b);
    }

    /// Sets a `vec3` uniform.
    pub fn set3f(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        v0: f32,
        v1: f32,
        v2: f32,
    ) {
        self.update(program, location, UniformFormat::Float3, &[v0, v1, v2], |a, b| a == b);
    }

    /// Sets a `vec4` uniform.
    pub fn set4f(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        v0: f32,
        v1: f32,
        v2: f32,
        v3: f32,
    ) {
        self.update(
            program,
            location,
            UniformFormat::Float4,
            &[v0, v1, v2, v3],
            |a, b| a == b,
        );
    }

    /// Sets a `float[]` uniform.
    pub fn set1fv(&mut self, program: ProgramId, location: UniformLocation, values: &[f32]) {
        self.update(program, location, UniformFormat::Float1v, values, bitwise_equal::<f32>);
    }

    /// Sets a `vec2[]` uniform.
    pub fn set2fv(&mut self, program: ProgramId, location: UniformLocation, values: &[[f32; 2]]) {
        self.update(program, location, UniformFormat::Float2v, values, bitwise_equal::<[f32; 2]>);
    }

    /// Sets a `vec3[]` uniform.
    pub fn set3fv(&mut self, program: ProgramId, location: UniformLocation, values: &[[f32; 3]]) {
        self.update(program, location, UniformFormat::Float3v, values, bitwise_equal::<[f32; 3]>);
    }

    /// Sets a `vec4[]` uniform.
    pub fn set4fv(&mut self, program: ProgramId, location: UniformLocation, values: &[[f32; 4]]) {
        self.update(program, location, UniformFormat::Float4v, values, bitwise_equal::<[f32; 4]>);
    }

    /// Sets an `int` uniform.
    pub fn set1i(&mut self, program: ProgramId, location: UniformLocation, v0: i32) {
        self.update(program, location, UniformFormat::Int1, &[v0], |a, b| a == b);
    }

    /// Sets an `ivec2` uniform.
    pub fn set2i(&mut self, program: ProgramId, location: UniformLocation, v0: i32, v1: i32) {
        self.update(program, location, UniformFormat::Int2, &[v0, v1], |a, b| a == b);
    }

    /// Sets an `ivec3` uniform.
    pub fn set3i(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        v0: i32,
        v1: i32,
        v2: i32,
    ) {
        self.update(program, location, UniformFormat::Int3, &[v0, v1, v2], |a, b| a == b);
    }

    /// Sets an `ivec4` uniform.
    pub fn set4i(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        v0: i32,
        v1: i32,
        v2: i32,
        v3: i32,
    ) {
        self.update(
            program,
            location,
            UniformFormat::Int4,
            &[v0, v1, v2, v3],
            |a, b| a == b,
        );
    }

    /// Points a sampler uniform at texture unit `slot`.
    pub fn set_texture(&mut self, program: ProgramId, location: UniformLocation, slot: TextureSlot) {
        let unit = slot.index() as u32;
        self.update(program, location, UniformFormat::Texture, &[unit], |a, b| a == b);
    }

    /// Sets a `mat4` uniform.
    ///
    /// The new matrix is dropped when it is bitwise or approximately equal to
    /// the stored one.
    pub fn set_matrix(&mut self, program: ProgramId, location: UniformLocation, matrix: &Mat4) {
        self.update(
            program,
            location,
            UniformFormat::Matrix,
            std::slice::from_ref(matrix),
            |a, b| a[0].equal_fast(&b[0]) || a[0].approx_eq(&b[0]),
        );
    }

    /// Sets a rounded-rectangle uniform.
    ///
    /// Corners are only re-uploaded when they differ from the previous value,
    /// or from square corners on first use.
    pub fn set_rounded_rect(
        &mut self,
        program: ProgramId,
        location: UniformLocation,
        rounded_rect: &RoundedRect,
    ) {
        let previous = self
            .existing(program, location, UniformFormat::RoundedRect, 1)
            .map(|info| self.current::<RoundedRect>(&info)[0]);
        if previous.as_ref() == Some(rounded_rect) {
            return;
        }

        let flags = if previous.unwrap_or_default().corners_differ(rounded_rect) {
            UniformFlags::SEND_CORNERS
        } else {
            UniformFlags::NONE
        };
        self.store(
            program,
            location,
            UniformFormat::RoundedRect,
            1,
            bytemuck::cast_slice(std::slice::from_ref(rounded_rect)),
            flags,
        );
    }

    /// Sets a color uniform; `None` is transparent black.
    pub fn set_color(&mut self, program: ProgramId, location: UniformLocation, color: Option<&Rgba>) {
        let color = color.copied().unwrap_or(Rgba::TRANSPARENT);
        self.update(
            program,
            location,
            UniformFormat::Color,
            std::slice::from_ref(&color),
            |a, b| a == b,
        );
    }

    /// Hands every changed uniform of `program` to `capture`, in location
    /// order, then clears the change tracking of that program.
    pub fn snapshot(
        &mut self,
        program: ProgramId,
        mut capture: impl FnMut(&UniformInfo, UniformLocation),
    ) {
        let Some(Some(entry)) = self.programs.get_mut(program.index()) else {
            return;
        };
        if entry.n_changed == 0 {
            return;
        }

        for (location, slot) in entry.infos.iter_mut().enumerate() {
            if let Some(info) = slot.as_mut().filter(|info| info.changed) {
                capture(info, UniformLocation(location as u32));
                info.changed = false;
                info.flags.remove(UniformFlags::SEND_CORNERS);
            }
        }
        entry.n_changed = 0;
    }

    /// Forgets everything cached for `program`.
    pub fn clear_program(&mut self, program: ProgramId) {
        if let Some(entry) = self.programs.get_mut(program.index()) {
            *entry = None;
        }
    }

    /// Compacts the value blob down to the live values and rewrites offsets.
    pub fn end_frame(&mut self) {
        let mut data = Vec::with_capacity(INITIAL_DATA_SIZE / 4);

        for entry in self.programs.iter_mut().flatten() {
            for info in entry.infos.iter_mut().flatten() {
                let words = info.size() / 4;
                let start = info.offset as usize / 4;
                let offset = alloc(&mut data, info.size());
                let dst = offset as usize / 4;
                data[dst..dst + words].copy_from_slice(&self.data[start..start + words]);
                info.offset = offset;
            }
        }

        self.data = data;
    }

    /// The number of changed, not yet captured uniforms of `program`.
    pub fn dirty_count(&self, program: ProgramId) -> u32 {
        self.programs
            .get(program.index())
            .and_then(Option::as_ref)
            .map_or(0, |entry| entry.n_changed)
    }

    /// The cached state of one location, if it was ever set.
    pub fn info(&self, program: ProgramId, location: UniformLocation) -> Option<&UniformInfo> {
        self.programs
            .get(program.index())?
            .as_ref()?
            .infos
            .get(location.index())?
            .as_ref()
    }

    /// Reads `count` floats stored at byte `offset`.
    pub fn floats(&self, offset: u32, count: usize) -> &[f32] {
        let start = offset as usize / 4;
        bytemuck::cast_slice(&self.data[start..start + count])
    }

    /// Reads `count` integers stored at byte `offset`.
    pub fn ints(&self, offset: u32, count: usize) -> &[i32] {
        let start = offset as usize / 4;
        bytemuck::cast_slice(&self.data[start..start + count])
    }

    /// The size in bytes of the value blob, garbage included.
    pub fn data_size(&self) -> usize {
        self.data.len() * 4
    }
}

impl Default for UniformState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::math::{Rect, Size};

    const PROGRAM: ProgramId = ProgramId(3);
    const LOC: UniformLocation = UniformLocation(2);

    fn captured(state: &mut UniformState, program: ProgramId) -> Vec<(UniformLocation, UniformOp)> {
        let mut ops = Vec::new();
        state.snapshot(program, |info, location| {
            ops.push((location, UniformOp::new(info, location)))
        });
        ops
    }

    #[test]
    fn test_setting_current_value_is_not_a_change() {
        let mut state = UniformState::new();
        state.set1f(PROGRAM, LOC, 0.5);
        assert_eq!(state.dirty_count(PROGRAM), 1);
        state.set1f(PROGRAM, LOC, 0.5);
        assert_eq!(state.dirty_count(PROGRAM), 1);

        captured(&mut state, PROGRAM);
        assert_eq!(state.dirty_count(PROGRAM), 0);
        state.set1f(PROGRAM, LOC, 0.5);
        assert_eq!(state.dirty_count(PROGRAM), 0);
    }

    #[test]
    fn test_new_value_counts_once() {
        let mut state = UniformState::new();
        state.set4f(PROGRAM, LOC, 0.0, 0.0, 0.0, 0.0);
        captured(&mut state, PROGRAM);

        state.set4f(PROGRAM, LOC, 1e9, 0.0, 0.0, 0.0);
        state.set4f(PROGRAM, LOC, 1e-9, 0.0, 0.0, 0.0);
        assert_eq!(state.dirty_count(PROGRAM), 1);

        state.set1i(PROGRAM, UniformLocation(0), 4);
        assert_eq!(state.dirty_count(PROGRAM), 2);
    }

    #[test]
    fn test_first_set_always_counts() {
        let mut state = UniformState::new();
        state.set1i(PROGRAM, LOC, 0);
        assert_eq!(state.dirty_count(PROGRAM), 1);
        assert!(!state.info(PROGRAM, LOC).unwrap().initial);
    }

    #[test]
    #[should_panic(expected = "cannot be set as")]
    fn test_format_mismatch_panics() {
        let mut state = UniformState::new();
        state.set1f(PROGRAM, LOC, 1.0);
        state.set2f(PROGRAM, LOC, 1.0, 2.0);
    }

    #[test]
    #[should_panic(expected = "is an array of 2")]
    fn test_array_length_mismatch_panics() {
        let mut state = UniformState::new();
        state.set1fv(PROGRAM, LOC, &[1.0, 2.0]);
        state.set1fv(PROGRAM, LOC, &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_snapshot_visits_changed_locations_in_order() {
        let mut state = UniformState::new();
        state.set1f(PROGRAM, UniformLocation(5), 1.0);
        state.set_texture(PROGRAM, UniformLocation(1), TextureSlot::new(3));
        state.set1f(ProgramId(4), UniformLocation(0), 9.0);

        let ops = captured(&mut state, PROGRAM);
        let locations: Vec<_> = ops.iter().map(|(loc, _)| loc.0).collect();
        assert_eq!(locations, vec![1, 5]);
        assert_eq!(ops[0].1.format, UniformFormat::Texture);
        assert_eq!(state.ints(ops[0].1.offset, 1), &[3]);

        assert!(captured(&mut state, PROGRAM).is_empty());
        assert_eq!(state.dirty_count(ProgramId(4)), 1);
    }

    #[test]
    fn test_captured_offsets_survive_later_sets() {
        let mut state = UniformState::new();
        state.set2f(PROGRAM, LOC, 1.0, 2.0);
        let first = captured(&mut state, PROGRAM)[0].1;
        state.set2f(PROGRAM, LOC, 3.0, 4.0);
        let second = captured(&mut state, PROGRAM)[0].1;

        assert_ne!(first.offset, second.offset);
        assert_eq!(state.floats(first.offset, 2), &[1.0, 2.0]);
        assert_eq!(state.floats(second.offset, 2), &[3.0, 4.0]);
        assert_eq!(second.offset % 8, 0);
    }

    #[test]
    fn test_matrix_skips_approximately_equal_values() {
        let mut state = UniformState::new();
        state.set_matrix(PROGRAM, LOC, &Mat4::from_translation(1.0, 0.0, 0.0));
        captured(&mut state, PROGRAM);

        state.set_matrix(PROGRAM, LOC, &Mat4::from_translation(1.0 + 1e-7, 0.0, 0.0));
        assert_eq!(state.dirty_count(PROGRAM), 0);
        state.set_matrix(PROGRAM, LOC, &Mat4::from_translation(2.0, 0.0, 0.0));
        assert_eq!(state.dirty_count(PROGRAM), 1);
    }

    #[test]
    fn test_rounded_rect_send_corners() {
        let mut state = UniformState::new();
        let square = RoundedRect::from_rect(Rect::new(0.0, 0.0, 10.0, 10.0));
        state.set_rounded_rect(PROGRAM, LOC, &square);
        let op = captured(&mut state, PROGRAM)[0].1;
        assert!(!op.flags.contains(UniformFlags::SEND_CORNERS));

        let round = RoundedRect::uniform(Rect::new(0.0, 0.0, 10.0, 10.0), 4.0);
        state.set_rounded_rect(PROGRAM, LOC, &round);
        let op = captured(&mut state, PROGRAM)[0].1;
        assert!(op.flags.contains(UniformFlags::SEND_CORNERS));
        assert_eq!(&state.floats(op.offset, 12)[4..6], &[4.0, 4.0]);

        let mut moved = round;
        moved.bounds = Rect::new(5.0, 5.0, 10.0, 10.0);
        state.set_rounded_rect(PROGRAM, LOC, &moved);
        let op = captured(&mut state, PROGRAM)[0].1;
        assert!(!op.flags.contains(UniformFlags::SEND_CORNERS));

        let mut reshaped = moved;
        reshaped.corners[0] = Size::new(1.0, 1.0);
        state.set_rounded_rect(PROGRAM, LOC, &reshaped);
        state.set_rounded_rect(PROGRAM, LOC, &moved);
        let op = captured(&mut state, PROGRAM)[0].1;
        assert!(op.flags.contains(UniformFlags::SEND_CORNERS));
    }

    #[test]
    fn test_missing_color_is_transparent() {
        let mut state = UniformState::new();
        state.set_color(PROGRAM, LOC, Some(&Rgba::RED));
        state.set_color(PROGRAM, LOC, None);
        let op = captured(&mut state, PROGRAM)[0].1;
        assert_eq!(state.floats(op.offset, 4), &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_end_frame_compacts_and_keeps_values() {
        let mut state = UniformState::new();
        for i in 0..100 {
            state.set1f(PROGRAM, LOC, i as f32);
        }
        state.set2f(PROGRAM, UniformLocation(0), 7.0, 8.0);
        assert!(state.data_size() >= 400);

        state.end_frame();
        assert_eq!(state.data_size(), 12);

        let value = state.info(PROGRAM, LOC).copied().unwrap();
        assert_eq!(state.floats(value.offset, 1), &[99.0]);
        let pair = state.info(PROGRAM, UniformLocation(0)).copied().unwrap();
        assert_eq!(state.floats(pair.offset, 2), &[7.0, 8.0]);
        assert_eq!(state.dirty_count(PROGRAM), 2);
    }

    #[test]
    fn test_clear_program_forgets_state() {
        let mut state = UniformState::new();
        state.set1f(PROGRAM, LOC, 1.0);
        state.clear_program(PROGRAM);
        assert_eq!(state.dirty_count(PROGRAM), 0);
        assert!(state.info(PROGRAM, LOC).is_none());

        state.set2f(PROGRAM, LOC, 1.0, 2.0);
        assert_eq!(state.dirty_count(PROGRAM), 1);
    }
}
