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

//! The command queue: records a frame, merges its batches, replays them.
//!
//! A frame goes through three calls:
//!
//! 1. [`begin_frame`](CommandQueue::begin_frame) resets the real GPU state and
//!    opens an empty batch on program 0.
//! 2. Recording calls (`use_program`, `draw`, `bind_texture`, the uniform
//!    setters, `clear`, ...) only touch the caches and the batch list.
//!    Nothing reaches the GPU, except for resource creation.
//! 3. [`execute`](CommandQueue::execute) uploads the vertex stream once and
//!    replays the batch chain; [`end_frame`](CommandQueue::end_frame) recycles
//!    everything and deletes the resources released during the frame.

mod execute;
mod record;
mod resources;

use crate::attachment::AttachmentState;
use crate::batch::{BatchId, BatchKind, BatchList};
use crate::settings::QueueSettings;
use crate::stats::FrameStats;
use crate::uniform::UniformState;
use crate::vertex_buffer::VertexStreamBuffer;
use quill_core::renderer::{
    FramebufferId, GlDevice, PixelRect, ProgramId, ResourceError, TextureId, TextureSlot,
    TextureTarget,
};

/// Records, batches and replays the GPU work of a frame.
///
/// The queue exclusively owns its batch list, attachment and uniform caches
/// and vertex stream, and talks to the GPU only through its [`GlDevice`].
#[derive(Debug)]
pub struct CommandQueue {
    device: Box<dyn GlDevice>,
    settings: QueueSettings,
    max_texture_size: u32,

    batches: BatchList,
    /// The open batch. Always the tail of the chain while recording.
    current: Option<BatchId>,
    /// The program of the last `use_program`.
    program: ProgramId,
    viewport: Option<PixelRect>,
    clip: Option<PixelRect>,
    /// Sequence number of the newest batch no draw may be moved across.
    last_barrier: Option<u64>,

    attachments: AttachmentState,
    saved_attachments: Vec<AttachmentState>,
    uniforms: UniformState,
    vertices: VertexStreamBuffer,

    autorelease_textures: Vec<TextureId>,
    autorelease_framebuffers: Vec<FramebufferId>,

    in_frame: bool,
    stats: FrameStats,
    last_frame_stats: FrameStats,
}

impl CommandQueue {
    /// Creates a queue drawing through `device`.
    ///
    /// Out-of-range settings are clamped. The maximum texture size is queried
    /// once here and the shadow vertex buffers are created up front.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the shadow buffers cannot be created.
    pub fn new(
        mut device: Box<dyn GlDevice>,
        settings: QueueSettings,
    ) -> Result<Self, ResourceError> {
        let settings = settings.sanitized();
        let max_texture_size = device.max_texture_size();
        let vertices = VertexStreamBuffer::new(
            device.as_mut(),
            settings.shadow_buffers,
            settings.reserved_vertices,
        )?;

        log::info!(
            "CommandQueue: created ({} shadow buffers, max texture size {}, {})",
            settings.shadow_buffers,
            max_texture_size,
            if device.is_gles() { "GLES" } else { "desktop GL" }
        );

        Ok(Self {
            device,
            settings,
            max_texture_size,
            batches: BatchList::new(),
            current: None,
            program: ProgramId::NONE,
            viewport: None,
            clip: None,
            last_barrier: None,
            attachments: AttachmentState::new(),
            saved_attachments: Vec::new(),
            uniforms: UniformState::new(),
            vertices,
            autorelease_textures: Vec::new(),
            autorelease_framebuffers: Vec::new(),
            in_frame: false,
            stats: FrameStats::default(),
            last_frame_stats: FrameStats::default(),
        })
    }

    /// Starts recording a frame.
    ///
    /// # Panics
    ///
    /// Panics if a frame is already being recorded.
    pub fn begin_frame(&mut self) {
        assert!(
            !self.in_frame,
            "CommandQueue: begin_frame called twice without end_frame"
        );
        self.in_frame = true;

        self.device.bind_framebuffer(FramebufferId::DEFAULT);
        for slot in TextureSlot::all() {
            self.device
                .bind_texture(slot, TextureTarget::Texture2D, TextureId::NONE);
        }
        self.device.bind_vertex_array(None);
        self.device.use_program(ProgramId::NONE);

        self.attachments = AttachmentState::new();
        self.program = ProgramId::NONE;
        self.viewport = None;
        self.clip = None;
        self.last_barrier = None;
        self.stats = FrameStats::default();

        self.open_batch(BatchKind::Draw);
        log::trace!("CommandQueue: frame started");
    }

    /// Recycles every batch, compacts the uniform cache and deletes the
    /// resources autoreleased during the frame.
    ///
    /// # Panics
    ///
    /// Panics if no frame is being recorded, or if an attachment save was
    /// never restored.
    pub fn end_frame(&mut self) {
        assert!(self.in_frame, "CommandQueue: end_frame without begin_frame");
        assert!(
            self.saved_attachments.is_empty(),
            "CommandQueue: end_frame with unrestored attachment saves"
        );

        self.batches.clear();
        self.current = None;
        self.uniforms.end_frame();
        self.vertices.discard();
        self.release_autoreleased();

        self.in_frame = false;
        log::trace!("CommandQueue: frame ended");
    }

    fn release_autoreleased(&mut self) {
        if !self.autorelease_textures.is_empty() {
            self.device.delete_textures(&self.autorelease_textures);
            self.autorelease_textures.clear();
        }
        if !self.autorelease_framebuffers.is_empty() {
            self.device
                .delete_framebuffers(&self.autorelease_framebuffers);
            self.autorelease_framebuffers.clear();
        }
    }

    /// Returns `true` between `begin_frame` and `end_frame`.
    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// The device the queue draws through.
    pub fn device(&self) -> &dyn GlDevice {
        self.device.as_ref()
    }

    /// The device the queue draws through, mutably.
    ///
    /// Calls made through it bypass the caches.
    pub fn device_mut(&mut self) -> &mut dyn GlDevice {
        self.device.as_mut()
    }

    /// The settings in effect, after clamping.
    pub fn settings(&self) -> &QueueSettings {
        &self.settings
    }

    /// The largest texture dimension the device supports.
    pub fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }

    /// The recorded batches.
    pub fn batches(&self) -> &BatchList {
        &self.batches
    }

    /// The attachment cache.
    pub fn attachments(&self) -> &AttachmentState {
        &self.attachments
    }

    /// The uniform cache.
    pub fn uniforms(&self) -> &UniformState {
        &self.uniforms
    }

    /// The vertex stream.
    pub fn vertices(&self) -> &VertexStreamBuffer {
        &self.vertices
    }

    /// The program of the last `use_program`.
    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Statistics of the last executed frame.
    pub fn last_frame_stats(&self) -> FrameStats {
        self.last_frame_stats
    }
}

impl Drop for CommandQueue {
    fn drop(&mut self) {
        self.release_autoreleased();
        self.vertices.destroy(self.device.as_mut());
    }
}
