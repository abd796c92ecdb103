//! Per-context device state: the library plus the currently bound states.


use std::sync::Arc;

use tracing::{debug, trace};

use crate::blend::{BlendState, BlendStateCreateInfo};
use crate::config::CodegenConfig;
use crate::error::{GjitError, Result};
use crate::image::{ImageView, ImageViewCreateInfo};
use crate::input_layout::{InputLayout, InputLayoutCreateInfo};
use crate::jit::ir::DEFAULT_COLOR;
use crate::library::Library;
use crate::sampler::{Sampler, SamplerCreateInfo};
use crate::types::{Buffer, VertexBuffer, MAX_TEXTURE_IMAGE_UNITS, MAX_VERTEX_BUFFERS};

/// A vertex buffer slot as bound by the application.
#[derive(Debug, Clone, Default)]
pub struct VertexBufferBinding {
    pub buffer: Option<Arc<Buffer>>,
    pub stride: u32,
    pub offset: u32,
}

impl VertexBufferBinding {
    pub fn new(buffer: Arc<Buffer>, stride: u32, offset: u32) -> Self {
        Self {
            buffer: Some(buffer),
            stride,
            offset,
        }
    }
}

/// Owns the library and every bind slot a draw reads.
///
/// Binding is a slot assignment; nothing is compiled after the state
/// objects are created.
pub struct Device {
    library: Library,
    blend_state: Option<Arc<BlendState>>,
    blend_color: [f32; 4],
    input_layout: Option<Arc<InputLayout>>,
    vertex_buffers: Vec<VertexBufferBinding>,
    vertex_slots: [VertexBuffer; MAX_VERTEX_BUFFERS],
    image_views: Vec<Option<Arc<ImageView>>>,
    samplers: Vec<Option<Arc<Sampler>>>,
}

impl Device {
    /// Bootstraps the backend and compiles the libraries.
    pub fn new(config: &CodegenConfig) -> Result<Self> {
        Ok(Self::with_library(Library::new(config)?))
    }

    pub fn with_library(library: Library) -> Self {
        Self {
            library,
            blend_state: None,
            blend_color: [0.0; 4],
            input_layout: None,
            vertex_buffers: vec![VertexBufferBinding::default(); MAX_VERTEX_BUFFERS],
            vertex_slots: [VertexBuffer::UNBOUND; MAX_VERTEX_BUFFERS],
            image_views: vec![None; MAX_TEXTURE_IMAGE_UNITS],
            samplers: vec![None; MAX_TEXTURE_IMAGE_UNITS],
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn create_blend_state(&self, info: &BlendStateCreateInfo) -> Result<Arc<BlendState>> {
        BlendState::new(&self.library, info).map(Arc::new)
    }

    pub fn create_input_layout(&self, info: &InputLayoutCreateInfo) -> Result<Arc<InputLayout>> {
        InputLayout::new(&self.library, info).map(Arc::new)
    }

    pub fn create_image_view(&self, info: &ImageViewCreateInfo) -> Result<Arc<ImageView>> {
        ImageView::new(&self.library, info).map(Arc::new)
    }

    pub fn create_sampler(&self, info: &SamplerCreateInfo) -> Result<Arc<Sampler>> {
        Sampler::new(&self.library, info).map(Arc::new)
    }

    pub fn bind_blend_state(&mut self, state: Option<Arc<BlendState>>) {
        trace!(event = "bind_blend_state", bound = state.is_some());
        self.blend_state = state;
    }

    pub fn set_blend_color(&mut self, color: [f32; 4]) {
        self.blend_color = color;
    }

    pub fn blend_color(&self) -> [f32; 4] {
        self.blend_color
    }

    pub fn bind_input_layout(&mut self, layout: Option<Arc<InputLayout>>) {
        trace!(event = "bind_input_layout", bound = layout.is_some());
        self.input_layout = layout;
    }

    /// Binds `bindings` to the slots starting at `first`.
    pub fn set_vertex_buffers(&mut self, first: usize, bindings: &[VertexBufferBinding]) -> Result<()> {
        check_range("vertex buffer", first, bindings.len(), MAX_VERTEX_BUFFERS)?;
        for (i, binding) in bindings.iter().enumerate() {
            let slot = first + i;
            self.vertex_slots[slot] = match &binding.buffer {
                Some(buffer) => VertexBuffer::new(buffer, binding.stride, binding.offset),
                None => VertexBuffer::UNBOUND,
            };
            self.vertex_buffers[slot] = binding.clone();
        }
        debug!(event = "set_vertex_buffers", first = first, count = bindings.len());
        Ok(())
    }

    pub fn bind_image_views(&mut self, first: usize, views: &[Option<Arc<ImageView>>]) -> Result<()> {
        check_range("texture unit", first, views.len(), MAX_TEXTURE_IMAGE_UNITS)?;
        self.image_views[first..first + views.len()].clone_from_slice(views);
        Ok(())
    }

    pub fn bind_samplers(&mut self, first: usize, samplers: &[Option<Arc<Sampler>>]) -> Result<()> {
        check_range("texture unit", first, samplers.len(), MAX_TEXTURE_IMAGE_UNITS)?;
        self.samplers[first..first + samplers.len()].clone_from_slice(samplers);
        Ok(())
    }

    /// Blends `src` over `dst` into `res` with the bound state and blend
    /// color. Without a bound state `src` is copied through.
    pub fn blend(&self, res: &mut [f32; 4], src: &[f32; 4], dst: &[f32; 4]) {
        match &self.blend_state {
            Some(state) => state.blend(res, src, dst, &self.blend_color),
            None => *res = *src,
        }
    }

    /// Fetches every attribute of vertex `index`, instance `instance`, from
    /// the bound vertex buffers.
    ///
    /// Returns `false` without writing when no input layout is bound or a
    /// binding it reads is empty.
    ///
    /// # Safety
    ///
    /// Each bound buffer must hold the elements the layout addresses for
    /// this `index` and `instance`.
    ///
    /// # Panics
    ///
    /// If `vert` has fewer than four floats per attribute.
    pub unsafe fn fetch_vertex(&self, vert: &mut [f32], index: u32, instance: u32) -> bool {
        let Some(layout) = &self.input_layout else {
            return false;
        };
        let mask = layout.bindings_mask();
        let missing = (0..MAX_VERTEX_BUFFERS)
            .filter(|&slot| mask & (1 << slot) != 0)
            .any(|slot| self.vertex_buffers[slot].buffer.is_none());
        if missing {
            return false;
        }
        layout.fetch(vert, &self.vertex_slots, index, instance);
        true
    }

    /// Samples texture unit `unit` at normalized `coord`.
    ///
    /// A unit missing either its image view or its sampler yields
    /// `(0, 0, 0, 1)`.
    pub fn sample(&self, unit: usize, coord: [f32; 3]) -> Result<[f32; 4]> {
        check_range("texture unit", unit, 1, MAX_TEXTURE_IMAGE_UNITS)?;
        match (&self.image_views[unit], &self.samplers[unit]) {
            (Some(view), Some(sampler)) => Ok(sampler.sample(view, coord)),
            _ => Ok(DEFAULT_COLOR),
        }
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("library", &self.library)
            .field("blend_state", &self.blend_state.is_some())
            .field("input_layout", &self.input_layout.is_some())
            .field(
                "vertex_buffers",
                &self.vertex_buffers.iter().filter(|b| b.buffer.is_some()).count(),
            )
            .field(
                "image_views",
                &self.image_views.iter().filter(|v| v.is_some()).count(),
            )
            .finish()
    }
}

fn check_range(what: &str, first: usize, count: usize, limit: usize) -> Result<()> {
    match first.checked_add(count) {
        Some(end) if end <= limit => Ok(()),
        _ => Err(GjitError::OutOfRange(format!(
            "{what} range {first}+{count} exceeds {limit} slots"
        ))),
    }
}
