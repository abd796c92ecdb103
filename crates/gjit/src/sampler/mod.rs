//! Texture sampling.
//!
//! Wrap modes, the filter-coordinate split, interpolation and the separable
//! per-axis fetches live in the sampler library. A [`Sampler`] compiles one
//! `sample` entry point that wraps the texel coordinates of every tap and
//! hands them to the library fetch for its filter. The image is read
//! through an [`ImageViewFn`](crate::image::ImageViewFn) passed at call
//! time, so one sampler serves every bound view.

#[cfg(test)]
mod tests;

pub(crate) mod library;
mod state;

pub use state::{SampleFn, Sampler};

use crate::types::{CompareOp, Filter, WrapMode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerCreateInfo {
    /// Wrap mode for x, y and z.
    pub wrap: [WrapMode; 3],
    /// Selects the filter for the whole sample.
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub mip_filter: Filter,
    pub compare_enable: bool,
    pub compare_op: CompareOp,
    pub lod_bias: f32,
    pub min_lod: f32,
    pub max_lod: f32,
    pub max_anisotropy: f32,
    pub border_color: [f32; 4],
}

impl Default for SamplerCreateInfo {
    fn default() -> Self {
        Self {
            wrap: [WrapMode::Repeat; 3],
            mag_filter: Filter::Nearest,
            min_filter: Filter::Nearest,
            mip_filter: Filter::None,
            compare_enable: false,
            compare_op: CompareOp::Never,
            lod_bias: 0.0,
            min_lod: 0.0,
            max_lod: 1000.0,
            max_anisotropy: 1.0,
            border_color: [0.0, 0.0, 0.0, 0.0],
        }
    }
}

impl SamplerCreateInfo {
    pub fn new(filter: Filter, wrap: WrapMode) -> Self {
        Self {
            wrap: [wrap; 3],
            mag_filter: filter,
            min_filter: filter,
            ..Self::default()
        }
    }

    pub fn with_border_color(mut self, color: [f32; 4]) -> Self {
        self.border_color = color;
        self
    }

    pub fn with_wrap(mut self, wrap: [WrapMode; 3]) -> Self {
        self.wrap = wrap;
        self
    }
}
