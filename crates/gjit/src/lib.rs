//! gjit - Runtime-compiled fixed-function stages for a software rasterizer
//!
//! Each pipeline state is compiled to native code when it is created and
//! then called directly per pixel or vertex:
//! - Blend states chain precompiled factor and equation functions
//! - Input layouts decode vertex attributes from bound buffers
//! - Image views fetch and swizzle texels at integer coordinates
//! - Samplers wrap and filter (nearest, linear, cubic) through an image view
//!
//! A [`Device`] owns the shared [`Library`] and the bind slots a draw reads.
//!
//! ```no_run
//! use gjit::{BlendAttachment, BlendFactor, BlendOp, BlendStateCreateInfo, CodegenConfig, Device};
//!
//! let mut device = Device::new(&CodegenConfig::default())?;
//! let state = device.create_blend_state(&BlendStateCreateInfo::new(
//!     BlendAttachment::enabled(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha, BlendOp::Add),
//! ))?;
//! device.bind_blend_state(Some(state));
//!
//! let mut res = [0.0; 4];
//! device.blend(&mut res, &[1.0, 0.0, 0.0, 0.5], &[0.0, 0.0, 1.0, 1.0]);
//! # Ok::<(), gjit::GjitError>(())
//! ```

pub mod blend;
pub mod config;
pub mod device;
pub mod error;
pub mod format;
pub mod image;
pub mod input_layout;
pub mod jit;
pub mod library;
pub mod sampler;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use blend::{BlendAttachment, BlendFn, BlendState, BlendStateCreateInfo};
pub use config::{CodegenConfig, ConfigError, OptLevel};
pub use device::{Device, VertexBufferBinding};
pub use error::{GjitError, Result};
pub use format::{Encoding, Format};
pub use image::{Image, ImageCreateInfo, ImageView, ImageViewCreateInfo, ImageViewFn};
pub use input_layout::{InputLayout, InputLayoutCreateInfo, InputLayoutFn, VertexAttrib};
pub use jit::JitContext;
pub use library::Library;
pub use sampler::{SampleFn, Sampler, SamplerCreateInfo};
pub use types::{
    BlendFactor, BlendOp, Buffer, ColorMask, CompareOp, Extent, Filter, ImageType, LogicOp,
    Swizzle, VertexBuffer, WrapMode, MAX_ATTACHMENTS, MAX_ATTRIBS, MAX_TEXTURE_IMAGE_UNITS,
    MAX_VERTEX_BUFFERS,
};
