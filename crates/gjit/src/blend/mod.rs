//! Color blending.
//!
//! The factor and equation functions are compiled once per device into the
//! blend library. A [`BlendState`] compiles a single `blend` entry point that
//! chains calls into that library for one attachment configuration.

#[cfg(test)]
mod tests;

pub(crate) mod library;
mod state;

pub use state::{BlendFn, BlendState};

use crate::types::{BlendFactor, BlendOp, ColorMask, LogicOp};

/// Blend configuration of one color attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendAttachment {
    pub enable: bool,
    pub rgb_src: BlendFactor,
    pub rgb_dst: BlendFactor,
    pub rgb_op: BlendOp,
    pub alpha_src: BlendFactor,
    pub alpha_dst: BlendFactor,
    pub alpha_op: BlendOp,
    pub color_mask: ColorMask,
}

impl Default for BlendAttachment {
    fn default() -> Self {
        Self {
            enable: false,
            rgb_src: BlendFactor::One,
            rgb_dst: BlendFactor::Zero,
            rgb_op: BlendOp::Add,
            alpha_src: BlendFactor::One,
            alpha_dst: BlendFactor::Zero,
            alpha_op: BlendOp::Add,
            color_mask: ColorMask::ALL,
        }
    }
}

impl BlendAttachment {
    /// Enabled attachment with the same factors and equation for RGB and alpha.
    pub fn enabled(src: BlendFactor, dst: BlendFactor, op: BlendOp) -> Self {
        Self {
            enable: true,
            rgb_src: src,
            rgb_dst: dst,
            rgb_op: op,
            alpha_src: src,
            alpha_dst: dst,
            alpha_op: op,
            color_mask: ColorMask::ALL,
        }
    }

    pub fn with_alpha(mut self, src: BlendFactor, dst: BlendFactor, op: BlendOp) -> Self {
        self.alpha_src = src;
        self.alpha_dst = dst;
        self.alpha_op = op;
        self
    }

    pub fn with_color_mask(mut self, mask: ColorMask) -> Self {
        self.color_mask = mask;
        self
    }

    fn factors(&self) -> [BlendFactor; 4] {
        [self.rgb_src, self.rgb_dst, self.alpha_src, self.alpha_dst]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlendStateCreateInfo {
    /// Recorded on the state. Logic ops are not compiled.
    pub logic_op: Option<LogicOp>,
    pub attachments: Vec<BlendAttachment>,
}

impl BlendStateCreateInfo {
    pub fn new(attachment: BlendAttachment) -> Self {
        Self {
            logic_op: None,
            attachments: vec![attachment],
        }
    }
}
