//! Runtime code generation via Cranelift.
//!
//! A device bootstraps one [`JitContext`] (target ISA plus codegen flags).
//! Every compiled configuration becomes a `Program`: a module of its own
//! whose exported entry point is handed to the rasterizer as a raw function
//! pointer. Shared helper libraries are programs too; other programs import
//! their exports by symbol, so library code is referenced and never copied.
//!
//! # Entry Point Signatures
//!
//! All entry points use the target's C calling convention.
//!
//! - **Blend**: `fn(res: *mut f32, src: *const f32, dst: *const f32, constant: *const f32)`
//! - **Input layout**: `fn(vert: *mut f32, buffers: *const VertexBuffer, index: u32, instance: u32)`
//! - **Image view**: `fn(color: *mut f32, coords: *const i32)`
//! - **Sample**: `fn(color: *mut f32, coords: *const f32, size: *const i32, image_view: ImageViewFn)`
//!
//! Compiled code performs no bounds checks. Output arrays are caller-allocated.

#[cfg(test)]
mod tests;

mod context;
pub(crate) mod ir;
mod program;

pub use context::JitContext;
pub(crate) use program::{Program, ProgramBuilder};
