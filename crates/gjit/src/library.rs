//! Per-device precompiled function libraries.

use std::sync::Arc;

use tracing::info;

use crate::config::CodegenConfig;
use crate::error::Result;
use crate::jit::{JitContext, Program};
use crate::{blend, sampler};

/// Backend context plus the blend and sampler libraries.
///
/// Built once when a device opens and passed by reference to every state
/// constructor. The libraries are immutable after construction; compiled
/// states keep an `Arc` to the one they call into.
#[derive(Debug)]
pub struct Library {
    jit: JitContext,
    blend: Arc<Program>,
    sampler: Arc<Program>,
}

impl Library {
    /// Configures the backend and compiles both libraries.
    ///
    /// # Errors
    ///
    /// Any failure here is fatal to device creation.
    pub fn new(config: &CodegenConfig) -> Result<Self> {
        let jit = JitContext::new(config)?;
        let blend = Arc::new(blend::library::build(&jit)?);
        let sampler = Arc::new(sampler::library::build(&jit)?);

        info!(
            event = "library_ready",
            isa = jit.isa_name(),
            blend_functions = blend.export_count(),
            sampler_functions = sampler.export_count(),
        );

        Ok(Self {
            jit,
            blend,
            sampler,
        })
    }

    pub fn jit(&self) -> &JitContext {
        &self.jit
    }

    pub(crate) fn blend(&self) -> &Arc<Program> {
        &self.blend
    }

    pub(crate) fn sampler(&self) -> &Arc<Program> {
        &self.sampler
    }
}
