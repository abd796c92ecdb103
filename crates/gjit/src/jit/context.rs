//! Backend bootstrap shared by every program a device compiles.

use cranelift_codegen::ir::Type;
use cranelift_codegen::isa::OwnedTargetIsa;
use cranelift_codegen::settings::{self, Configurable};
use cranelift_jit::{JITBuilder, JITModule};
use tracing::info;

use crate::config::CodegenConfig;
use crate::error::{GjitError, Result};

/// Target description and codegen flags, built once per device.
///
/// Every program module is created from the same owned ISA, so the
/// configuration is parsed once and shared by value afterwards.
pub struct JitContext {
    isa: OwnedTargetIsa,
    config: CodegenConfig,
}

impl JitContext {
    /// Configures the native target from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GjitError::Isa`] when the host is unsupported or a flag in
    /// `config.isa_flags` is unknown to the backend.
    pub fn new(config: &CodegenConfig) -> Result<Self> {
        let mut flag_builder = settings::builder();
        set_flag(&mut flag_builder, "use_colocated_libcalls", "false")?;
        set_flag(&mut flag_builder, "is_pic", "false")?;
        set_flag(&mut flag_builder, "opt_level", config.opt_level.as_setting())?;
        set_flag(&mut flag_builder, "enable_verifier", bool_str(config.enable_verifier))?;
        set_flag(
            &mut flag_builder,
            "enable_nan_canonicalization",
            bool_str(!config.fast_math),
        )?;

        let mut isa_builder =
            cranelift_native::builder().map_err(|e| GjitError::Isa(e.to_string()))?;
        for flag in &config.isa_flags {
            isa_builder
                .enable(flag)
                .map_err(|e| GjitError::Isa(format!("{flag}: {e}")))?;
        }
        let isa = isa_builder
            .finish(settings::Flags::new(flag_builder))
            .map_err(|e| GjitError::Isa(e.to_string()))?;

        info!(
            event = "jit_bootstrap",
            isa = isa.name(),
            opt_level = config.opt_level.as_setting(),
            fast_math = config.fast_math,
            isa_flags = config.isa_flags.len(),
        );

        Ok(Self {
            isa,
            config: config.clone(),
        })
    }

    pub fn pointer_type(&self) -> Type {
        self.isa.pointer_type()
    }

    pub fn config(&self) -> &CodegenConfig {
        &self.config
    }

    /// Name of the configured target ISA.
    pub fn isa_name(&self) -> &'static str {
        self.isa.name()
    }

    /// Creates an empty module that resolves `symbols` as imports.
    pub(crate) fn new_module<'s>(
        &self,
        symbols: impl IntoIterator<Item = (&'s str, *const u8)>,
    ) -> JITModule {
        let mut builder =
            JITBuilder::with_isa(self.isa.clone(), cranelift_module::default_libcall_names());
        builder.symbols(symbols);
        JITModule::new(builder)
    }
}

impl std::fmt::Debug for JitContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JitContext")
            .field("isa", &self.isa.name())
            .field("config", &self.config)
            .finish()
    }
}

fn set_flag(builder: &mut settings::Builder, name: &str, value: &str) -> Result<()> {
    builder
        .set(name, value)
        .map_err(|e| GjitError::Isa(format!("{name}={value}: {e}")))
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
