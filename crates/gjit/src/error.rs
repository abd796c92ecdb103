//! Error types for gjit.

use cranelift_module::ModuleError;
use thiserror::Error;

use crate::config::ConfigError;

/// Main error type for state compilation and device bootstrap.
#[derive(Debug, Error)]
pub enum GjitError {
    /// Executable memory could not be obtained for a compiled program.
    #[error("Out of memory: {0}")]
    OutOfMemory(String),

    /// The host target could not be configured.
    #[error("Target ISA error: {0}")]
    Isa(String),

    /// The backend rejected generated code.
    #[error("Codegen error: {0}")]
    Codegen(String),

    /// Declaration or linking failure inside a program module.
    #[error("Module error: {0}")]
    Module(String),

    /// Create-info that cannot be compiled.
    #[error("Invalid create info: {0}")]
    InvalidCreateInfo(String),

    /// Host-side access outside a buffer, image or bind range.
    #[error("Out of range: {0}")]
    OutOfRange(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<ModuleError> for GjitError {
    fn from(e: ModuleError) -> Self {
        match &e {
            ModuleError::Allocation { .. } => GjitError::OutOfMemory(e.to_string()),
            ModuleError::Compilation(_) => GjitError::Codegen(e.to_string()),
            _ => GjitError::Module(e.to_string()),
        }
    }
}

/// Result type alias for gjit operations.
pub type Result<T> = std::result::Result<T, GjitError>;
