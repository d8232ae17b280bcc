//! Error types for ec2-serial-console.
//!
//! Module code reports [`ModuleError`](crate::modules::ModuleError); this type is
//! what the tool surfaces to its caller, tagged with the module that failed and
//! mapped onto a process exit code.

use crate::modules::ModuleError;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for arguments rejected before any remote call.
pub const INVALID_ARGS_EXIT_CODE: i32 = 4;

/// Result type alias for tool-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for ec2-serial-console.
#[derive(Error, Debug)]
pub enum Error {
    /// Module not found.
    #[error("Module '{0}' not found")]
    ModuleNotFound(String),

    /// Invalid module arguments. Raised before any remote call.
    #[error("Invalid arguments for module '{module}': {message}")]
    ModuleArgs {
        /// Module name
        module: String,
        /// Error message
        message: String,
    },

    /// Module execution failed.
    #[error("Module '{module}' execution failed: {message}")]
    ModuleExecution {
        /// Module name
        module: String,
        /// Error message
        message: String,
    },

    /// Module argument file could not be read or parsed.
    #[error("Failed to load module arguments from '{path}': {message}")]
    ArgsFile {
        /// Path to the argument file (`-` for stdin)
        path: PathBuf,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Creates an argument file error.
    pub fn args_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::ArgsFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Attributes a module error to `module`.
    pub fn from_module(module: impl Into<String>, err: ModuleError) -> Self {
        let module = module.into();
        match err {
            ModuleError::NotFound(name) => Error::ModuleNotFound(name),
            e if e.is_validation() => Error::ModuleArgs {
                module,
                message: e.to_string(),
            },
            e => Error::ModuleExecution {
                module,
                message: e.to_string(),
            },
        }
    }

    /// Returns the error code for CLI exit status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ModuleExecution { .. } => 2,
            Error::ModuleArgs { .. } | Error::ArgsFile { .. } => INVALID_ARGS_EXIT_CODE,
            _ => 1,
        }
    }
}
