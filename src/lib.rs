//! # ec2-serial-console
//!
//! A configuration-management module that enables or disables EC2 serial console
//! access for an AWS account and reports the result.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           CLI Interface                             │
//! │              (clap: apply / run / list-modules, --check)            │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Module Registry                            │
//! │          (parameter validation, check mode dispatch)                │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     ec2_serial_console module                       │
//! │   STS GetCallerIdentity → EC2 GetSerialConsoleAccessStatus →        │
//! │   at most one Enable/DisableSerialConsoleAccess                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use ec2_serial_console::prelude::*;
//!
//! let registry = ModuleRegistry::with_builtins();
//! let mut params = ModuleParams::new();
//! params.insert("state".into(), serde_json::json!("enabled"));
//!
//! let output = registry.execute("ec2_serial_console", &params, &ModuleContext::new())?;
//! println!("changed: {}", output.changed);
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::modules::cloud::aws::serial_console::{
        reconcile, Ec2SerialConsoleModule, SerialConsoleApi, SerialConsoleReport,
        SerialConsoleState,
    };
    pub use crate::modules::{
        Module, ModuleContext, ModuleError, ModuleOutput, ModuleParams, ModuleRegistry,
        ModuleResult, ModuleStatus, ParamExt,
    };
}

/// Tool-level error types and the exit code mapping used by the CLI.
pub mod error;

/// Layered configuration: defaults, config files, environment overrides.
pub mod config;

/// Module trait, parameters, output, registry, and the built-in modules.
pub mod modules;
