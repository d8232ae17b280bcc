//! Subcommands module for the ec2-serial-console CLI
//!
//! This module contains all the subcommand implementations.

pub mod apply;
pub mod list;
pub mod run;

use crate::cli::output::OutputFormatter;
use ec2_serial_console::config::{Config, OutputFormat};
use ec2_serial_console::error::Error;
use ec2_serial_console::modules::{ModuleContext, ModuleParams, ModuleRegistry};
use std::sync::Arc;
use tracing::{debug, info};

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Check mode (dry-run)
    pub check_mode: bool,
    /// Diff mode
    pub diff_mode: bool,
    /// Region given on the command line
    pub region: Option<String>,
    /// Profile given on the command line
    pub profile: Option<String>,
    /// Available modules
    pub registry: Arc<ModuleRegistry>,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: Config) -> Self {
        let format = cli.output.unwrap_or(config.output.format);
        let use_color = config.output.color_enabled() && !cli.no_color;
        let output = OutputFormatter::new(use_color, format == OutputFormat::Json);

        Self {
            output,
            check_mode: cli.check_mode,
            diff_mode: cli.diff_mode,
            region: cli.region.clone(),
            profile: cli.profile.clone(),
            registry: Arc::new(ModuleRegistry::with_builtins()),
            config,
        }
    }

    /// Module context for the global `--check` / `--diff` flags
    pub fn module_context(&self) -> ModuleContext {
        ModuleContext::new()
            .with_check_mode(self.check_mode)
            .with_diff_mode(self.diff_mode)
    }

    /// Fill `region`/`profile` the module arguments leave unset, from the command
    /// line first and the configuration second.
    pub fn apply_module_defaults(&self, params: &mut ModuleParams) {
        let defaults = [
            ("region", self.region.as_ref().or(self.config.aws.region.as_ref())),
            ("profile", self.profile.as_ref().or(self.config.aws.profile.as_ref())),
        ];
        for (key, value) in defaults {
            if let Some(value) = value {
                params
                    .entry(key.to_string())
                    .or_insert_with(|| serde_json::json!(value));
            }
        }
    }

    /// Run a module and print its result; returns the process exit code
    pub async fn execute_module(
        &self,
        name: &str,
        params: ModuleParams,
        context: ModuleContext,
    ) -> anyhow::Result<i32> {
        info!(module = name, check_mode = context.check_mode, "executing module");
        debug!(?params, "module arguments");

        let registry = Arc::clone(&self.registry);
        let module = name.to_string();
        let result =
            tokio::task::spawn_blocking(move || registry.execute(&module, &params, &context))
                .await?;

        match result {
            Ok(output) => {
                info!(module = name, changed = output.changed, "module finished");
                self.output.module_result(name, &output);
                Ok(0)
            }
            Err(e) => {
                let err = Error::from_module(name, e);
                self.report_failure(name, &err);
                Ok(err.exit_code())
            }
        }
    }

    /// Print a failure and log it
    pub fn report_failure(&self, name: &str, err: &Error) {
        tracing::error!(module = name, error = %err, "module failed");
        self.output.module_failure(name, err);
    }
}
