//! Run command - execute a module from an Ansible-style argument file
//!
//! The argument file is a JSON object of module parameters, optionally wrapped as
//! `{"ANSIBLE_MODULE_ARGS": {...}}` the way Ansible hands arguments to a module.
//! Framework keys such as `_ansible_check_mode` are honored.

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use ec2_serial_console::error::Error;
use ec2_serial_console::modules::cloud::aws::serial_console::MODULE_NAME;
use ec2_serial_console::modules::ModuleParams;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const WRAPPER_KEY: &str = "ANSIBLE_MODULE_ARGS";

/// Arguments for the run command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// JSON argument file; reads stdin when omitted or `-`
    pub args_file: Option<PathBuf>,

    /// Module to run
    #[arg(short, long, default_value = MODULE_NAME)]
    pub module: String,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let path = self
            .args_file
            .clone()
            .unwrap_or_else(|| PathBuf::from("-"));

        let loaded = read_source(&path).and_then(|content| parse_module_args(&path, &content));
        let mut params = match loaded {
            Ok(params) => params,
            Err(err) => {
                ctx.report_failure(&self.module, &err);
                return Ok(err.exit_code());
            }
        };

        let context = match ctx.module_context().absorb_framework_params(&mut params) {
            Ok(context) => context,
            Err(e) => {
                let err = Error::from_module(&self.module, e);
                ctx.report_failure(&self.module, &err);
                return Ok(err.exit_code());
            }
        };
        ctx.apply_module_defaults(&mut params);

        ctx.execute_module(&self.module, params, context).await
    }
}

fn read_source(path: &Path) -> Result<String, Error> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| Error::args_file(path, e.to_string()))?;
        return Ok(content);
    }
    std::fs::read_to_string(path).map_err(|e| Error::args_file(path, e.to_string()))
}

/// Parse module parameters from JSON text, unwrapping `ANSIBLE_MODULE_ARGS`.
pub fn parse_module_args(path: &Path, content: &str) -> Result<ModuleParams, Error> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| Error::args_file(path, e.to_string()))?;

    let value = match value {
        serde_json::Value::Object(mut map) if map.len() == 1 && map.contains_key(WRAPPER_KEY) => {
            debug!("unwrapping {}", WRAPPER_KEY);
            map.remove(WRAPPER_KEY).unwrap_or_default()
        }
        other => other,
    };

    match value {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(Error::args_file(
            path,
            format!("expected a JSON object of module arguments, got: {}", other),
        )),
    }
}
