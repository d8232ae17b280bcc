//! Apply command - set serial console access from typed flags

use super::CommandContext;
use anyhow::Result;
use clap::Parser;
use ec2_serial_console::modules::cloud::aws::serial_console::MODULE_NAME;
use ec2_serial_console::modules::ModuleParams;

/// Arguments for the apply command
#[derive(Parser, Debug, Clone)]
pub struct ApplyArgs {
    /// Target state of EC2 serial console access: enabled or disabled
    #[arg(short, long)]
    pub state: String,
}

impl ApplyArgs {
    /// Build the module parameters for this invocation
    pub fn params(&self, ctx: &CommandContext) -> ModuleParams {
        let mut params = ModuleParams::new();
        params.insert("state".to_string(), serde_json::json!(self.state));
        ctx.apply_module_defaults(&mut params);
        params
    }

    /// Execute the apply command
    pub async fn execute(&self, ctx: &CommandContext) -> Result<i32> {
        let params = self.params(ctx);
        ctx.execute_module(MODULE_NAME, params, ctx.module_context())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use ec2_serial_console::config::Config;

    #[test]
    fn test_params_include_state_and_cli_region() {
        let cli = Cli::try_parse_from([
            "ec2-serial-console",
            "apply",
            "--state",
            "disabled",
            "--region",
            "us-west-1",
        ])
        .unwrap();
        let ctx = CommandContext::new(&cli, Config::default());
        let args = ApplyArgs {
            state: "disabled".to_string(),
        };

        let params = args.params(&ctx);
        assert_eq!(params["state"], serde_json::json!("disabled"));
        assert_eq!(params["region"], serde_json::json!("us-west-1"));
    }
}
