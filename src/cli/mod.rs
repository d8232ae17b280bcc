//! CLI module for ec2-serial-console
//!
//! This module provides the command-line interface, including argument parsing
//! and subcommand handling.

pub mod commands;
pub mod output;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use ec2_serial_console::config::OutputFormat;
use ec2_serial_console::error::INVALID_ARGS_EXIT_CODE;
use std::path::PathBuf;

/// ec2-serial-console - manage EC2 serial console access for an AWS account
#[derive(Parser, Debug, Clone)]
#[command(name = "ec2-serial-console")]
#[command(version)]
#[command(about = "Enable or disable EC2 serial console access for an AWS account", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Run in check mode (dry-run, don't make changes)
    #[arg(long = "check", global = true)]
    pub check_mode: bool,

    /// Run in diff mode (show differences)
    #[arg(long = "diff", global = true)]
    pub diff_mode: bool,

    /// Output format (defaults to the configured format)
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// AWS region used when the module arguments do not name one
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// AWS profile used when the module arguments do not name one
    #[arg(long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "EC2_SERIAL_CONSOLE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Set serial console access to the given state
    Apply(commands::apply::ApplyArgs),

    /// Run a module with Ansible-style JSON arguments
    Run(commands::run::RunArgs),

    /// List available modules
    #[command(name = "list-modules")]
    ListModules,
}

impl Cli {
    /// Parse command-line arguments, leaving usage errors to the caller
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Cli::try_parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }
}

/// Exit code for a failed parse: 0 for `--help`/`--version`, otherwise the
/// invalid-arguments code modules use.
pub fn parse_error_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => INVALID_ARGS_EXIT_CODE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli =
            Cli::try_parse_from(["ec2-serial-console", "apply", "--state", "enabled"]).unwrap();
        match cli.command {
            Commands::Apply(args) => assert_eq!(args.state, "enabled"),
            other => panic!("unexpected command: {:?}", other),
        }
        assert!(!cli.check_mode);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ec2-serial-console",
            "apply",
            "--state",
            "disabled",
            "--check",
            "--output",
            "json",
            "--region",
            "us-east-2",
        ])
        .unwrap();
        assert!(cli.check_mode);
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!(cli.region.as_deref(), Some("us-east-2"));
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["ec2-serial-console", "-vvvv", "list-modules"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }

    #[test]
    fn test_run_defaults_to_serial_console_module() {
        let cli = Cli::try_parse_from(["ec2-serial-console", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.module, "ec2_serial_console");
                assert!(args.args_file.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_apply_requires_state() {
        let err = Cli::try_parse_from(["ec2-serial-console", "apply"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(parse_error_exit_code(&err), 4);
    }

    #[test]
    fn test_help_and_version_exit_cleanly() {
        let help = Cli::try_parse_from(["ec2-serial-console", "--help"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&help), 0);

        let version = Cli::try_parse_from(["ec2-serial-console", "--version"]).unwrap_err();
        assert_eq!(parse_error_exit_code(&version), 0);
    }

    #[test]
    fn test_usage_errors_use_invalid_args_code() {
        for args in [
            vec!["ec2-serial-console"],
            vec!["ec2-serial-console", "bogus"],
            vec!["ec2-serial-console", "list-modules", "--output", "yaml"],
        ] {
            let err = Cli::try_parse_from(args).unwrap_err();
            assert_eq!(parse_error_exit_code(&err), 4);
        }
    }
}
