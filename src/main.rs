//! ec2-serial-console - enable or disable EC2 serial console access
//!
//! This is the main entry point for the CLI.

mod cli;

use anyhow::Result;
use cli::commands::CommandContext;
use cli::{Cli, Commands};
use ec2_serial_console::config::{Config, LogFormat, LoggingConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = match Cli::try_parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            let code = cli::parse_error_exit_code(&e);
            e.print()?;
            std::process::exit(code);
        }
    };

    // Load configuration
    let config = match Config::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Failed to load config: {:#}", e);
            Config::default()
        }
    };

    // Initialize logging based on verbosity and the logging section
    init_logging(cli.verbosity(), &config.logging);

    let ctx = CommandContext::new(&cli, config);

    let exit_code = match &cli.command {
        Commands::Apply(args) => args.execute(&ctx).await?,
        Commands::Run(args) => args.execute(&ctx).await?,
        Commands::ListModules => cli::commands::list::execute(&ctx)?,
    };

    std::process::exit(exit_code);
}

/// Initialize logging. `RUST_LOG` wins, then `-v` flags, then the configured level.
fn init_logging(verbosity: u8, logging: &LoggingConfig) {
    let filter = match verbosity {
        0 => logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(verbosity >= 3)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init(),
    }
}
