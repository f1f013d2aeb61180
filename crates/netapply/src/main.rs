//! netapply - apply network configuration to the running system
//!
//! Entry point for the netapply command.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use netapply::{ApplyConfig, ApplyContext, ApplyOptions, Orchestrator, DEFAULT_CONFIG_PATH};

/// Apply declared network configuration to the running system
#[derive(Parser, Debug)]
#[command(name = "netapply")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug messages
    #[arg(long, global = true)]
    debug: bool,

    /// Tool configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply current configuration: generate backend files, rename
    /// interfaces and restart the affected backends
    Apply {
        /// Do not run the configuration generator
        #[arg(long)]
        skip_generate: bool,

        /// Wait for backend start/stop jobs to finish
        #[arg(long)]
        sync: bool,

        /// Report generation failure as a configuration error instead of
        /// its own exit status
        #[arg(long)]
        no_exit_on_error: bool,
    },
}

/// Initializes tracing/logging subsystem
///
/// `RUST_LOG` overrides the level selected by `--debug`.
fn init_logging(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(debug)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.debug);

    let config = match ApplyConfig::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    let Command::Apply {
        skip_generate,
        sync,
        no_exit_on_error,
    } = args.command;
    let options = ApplyOptions {
        run_generate: !skip_generate,
        sync,
        exit_on_error: !no_exit_on_error,
    };

    let ctx = ApplyContext::from_config(&config, options);
    match Orchestrator::new(ctx).run().await {
        Ok(report) => {
            for (device, change) in &report.renames {
                info!("{} renamed to {}", device, change.name);
            }
            for failure in &report.failures {
                warn!("{} ({}): {}", failure.item, failure.phase, failure.error);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_of(argv: &[&str]) -> PathBuf {
        Args::try_parse_from(argv).unwrap().config
    }

    #[test]
    fn test_config_accepted_after_subcommand() {
        assert_eq!(
            config_of(&["netapply", "apply", "--config", "/tmp/x.toml"]),
            PathBuf::from("/tmp/x.toml")
        );
    }

    #[test]
    fn test_config_accepted_before_subcommand() {
        assert_eq!(
            config_of(&["netapply", "--config", "/tmp/x.toml", "apply", "--sync"]),
            PathBuf::from("/tmp/x.toml")
        );
    }

    #[test]
    fn test_config_defaults() {
        assert_eq!(config_of(&["netapply", "apply"]), PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn test_apply_flags() {
        let args =
            Args::try_parse_from(["netapply", "apply", "--debug", "--skip-generate"]).unwrap();
        assert!(args.debug);
        let Command::Apply {
            skip_generate,
            sync,
            no_exit_on_error,
        } = args.command;
        assert!(skip_generate);
        assert!(!sync);
        assert!(!no_exit_on_error);
    }
}
