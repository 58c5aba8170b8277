use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use rebal::core::config::RebalanceOverrides;
use rebal::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for rebal::AppCommand {
    fn from(cmd: Commands) -> rebal::AppCommand {
        match cmd {
            Commands::Rebalance {
                cash,
                show_zero,
                holdings,
                target,
            } => rebal::AppCommand::Rebalance(RebalanceOverrides {
                cash_injection: cash,
                show_zero_rows: show_zero,
                holdings_path: holdings,
                target_path: target,
            }),
            Commands::Exposure { target } => rebal::AppCommand::Exposure {
                target_path: target,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Write an example configuration (to --config-path if given) and show its settings
    Setup,
    /// Plan share purchases for new cash and write to_buy.json and report.json
    Rebalance {
        /// Cash to invest in TWD, overrides the configured amount
        #[arg(long)]
        cash: Option<f64>,
        /// Also list symbols that need no purchase
        #[arg(long)]
        show_zero: bool,
        /// Holdings file (symbol -> shares)
        #[arg(long)]
        holdings: Option<PathBuf>,
        /// Target allocation file (symbol -> weight)
        #[arg(long)]
        target: Option<PathBuf>,
    },
    /// Display real-estate exposure of the target allocation
    Exposure {
        /// Target allocation file (symbol -> weight)
        #[arg(long)]
        target: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => rebal::cli::setup::setup(cli.config_path.as_deref()),
        Some(cmd) => rebal::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
