mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use odin_config::OdinConfig;
use odin_rds::{Lifecycle, WaitConfig};
use odin_rds_aws::AwsRdsProvider;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), format!("{:#}", e).red());
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout only carries results
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if matches!(cli.command, Commands::Version) {
        println!("odin {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = odin_config::load(cli.config.as_deref())?;
    let wait = wait_config(&cli, &config);
    let region = cli.region.as_deref().unwrap_or(&config.region);
    let profile = cli.profile.as_deref().or(config.profile.as_deref());

    let provider = AwsRdsProvider::from_env(Some(region), profile).await;
    tracing::debug!(region, ?wait, "Using RDS provider");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, stopping wait...".yellow());
            on_interrupt.cancel();
        }
    });

    let lifecycle = Lifecycle::new(&provider, wait).with_cancellation(cancel);
    let output = match cli.command {
        Commands::Instance(command) => {
            commands::instance::handle(&lifecycle, &config, command).await?
        }
        Commands::Snapshot(command) => commands::snapshot::handle(&lifecycle, command).await?,
        Commands::Version => String::new(),
    };

    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}

/// Flags override the config file
fn wait_config(cli: &Cli, config: &OdinConfig) -> WaitConfig {
    let poll_interval = cli
        .poll_interval
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.poll_interval());
    let timeout = match cli.timeout {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => config.wait_timeout(),
    };

    WaitConfig::default()
        .with_poll_interval(poll_interval)
        .with_timeout(timeout)
}
