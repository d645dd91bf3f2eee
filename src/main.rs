use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use foldersync::fs::LocalFs;
use foldersync::sync::{exit_status, shutdown_signal};
use foldersync::{Cli, FileActionLog, Scheduler, SyncConfig, Synchronizer};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match SyncConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(err) if err.is_startup() => {
            println!("{}", err);
            return ExitCode::FAILURE;
        }
        Err(err) => {
            println!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(code) => code,
        Err(err) => {
            println!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,foldersync=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(config: SyncConfig) -> Result<ExitCode> {
    let log = Arc::new(FileActionLog::new(&config.log_file));
    if let Err(e) = log.probe() {
        println!(
            "Error: Couldn't write to log file at {}: {}",
            config.log_file.display(),
            e
        );
    }

    let synchronizer = Synchronizer::new(Arc::new(LocalFs), log, config.options);
    let scheduler = Scheduler::new(synchronizer, &config.source, &config.replica, config.interval);

    info!(
        "Mirroring {} -> {} every {}s ({})",
        config.source.display(),
        config.replica.display(),
        config.interval.as_secs(),
        config.options.hash
    );

    if config.once {
        let outcome = scheduler.run_pass().await;
        match &outcome {
            Ok(report) => info!("{}", report.summary()),
            Err(err) => println!("Error: {:#}", err),
        }
        return Ok(ExitCode::from(exit_status(&outcome)));
    }

    let passes = scheduler.run_until(shutdown_signal()).await?;
    info!("Stopped after {} passes", passes);
    Ok(ExitCode::SUCCESS)
}
