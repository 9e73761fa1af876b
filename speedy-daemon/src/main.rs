use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use speedy_core::config::{SINK_BACKENDS, SpeedyConfig};
use speedy_daemon::cli::DaemonCli;
use speedy_daemon::logging;
use speedy_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("speedy: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = DaemonCli::parse();

    if cli.list_interfaces {
        print_interfaces()?;
        return Ok(ExitCode::SUCCESS);
    }
    if cli.list_backends {
        for backend in SINK_BACKENDS {
            println!("{backend}");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli).await?;

    if cli.validate {
        println!("configuration is valid");
        return Ok(ExitCode::SUCCESS);
    }

    if config.capture.interface.is_empty() {
        eprintln!("no capture interface given (use --interface); available interfaces:");
        print_interfaces()?;
        return Ok(ExitCode::FAILURE);
    }

    logging::init_tracing(&config.general)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        interface = %config.capture.interface,
        backend = %config.sink.backend,
        "speedy starting"
    );

    let mut orchestrator = Orchestrator::build_from_config(config)?;
    orchestrator.run().await?;

    tracing::info!("speedy shut down");
    Ok(ExitCode::SUCCESS)
}

/// defaults < file < `SPEEDY_*` environment < command line
async fn load_config(cli: &DaemonCli) -> Result<SpeedyConfig> {
    let mut config = match &cli.config {
        Some(path) => SpeedyConfig::from_file(path)
            .await
            .map_err(|e| anyhow::anyhow!("failed to load config: {}", e))?,
        None => SpeedyConfig::default(),
    };
    config.apply_env_overrides();
    cli.apply_overrides(&mut config);
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;
    Ok(config)
}

fn print_interfaces() -> Result<()> {
    let interfaces = speedy_capture::active_interfaces()
        .map_err(|e| anyhow::anyhow!("failed to list interfaces: {}", e))?;
    for name in interfaces {
        println!("{name}");
    }
    Ok(())
}
