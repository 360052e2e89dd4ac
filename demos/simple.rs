//! Simple Service Example
//!
//! Installs this example binary as a native service that runs itself with the
//! `run` argument.
//!
//! # Usage
//!
//! ```bash
//! # Install and start (as a user agent / user unit unless run as root)
//! cargo run --example simple -- install
//!
//! # Inspect
//! cargo run --example simple -- status --json
//!
//! # Remove
//! cargo run --example simple -- uninstall
//!
//! # Use a descriptor from a TOML file instead of the built-in one
//! cargo run --example simple -- status --config demos/simple.toml
//! ```

use std::time::Duration;

use anyhow::{Context, bail};
use sysservice::core::logging;
use sysservice::prelude::*;

fn default_descriptor() -> anyhow::Result<ServiceDescriptor> {
    let exe = std::env::current_exe().context("could not resolve executable path")?;
    Ok(ServiceDescriptor::new("MyService", "com.myservice", exe)
        .with_args(["run"])
        .with_description("My systemservice test!")
        .with_documentation("https://github.com/danawoodman/systemservice")
        .with_debug(true))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    logging::init("info");

    let command = args[1].to_lowercase();
    let json = args.iter().any(|a| a == "--json");
    let config = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1));

    let descriptor = match config {
        Some(path) => ServiceDescriptor::load(path)
            .with_context(|| format!("could not load descriptor from {path}"))?,
        None => default_descriptor()?,
    };
    tracing::info!(command = %descriptor.command_line(), "created command");

    let service = SystemService::new(descriptor)?;
    let platform = service.platform();
    tracing::info!(%platform, manager = platform.manager(), "using native service manager");

    match command.as_str() {
        "run" => run(&service).await?,
        "install" => service.install(true).await?,
        "start" => service.start().await?,
        "stop" => service.stop().await?,
        "restart" => service.restart().await?,
        "uninstall" => service.uninstall().await?,
        "status" => {
            let status = service.status().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("{status}");
            }
        }
        "exists" => println!("{}", service.exists().await),
        other => bail!("unknown command: {other}"),
    }

    Ok(())
}

async fn run(service: &SystemService) -> anyhow::Result<()> {
    tracing::info!("running service");
    service.run().await?;

    // launchd and systemd supervise this process directly; do some work
    // until asked to stop.
    if !cfg!(windows) {
        let mut tick = tokio::time::interval(Duration::from_secs(5));
        loop {
            tokio::select! {
                _ = tick.tick() => tracing::info!("service is working"),
                _ = tokio::signal::ctrl_c() => break,
            }
        }
    }

    tracing::info!("service stopped");
    Ok(())
}

fn print_help() {
    println!(
        r#"sysservice Simple Example

USAGE:
    cargo run --example simple -- <COMMAND> [OPTIONS]

COMMANDS:
    run          Run the service body (invoked by the service manager)
    install      Install and start the service
    start        Start the service
    stop         Stop the service
    restart      Restart the service
    uninstall    Stop and remove the service
    status       Print running state and PID
    exists       Print whether the service is installed

OPTIONS:
    --config <FILE>    Load the service descriptor from a TOML file
    --json             Print status as JSON
    --help, -h         Print this help message
"#
    );
}
