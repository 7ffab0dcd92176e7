// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Courier host daemon (courierd)
//!
//! Runs the event, session and alert services and drives them from line
//! commands on stdin.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod command;
mod lifecycle;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::command::{Command, CommandError};
use crate::lifecycle::HostConfig;

#[derive(Parser)]
#[command(name = "courierd", version, about = "Courier background scheduler host")]
struct Args {
    /// Path to a TOML host configuration
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Never start timers
    #[arg(long)]
    test_mode: bool,

    /// Override the record store directory
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };
    if args.test_mode {
        config.scheduler.test_mode = true;
    }
    if let Some(dir) = args.store_dir {
        config.store_dir = Some(dir);
    }

    let _log_guard = lifecycle::setup_logging(&config)?;
    info!("Starting courierd");

    let host = match lifecycle::startup(config).await {
        Ok(host) => host,
        Err(e) => {
            error!("Failed to start host: {}", e);
            return Err(e.into());
        }
    };

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    // Signal ready for a parent process waiting on startup
    println!("READY");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("stdin closed, shutting down...");
                    break;
                };
                match command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => println!("{}", host.execute(command).await),
                    Err(CommandError::Empty) => {}
                    Err(e) => println!("ERROR {}", e),
                }
            }

            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }

            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
        }
    }

    host.shutdown().await;
    info!("courierd stopped");
    Ok(())
}
