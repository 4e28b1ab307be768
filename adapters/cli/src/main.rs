#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless Skyline session.

mod config;
mod session;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use crate::{config::SessionConfig, session::Session};

/// Build as high as you can before the timer runs out.
#[derive(Debug, Parser)]
#[command(name = "skyline", version)]
struct Cli {
    /// Session configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Overrides the configured random seed
    #[arg(short, long)]
    seed: Option<u64>,
    /// Overrides the configured tick budget
    #[arg(short, long)]
    ticks: Option<u32>,
    /// Prints the city window and exits
    #[arg(long)]
    print_layout: bool,
}

/// Entry point for the Skyline command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(ticks) = cli.ticks {
        config.max_ticks = ticks;
    }

    if cli.print_layout {
        print!("{}", config.city_layout()?);
        return Ok(());
    }

    info!("starting session with seed {}", config.seed);
    let report = Session::new(&config)?.run();
    println!("ticks: {}", report.ticks);
    println!(
        "score: {} ({})",
        report.score,
        report.rank.unwrap_or("How did you do that?")
    );
    println!("highest building: {}", report.highest_building);
    println!("blocks: {}", report.blocks);
    println!("invaders: {}", report.invaders);
    println!(
        "events: placed {}, failed place {}, picked up {}, failed pickup {}",
        report.events.placed,
        report.events.failed_place,
        report.events.picked_up,
        report.events.failed_pickup
    );
    println!("fingerprint: {:#018x}", report.fingerprint);
    Ok(())
}
