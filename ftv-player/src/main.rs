//! Friday TV (ftv-player) - Main entry point
//!
//! Runs the channel controller against the built-in simulated player and
//! prints a state snapshot after every step. Useful for watching rotation,
//! verification and channel switching without a browser.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ftv_common::config::{ConfigResolver, TomlConfig};
use ftv_player::orientation::OEmbedProbe;
use ftv_player::sim::{SimPlaylist, SimulatedFactory};
use ftv_player::{Controller, ControllerHandle};

/// Command-line arguments for ftv-player
#[derive(Parser, Debug)]
#[command(name = "ftv-player")]
#[command(about = "Friday TV channel controller (simulated player)")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "FTV_CONFIG")]
    config: Option<PathBuf>,

    /// Channel to tune at startup (defaults to the first configured one)
    #[arg(long)]
    channel: Option<String>,

    /// Seed for the rotation random source
    #[arg(long)]
    seed: Option<u64>,

    /// Number of skips to perform
    #[arg(long, default_value = "5")]
    steps: usize,

    /// Simulated entries per channel
    #[arg(long, default_value = "8")]
    items: usize,

    /// Make every Nth simulated entry refuse to play (0 disables)
    #[arg(long, default_value = "0")]
    blocked_every: usize,

    /// Look up orientation through oEmbed when an item starts playing
    #[arg(long)]
    probe_orientation: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    dump_config: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigResolver::new()
        .load(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Initialize tracing
    let fallback = format!(
        "ftv_player={level},ftv_common={level}",
        level = config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if args.dump_config {
        println!(
            "{}",
            toml::to_string_pretty(&config).context("Failed to serialize configuration")?
        );
        return Ok(());
    }

    info!(
        "Starting Friday TV with {} channel(s), settle delay {}ms",
        config.channels.len(),
        config.player.settle_delay_ms
    );

    let delay = step_delay(config.player.settle_delay(), args.items).context("--items is too large")?;
    let factory = Arc::new(simulated_factory(&config, args.items, args.blocked_every));

    let mut controller = Controller::new(config.clone(), factory);
    if let Some(seed) = args.seed {
        controller = controller.with_seed(seed);
    }
    if args.probe_orientation {
        let probe = OEmbedProbe::new().context("Failed to build oEmbed client")?;
        controller = controller.with_probe(Arc::new(probe));
    }

    let (handle, task) = controller
        .spawn(args.channel.as_deref())
        .context("Failed to start controller")?;

    tokio::time::sleep(delay).await;
    print_snapshot(&handle)?;

    for step in 1..=args.steps {
        info!("Step {}: skip", step);
        handle.skip().await?;
        tokio::time::sleep(delay).await;
        print_snapshot(&handle)?;
    }

    handle.shutdown().await?;
    task.await.context("Controller task failed")?;
    info!("Shutdown complete");
    Ok(())
}

/// One simulated playlist per configured channel
fn simulated_factory(config: &TomlConfig, items: usize, blocked_every: usize) -> SimulatedFactory {
    config.channels.iter().fold(SimulatedFactory::new(), |factory, channel| {
        let ids: Vec<String> = (1..=items)
            .map(|i| format!("{}-{:02}", channel.name, i))
            .collect();
        let blocked: Vec<String> = match blocked_every {
            0 => Vec::new(),
            n => ids.iter().skip(n - 1).step_by(n).cloned().collect(),
        };
        factory.with_playlist(&channel.playlist, SimPlaylist::new(ids).with_blocked(blocked))
    })
}

/// Wait between steps: long enough for a verification pass over every entry
fn step_delay(settle_delay: Duration, items: usize) -> Option<Duration> {
    let slots = u32::try_from(items).ok()?.checked_add(1)?;
    settle_delay.checked_mul(slots)
}

fn print_snapshot(handle: &ControllerHandle) -> Result<()> {
    let snapshot = handle.snapshot();
    println!(
        "{}",
        serde_json::to_string(&snapshot).context("Failed to serialize snapshot")?
    );
    Ok(())
}
