#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a Castle Defence level without a window.

mod level;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use castle_defence_core::{Event, Outcome};
use castle_defence_simulation::{Session, SessionConfig};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "castle-defence")]
#[command(about = "Plays a Castle Defence level headlessly and reports the score")]
struct Cli {
    /// Level description in TOML format
    level: PathBuf,
    /// Seed for route planning
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Simulation speed multiplier
    #[arg(long, default_value_t = 1.0)]
    speed: f32,
    /// Fixed driver timestep in milliseconds
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    step_ms: u64,
    /// Driver time after which an unfinished level is abandoned, in seconds
    #[arg(long, default_value_t = 900)]
    max_seconds: u64,
}

#[derive(Debug, Default)]
struct RunStats {
    simulated: Duration,
    waves: u32,
    spawned: u32,
    discarded: u32,
    reached_goal: u32,
}

impl RunStats {
    fn record(&mut self, event: &Event) {
        match event {
            Event::TimeAdvanced { dt } => self.simulated += *dt,
            Event::WaveStarted { .. } => self.waves += 1,
            Event::EnemySpawned { .. } => self.spawned += 1,
            Event::EnemyDiscarded { .. } => self.discarded += 1,
            Event::EnemyReachedGoal { .. } => self.reached_goal += 1,
            _ => {}
        }
    }
}

/// Entry point for the Castle Defence command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let level = level::load(&cli.level)?;
    let map = level.config.map.clone();

    let mut session = Session::new(level.grid, &level.config, SessionConfig::new(cli.seed))
        .with_context(|| format!("level `{map}` cannot start"))?;
    session.set_speed(cli.speed);
    session.start()?;

    for order in &level.towers {
        match session.build_tower(order.kind, order.cell()) {
            Ok(_) => info!(kind = ?order.kind, cell = ?order.cell(), "opening tower built"),
            Err(reason) => warn!(kind = ?order.kind, cell = ?order.cell(), %reason, "opening tower rejected"),
        }
    }

    let step = Duration::from_millis(cli.step_ms);
    let limit = Duration::from_secs(cli.max_seconds);
    let mut timestamp = Duration::ZERO;
    let mut stats = RunStats::default();
    while session.outcome().is_none() && timestamp <= limit {
        for event in session.tick(timestamp) {
            stats.record(&event);
        }
        timestamp += step;
    }
    session.stop()?;

    let Some(outcome) = session.outcome() else {
        bail!(
            "level `{map}` did not conclude within {} seconds",
            cli.max_seconds
        );
    };

    let summary = session.summary();
    println!("map: {map}");
    println!(
        "outcome: {}",
        match outcome {
            Outcome::Victory => "victory",
            Outcome::Defeat => "defeat",
        }
    );
    println!("lives: {}/{}", summary.final_lives, summary.max_lives);
    println!("gold spent: {}", summary.gold_spent);
    println!(
        "enemies: {} spawned, {} reached the castle, {} discarded",
        stats.spawned, stats.reached_goal, stats.discarded
    );
    println!("waves: {}", stats.waves);
    println!("simulated: {:.1}s", stats.simulated.as_secs_f32());
    println!("stars: {}", summary.stars());
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
