#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduler that turns level data into timed spawn commands.
//!
//! The scheduler walks the configured waves group by group. When the current
//! countdown elapses (or a skip is requested) every enemy of the current group
//! is spawned on a freshly planned route, and the countdown restarts with the
//! group's delay. Time left over after a trigger carries into the next
//! countdown, so coarse ticks spawn exactly what fine ticks would.

use std::time::Duration;

use castle_defence_core::{CellCoord, Command, Event, Grid, LevelConfig, Route, Wave, WaveIndex};
use castle_defence_system_pathfinding::PathFinder;
use tracing::{debug, info, warn};

/// Configuration parameters required to construct the scheduler.
#[derive(Clone, Debug)]
pub struct Config {
    waves: Vec<Wave>,
    initial_delay: Duration,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration from explicit waves and timing.
    #[must_use]
    pub fn new(waves: Vec<Wave>, initial_delay: Duration, rng_seed: u64) -> Self {
        Self {
            waves,
            initial_delay,
            rng_seed,
        }
    }

    /// Creates a configuration describing the waves of `level`.
    #[must_use]
    pub fn from_level(level: &LevelConfig, rng_seed: u64) -> Self {
        Self::new(level.waves.clone(), level.initial_delay(), rng_seed)
    }
}

/// Pure system that emits wave and spawn commands as simulated time passes.
#[derive(Debug)]
pub struct WaveScheduler {
    waves: Vec<Wave>,
    finder: PathFinder,
    wave: usize,
    group: usize,
    countdown: Duration,
    started: Option<WaveIndex>,
    skip_requested: bool,
    exhausted: bool,
}

impl WaveScheduler {
    /// Creates a new scheduler using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            waves: config.waves,
            finder: PathFinder::from_seed(config.rng_seed),
            wave: 0,
            group: 0,
            countdown: config.initial_delay,
            started: None,
            skip_requested: false,
            exhausted: false,
        }
    }

    /// Most recently started wave, if any.
    #[must_use]
    pub const fn current_wave(&self) -> Option<WaveIndex> {
        self.started
    }

    /// Reports whether the final group of the final wave has spawned.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Simulated time left before the next group spawns.
    #[must_use]
    pub const fn countdown(&self) -> Duration {
        self.countdown
    }

    /// Asks for the pending group to spawn on the next [`WaveScheduler::handle`]
    /// call regardless of its remaining countdown.
    pub fn request_skip(&mut self) {
        if !self.exhausted {
            self.skip_requested = true;
        }
    }

    /// Consumes events and immutable views to emit wave commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        grid: &Grid,
        castle: CellCoord,
        out: &mut Vec<Command>,
    ) {
        if self.exhausted {
            return;
        }

        let mut budget = Duration::ZERO;
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                budget = budget.saturating_add(*dt);
            }
        }

        if std::mem::take(&mut self.skip_requested) {
            debug!(remaining = ?self.countdown, "skipping wave countdown");
            self.countdown = Duration::ZERO;
        } else if budget.is_zero() {
            return;
        }

        while !self.exhausted {
            if self.countdown > budget {
                self.countdown -= budget;
                break;
            }
            budget -= self.countdown;
            self.countdown = Duration::ZERO;
            self.trigger(grid, castle, out);
        }
    }

    fn trigger(&mut self, grid: &Grid, castle: CellCoord, out: &mut Vec<Command>) {
        let Some(wave) = self.waves.get(self.wave) else {
            self.conclude(out);
            return;
        };

        if self.group == 0 {
            let index = WaveIndex::new(u32::try_from(self.wave).unwrap_or(u32::MAX));
            self.started = Some(index);
            info!(wave = index.get(), enemies = wave.total_enemies(), "starting wave");
            out.push(Command::BeginWave { wave: index });
        }

        if let Some(group) = wave.groups.get(self.group) {
            for entry in &group.enemies {
                for _ in 0..entry.count {
                    let route = plan_route(&mut self.finder, grid, castle);
                    out.push(Command::SpawnEnemy {
                        kind: entry.kind,
                        route,
                    });
                }
            }
            self.countdown = if group.total() == 0 {
                Duration::ZERO
            } else {
                group.delay()
            };
            self.group += 1;
        }

        if self.group >= wave.groups.len() {
            self.wave += 1;
            self.group = 0;
        }

        if self.wave >= self.waves.len() {
            self.conclude(out);
        }
    }

    fn conclude(&mut self, out: &mut Vec<Command>) {
        self.exhausted = true;
        self.countdown = Duration::ZERO;
        info!("all waves spawned");
        out.push(Command::ConcludeWaves);
    }
}

fn plan_route(finder: &mut PathFinder, grid: &Grid, castle: CellCoord) -> Route {
    match finder.find_random_spawn_point(grid) {
        Ok(spawn) => finder.find_path(grid, spawn, castle),
        Err(error) => {
            warn!(%error, "cannot plan an enemy route");
            Route::unreachable()
        }
    }
}
