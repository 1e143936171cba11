#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game session that drives the world and the wave scheduler in real time.
//!
//! A [`Session`] owns the world, the scheduler and a pausable clock. Drivers
//! feed it monotonic timestamps through [`Session::tick`]; every effective
//! tick advances all entities, lets the scheduler spawn what is due and then
//! evaluates victory and defeat. Player requests (tower actions, pickups,
//! wave skips) are forwarded as world commands between ticks.

mod clock;

use std::time::Duration;

use castle_defence_core::{
    CellCoord, Command, ConfigError, EntityId, EntityView, Event, Gold, Grid, LevelConfig,
    LevelSummary, Outcome, TowerError, TowerKind, TowerSnapshot, WaveIndex,
};
use castle_defence_system_pathfinding::{spawn_points, PathFinder};
use castle_defence_system_waves::{Config as WaveConfig, WaveScheduler};
use castle_defence_world::{self as world, query, PlayerState, World};
use tracing::{debug, info};

pub use clock::{ClockState, SessionError};
use clock::Clock;

/// Parameters that influence a session beyond the level data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionConfig {
    seed: u64,
}

impl SessionConfig {
    /// Creates a configuration whose randomness derives from `seed`.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed of the route planner's random generator.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}

/// A single playthrough of a level.
#[derive(Debug)]
pub struct Session {
    world: World,
    scheduler: WaveScheduler,
    clock: Clock,
    castle: CellCoord,
    map: String,
}

impl Session {
    /// Creates a session for `level` played on `grid`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the level data is invalid or the grid
    /// lacks a castle or an edge spawn cell.
    pub fn new(grid: Grid, level: &LevelConfig, config: SessionConfig) -> Result<Self, ConfigError> {
        level.validate()?;
        let castle = PathFinder::find_castle_point(&grid)?;
        if spawn_points(&grid).is_empty() {
            return Err(ConfigError::MissingSpawnPoint);
        }

        info!(
            map = %level.map,
            waves = level.waves.len(),
            seed = config.seed(),
            "session created"
        );

        Ok(Self {
            world: World::new(grid, level.starting_gold, level.starting_lives),
            scheduler: WaveScheduler::new(WaveConfig::from_level(level, config.seed())),
            clock: Clock::new(),
            castle,
            map: level.map.clone(),
        })
    }

    /// Starts delivering simulated time.
    ///
    /// # Errors
    ///
    /// Fails if the session already started or was stopped.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.clock.start()?;
        info!(map = %self.map, "session started");
        Ok(())
    }

    /// Halts simulated time until [`Session::resume`] is called.
    ///
    /// # Errors
    ///
    /// Fails unless the session is running.
    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.clock.pause()?;
        debug!("session paused");
        Ok(())
    }

    /// Continues a paused session.
    ///
    /// # Errors
    ///
    /// Fails unless the session is paused.
    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.clock.resume()?;
        debug!("session resumed");
        Ok(())
    }

    /// Permanently halts the session.
    ///
    /// # Errors
    ///
    /// Fails if the session was already stopped.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        self.clock.stop()?;
        info!(map = %self.map, "session stopped");
        Ok(())
    }

    /// Current clock state.
    #[must_use]
    pub fn state(&self) -> ClockState {
        self.clock.state()
    }

    /// Multiplier applied to elapsed driver time.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.clock.speed()
    }

    /// Changes the speed multiplier; non-positive and non-finite values are ignored.
    pub fn set_speed(&mut self, speed: f32) {
        if !self.clock.set_speed(speed) {
            debug!(speed, "ignoring invalid speed multiplier");
        }
    }

    /// Advances the session to the provided driver timestamp.
    ///
    /// Returns every event produced by the tick. Ticks delivered while the
    /// session is not running, the first tick after starting or resuming,
    /// and timestamps that do not advance produce nothing.
    pub fn tick(&mut self, timestamp: Duration) -> Vec<Event> {
        match self.clock.advance(timestamp) {
            Some(dt) => self.step(dt),
            None => Vec::new(),
        }
    }

    fn step(&mut self, dt: Duration) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::Tick { dt }, &mut events);

        let mut commands = Vec::new();
        if query::outcome(&self.world).is_none() {
            self.scheduler
                .handle(&events, query::grid(&self.world), self.castle, &mut commands);
        }
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }

        world::apply(&mut self.world, Command::EvaluateOutcome, &mut events);
        events
    }

    /// Builds a level one tower of `kind` on `cell`.
    ///
    /// # Errors
    ///
    /// Returns the [`TowerError`] describing why the world rejected the
    /// request; the session is left untouched in that case.
    pub fn build_tower(&mut self, kind: TowerKind, cell: CellCoord) -> Result<Vec<Event>, TowerError> {
        self.tower_command(Command::BuildTower { kind, cell })
    }

    /// Sells the tower on `cell` for the cost of its current tier.
    ///
    /// # Errors
    ///
    /// Returns the [`TowerError`] describing why the world rejected the
    /// request.
    pub fn sell_tower(&mut self, cell: CellCoord) -> Result<Vec<Event>, TowerError> {
        self.tower_command(Command::SellTower { cell })
    }

    /// Upgrades the tower on `cell` by one level.
    ///
    /// # Errors
    ///
    /// Returns the [`TowerError`] describing why the world rejected the
    /// request.
    pub fn upgrade_tower(&mut self, cell: CellCoord) -> Result<Vec<Event>, TowerError> {
        self.tower_command(Command::UpgradeTower { cell })
    }

    fn tower_command(&mut self, command: Command) -> Result<Vec<Event>, TowerError> {
        let mut events = Vec::new();
        world::apply(&mut self.world, command, &mut events);
        let rejection = events.iter().find_map(|event| match event {
            Event::TowerActionRejected { reason, .. } => Some(*reason),
            _ => None,
        });
        match rejection {
            Some(reason) => Err(reason),
            None => Ok(events),
        }
    }

    /// Spawns the pending wave group on the next effective tick.
    pub fn skip_wave(&mut self) {
        self.scheduler.request_skip();
    }

    /// Removes hit points from an enemy; it is removed on the next tick once depleted.
    pub fn damage_enemy(&mut self, enemy: EntityId, amount: u32) {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::DamageEnemy { enemy, amount }, &mut events);
    }

    /// Collects a gold pickup, returning the resulting events.
    pub fn collect_pickup(&mut self, pickup: EntityId) -> Vec<Event> {
        let mut events = Vec::new();
        world::apply(&mut self.world, Command::CollectPickup { pickup }, &mut events);
        events
    }

    /// Positions and kinds of every live entity.
    #[must_use]
    pub fn snapshot(&self) -> EntityView {
        query::entity_view(&self.world)
    }

    /// Every tower on the map.
    #[must_use]
    pub fn towers(&self) -> Vec<TowerSnapshot> {
        query::towers(&self.world)
    }

    /// Terrain the session is played on.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        query::grid(&self.world)
    }

    /// Cell enemies walk toward.
    #[must_use]
    pub const fn castle(&self) -> CellCoord {
        self.castle
    }

    /// Player economy.
    #[must_use]
    pub fn player(&self) -> &PlayerState {
        query::player(&self.world)
    }

    /// Gold currently available.
    #[must_use]
    pub fn gold(&self) -> Gold {
        query::gold(&self.world)
    }

    /// Lives remaining.
    #[must_use]
    pub fn lives(&self) -> u32 {
        query::lives(&self.world)
    }

    /// Most recently started wave.
    #[must_use]
    pub fn current_wave(&self) -> Option<WaveIndex> {
        query::current_wave(&self.world)
    }

    /// Terminal outcome, once decided.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        query::outcome(&self.world)
    }

    /// Scoring summary of the current state.
    #[must_use]
    pub fn summary(&self) -> LevelSummary {
        query::summary(&self.world)
    }
}
