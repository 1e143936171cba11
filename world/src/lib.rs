#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Castle Defence.
//!
//! The world owns the terrain grid, every live entity, the tower placement
//! registry and the player's economy. It is mutated exclusively through
//! [`apply`] and observed through the [`query`] module.

mod economy;
mod entities;
mod towers;

use std::time::Duration;

use castle_defence_core::{
    CellCoord, Command, EffectKind, EnemyKind, EntityId, Event, Gold, Grid, Outcome, Position,
    Route, TowerAction, TowerError, TowerKind, WaveIndex, MAX_TOWER_LEVEL,
};
use castle_defence_system_movement::RouteFollower;
use tracing::{debug, info, warn};

pub use economy::PlayerState;
use entities::{EnemyState, Entity, EntityKind, EntityRegistry, RemovalCause, TowerState};
use towers::TowerRegistry;

/// Represents the authoritative Castle Defence world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    entities: EntityRegistry,
    towers: TowerRegistry,
    player: PlayerState,
    current_wave: Option<WaveIndex>,
    waves_exhausted: bool,
    outcome: Option<Outcome>,
    tick_index: u64,
}

impl World {
    /// Creates a world for the provided terrain and starting economy.
    #[must_use]
    pub fn new(grid: Grid, starting_gold: Gold, starting_lives: u32) -> Self {
        Self {
            grid,
            entities: EntityRegistry::new(),
            towers: TowerRegistry::new(),
            player: PlayerState::new(starting_gold, starting_lives),
            current_wave: None,
            waves_exhausted: false,
            outcome: None,
            tick_index: 0,
        }
    }

    fn concluded(&self) -> bool {
        self.outcome.is_some()
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if dt.is_zero() || self.concluded() {
            return;
        }

        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        let grid = &self.grid;
        let mut removals = Vec::new();
        for entity in self.entities.iter_mut() {
            if !entity.is_active() {
                continue;
            }
            if let Some(cause) = entity.update(dt, grid) {
                removals.push((entity.id, cause));
            }
        }

        for (id, cause) in removals {
            if let Some(entity) = self.entities.remove(id) {
                self.finish_removal(entity, cause, out_events);
            }
        }
    }

    fn finish_removal(&mut self, entity: Entity, cause: RemovalCause, out_events: &mut Vec<Event>) {
        let Entity {
            id, position, kind, ..
        } = entity;

        match (kind, cause) {
            (EntityKind::Enemy(_), RemovalCause::ReachedGoal) => {
                out_events.push(Event::EnemyReachedGoal { enemy: id });
                if self.player.lose_life() {
                    debug!(enemy = id.get(), lives = self.player.lives(), "enemy reached the castle");
                    out_events.push(Event::LifeLost {
                        remaining: self.player.lives(),
                    });
                }
            }
            (EntityKind::Enemy(enemy), RemovalCause::Depleted) => {
                debug!(enemy = id.get(), kind = ?enemy.kind, "enemy defeated");
                out_events.push(Event::EnemyDefeated {
                    enemy: id,
                    kind: enemy.kind,
                });
                let _ = self.entities.spawn_effect(EffectKind::Explosion, position);
                let _ = self.entities.spawn_pickup(enemy.kind.bounty(), position);
            }
            (EntityKind::Enemy(enemy), RemovalCause::OffMap) => {
                warn!(enemy = id.get(), kind = ?enemy.kind, "enemy left the map");
            }
            (EntityKind::Tower(tower), _) => {
                let _ = self.towers.vacate(tower.cell);
            }
            _ => {}
        }

        out_events.push(Event::EntityRemoved { entity: id });
    }

    fn spawn_enemy(&mut self, kind: EnemyKind, route: Route, out_events: &mut Vec<Event>) {
        if self.concluded() {
            debug!(?kind, "ignoring spawn after the level concluded");
            return;
        }

        let Some((cell, follower)) = route.first().zip(RouteFollower::new(route)) else {
            warn!(?kind, "discarding enemy without a route");
            out_events.push(Event::EnemyDiscarded { kind });
            return;
        };

        let enemy = self.entities.insert(
            follower.position(),
            kind.hit_points(),
            EntityKind::Enemy(EnemyState { kind, follower }),
        );
        debug!(enemy = enemy.get(), ?kind, ?cell, "enemy spawned");
        out_events.push(Event::EnemySpawned { enemy, kind, cell });
    }

    fn build_tower(
        &mut self,
        kind: TowerKind,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<(), TowerError> {
        if self.concluded() {
            return Err(TowerError::LevelConcluded);
        }
        self.towers.check_buildable(&self.grid, cell)?;
        let stats = kind.stats(1).ok_or(TowerError::Ineligible)?;
        self.player.spend_gold(stats.cost)?;

        let position = Position::of_cell(cell);
        let tower = self.entities.insert(
            position,
            stats.hit_points,
            EntityKind::Tower(TowerState {
                kind,
                cell,
                level: 1,
                stats,
            }),
        );
        self.towers.occupy(cell, tower);
        let _ = self.entities.spawn_effect(EffectKind::Dust, position);

        debug!(tower = tower.get(), ?kind, ?cell, cost = %stats.cost, "tower built");
        out_events.push(Event::TowerBuilt { tower, kind, cell });
        out_events.push(Event::GoldChanged {
            gold: self.player.gold(),
        });
        Ok(())
    }

    fn sell_tower(&mut self, cell: CellCoord, out_events: &mut Vec<Event>) -> Result<(), TowerError> {
        if self.concluded() {
            return Err(TowerError::LevelConcluded);
        }
        let tower = self.towers.occupant(cell).ok_or(TowerError::NoTower)?;
        let refund = self
            .entities
            .get(tower)
            .and_then(Entity::tower_snapshot)
            .map(|snapshot| snapshot.stats.cost)
            .ok_or(TowerError::NoTower)?;

        let _ = self.towers.vacate(cell);
        let _ = self.entities.remove(tower);
        self.player.add_gold(refund);
        let _ = self
            .entities
            .spawn_effect(EffectKind::Dust, Position::of_cell(cell));

        debug!(tower = tower.get(), ?cell, %refund, "tower sold");
        out_events.push(Event::TowerSold {
            tower,
            cell,
            refund,
        });
        out_events.push(Event::GoldChanged {
            gold: self.player.gold(),
        });
        out_events.push(Event::EntityRemoved { entity: tower });
        Ok(())
    }

    fn upgrade_tower(
        &mut self,
        cell: CellCoord,
        out_events: &mut Vec<Event>,
    ) -> Result<(), TowerError> {
        if self.concluded() {
            return Err(TowerError::LevelConcluded);
        }
        let tower = self.towers.occupant(cell).ok_or(TowerError::NoTower)?;
        let current = self
            .entities
            .get(tower)
            .and_then(Entity::tower_snapshot)
            .ok_or(TowerError::NoTower)?;
        if current.level >= MAX_TOWER_LEVEL {
            return Err(TowerError::MaxLevel);
        }
        let level = current.level + 1;
        let stats = current.kind.stats(level).ok_or(TowerError::MaxLevel)?;
        self.player.spend_gold(stats.cost)?;

        if let Some(entity) = self.entities.get_mut(tower) {
            if let EntityKind::Tower(state) = &mut entity.kind {
                state.level = level;
                state.stats = stats;
            }
            entity.hit_points = stats.hit_points;
        }

        debug!(tower = tower.get(), ?cell, level, cost = %stats.cost, "tower upgraded");
        out_events.push(Event::TowerUpgraded { tower, cell, level });
        out_events.push(Event::GoldChanged {
            gold: self.player.gold(),
        });
        Ok(())
    }

    fn damage_enemy(&mut self, enemy: EntityId, amount: u32) {
        if self.concluded() {
            return;
        }
        match self.entities.get_mut(enemy) {
            Some(entity) if entity.is_active() && entity.is_enemy() => {
                entity.hit_points = entity.hit_points.saturating_sub(amount);
            }
            _ => debug!(enemy = enemy.get(), "ignoring damage for unknown enemy"),
        }
    }

    fn collect_pickup(&mut self, pickup: EntityId, out_events: &mut Vec<Event>) {
        if self.concluded() {
            return;
        }
        let gold = self
            .entities
            .get(pickup)
            .filter(|entity| entity.is_active())
            .and_then(|entity| match &entity.kind {
                EntityKind::Pickup(state) => Some(state.gold),
                _ => None,
            });
        let Some(gold) = gold else {
            debug!(pickup = pickup.get(), "ignoring collection of unknown pickup");
            return;
        };

        let _ = self.entities.remove(pickup);
        self.player.add_gold(gold);
        out_events.push(Event::PickupCollected { pickup, gold });
        out_events.push(Event::GoldChanged {
            gold: self.player.gold(),
        });
        out_events.push(Event::EntityRemoved { entity: pickup });
    }

    fn evaluate_outcome(&mut self, out_events: &mut Vec<Event>) {
        if self.concluded() {
            return;
        }

        let outcome = if self.player.lives() == 0 {
            Outcome::Defeat
        } else if self.waves_exhausted && self.entities.enemy_count() == 0 {
            Outcome::Victory
        } else {
            return;
        };

        self.outcome = Some(outcome);
        let summary = self.player.summary();
        info!(
            ?outcome,
            lives = summary.final_lives,
            gold_spent = %summary.gold_spent,
            stars = summary.stars(),
            "level concluded"
        );
        out_events.push(match outcome {
            Outcome::Victory => Event::Victory { summary },
            Outcome::Defeat => Event::Defeat { summary },
        });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SpawnEnemy { kind, route } => world.spawn_enemy(kind, route, out_events),
        Command::BeginWave { wave } => {
            world.current_wave = Some(wave);
            info!(wave = wave.get(), "wave started");
            out_events.push(Event::WaveStarted { wave });
        }
        Command::ConcludeWaves => {
            if !world.waves_exhausted {
                world.waves_exhausted = true;
                info!("every wave has spawned");
                out_events.push(Event::WavesExhausted);
            }
        }
        Command::BuildTower { kind, cell } => {
            let result = world.build_tower(kind, cell, out_events);
            report_rejection(result, TowerAction::Build(kind), cell, out_events);
        }
        Command::SellTower { cell } => {
            let result = world.sell_tower(cell, out_events);
            report_rejection(result, TowerAction::Sell, cell, out_events);
        }
        Command::UpgradeTower { cell } => {
            let result = world.upgrade_tower(cell, out_events);
            report_rejection(result, TowerAction::Upgrade, cell, out_events);
        }
        Command::DamageEnemy { enemy, amount } => world.damage_enemy(enemy, amount),
        Command::CollectPickup { pickup } => world.collect_pickup(pickup, out_events),
        Command::EvaluateOutcome => world.evaluate_outcome(out_events),
    }
}

fn report_rejection(
    result: Result<(), TowerError>,
    action: TowerAction,
    cell: CellCoord,
    out_events: &mut Vec<Event>,
) {
    if let Err(reason) = result {
        debug!(?action, ?cell, %reason, "tower action rejected");
        out_events.push(Event::TowerActionRejected {
            action,
            cell,
            reason,
        });
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{PlayerState, World};
    use castle_defence_core::{
        CellCoord, EntityView, Gold, Grid, LevelSummary, Outcome, TowerSnapshot, WaveIndex,
    };

    /// Provides read-only access to the terrain grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Provides read-only access to the player's economy.
    #[must_use]
    pub fn player(world: &World) -> &PlayerState {
        &world.player
    }

    /// Gold currently available to the player.
    #[must_use]
    pub fn gold(world: &World) -> Gold {
        world.player.gold()
    }

    /// Lives the player has left.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.player.lives()
    }

    /// Wave most recently started, if any.
    #[must_use]
    pub fn current_wave(world: &World) -> Option<WaveIndex> {
        world.current_wave
    }

    /// Reports whether every configured wave has spawned.
    #[must_use]
    pub fn waves_exhausted(world: &World) -> bool {
        world.waves_exhausted
    }

    /// Terminal outcome, once decided.
    #[must_use]
    pub fn outcome(world: &World) -> Option<Outcome> {
        world.outcome
    }

    /// Scoring summary of the player's current state.
    #[must_use]
    pub fn summary(world: &World) -> LevelSummary {
        world.player.summary()
    }

    /// Number of enemies currently registered.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.entities.enemy_count()
    }

    /// Number of effective ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a read-only view of every live entity.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        EntityView::from_snapshots(
            world
                .entities
                .iter()
                .filter(|entity| entity.is_active())
                .map(|entity| entity.snapshot())
                .collect(),
        )
    }

    /// Tower standing on the provided cell, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: CellCoord) -> Option<TowerSnapshot> {
        let tower = world.towers.occupant(cell)?;
        world.entities.get(tower)?.tower_snapshot()
    }

    /// Every tower on the map in cell order.
    #[must_use]
    pub fn towers(world: &World) -> Vec<TowerSnapshot> {
        world
            .towers
            .iter()
            .filter_map(|tower| world.entities.get(tower))
            .filter_map(|entity| entity.tower_snapshot())
            .collect()
    }
}
