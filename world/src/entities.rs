//! Registry of every live entity and the per-kind update rules.

use std::{collections::BTreeMap, time::Duration};

use castle_defence_core::{
    CellCoord, EffectKind, EnemyKind, EntityClass, EntityId, EntitySnapshot, Gold, Grid, Health,
    Position, TowerKind, TowerSnapshot, TowerStats,
};
use castle_defence_system_movement::{Progress, RouteFollower};

/// How long an uncollected gold pickup stays on the map.
pub(crate) const PICKUP_LIFETIME: Duration = Duration::from_secs(8);

/// Entity stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Entity {
    pub(crate) id: EntityId,
    pub(crate) position: Position,
    pub(crate) hit_points: Health,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) kind: EntityKind,
}

/// Kind-specific state carried by an entity.
#[derive(Clone, Debug)]
pub(crate) enum EntityKind {
    Enemy(EnemyState),
    Tower(TowerState),
    Effect(EffectState),
    Pickup(PickupState),
}

#[derive(Clone, Debug)]
pub(crate) struct EnemyState {
    pub(crate) kind: EnemyKind,
    pub(crate) follower: RouteFollower,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct TowerState {
    pub(crate) kind: TowerKind,
    pub(crate) cell: CellCoord,
    pub(crate) level: u8,
    pub(crate) stats: TowerStats,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct EffectState {
    pub(crate) kind: EffectKind,
    pub(crate) remaining: Duration,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct PickupState {
    pub(crate) gold: Gold,
    pub(crate) remaining: Duration,
}

/// Lifecycle of an entity within a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Lifecycle {
    Active,
    PendingRemoval,
}

/// Reason an entity leaves the registry at the end of a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RemovalCause {
    ReachedGoal,
    Depleted,
    Expired,
    OffMap,
}

impl Entity {
    pub(crate) fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    /// Advances the entity by `dt`, returning why it must be removed, if at all.
    pub(crate) fn update(&mut self, dt: Duration, grid: &Grid) -> Option<RemovalCause> {
        let cause = match &mut self.kind {
            EntityKind::Enemy(enemy) => {
                if self.hit_points.is_zero() {
                    Some(RemovalCause::Depleted)
                } else {
                    let progress = enemy.follower.advance(enemy.kind.speed(), dt);
                    self.position = enemy.follower.position();
                    if progress == Progress::Arrived {
                        Some(RemovalCause::ReachedGoal)
                    } else if !on_map(self.position, grid) {
                        // Only routes handed in through `SpawnEnemy` can leave the grid.
                        Some(RemovalCause::OffMap)
                    } else {
                        None
                    }
                }
            }
            EntityKind::Tower(_) => self.hit_points.is_zero().then_some(RemovalCause::Depleted),
            EntityKind::Effect(effect) => {
                effect.remaining = effect.remaining.saturating_sub(dt);
                effect.remaining.is_zero().then_some(RemovalCause::Expired)
            }
            EntityKind::Pickup(pickup) => {
                pickup.remaining = pickup.remaining.saturating_sub(dt);
                pickup.remaining.is_zero().then_some(RemovalCause::Expired)
            }
        };

        if cause.is_some() {
            self.lifecycle = Lifecycle::PendingRemoval;
        }
        cause
    }

    pub(crate) fn snapshot(&self) -> EntitySnapshot {
        let class = match &self.kind {
            EntityKind::Enemy(enemy) => EntityClass::Enemy {
                kind: enemy.kind,
                facing: enemy.follower.facing(),
            },
            EntityKind::Tower(tower) => EntityClass::Tower {
                kind: tower.kind,
                level: tower.level,
            },
            EntityKind::Effect(effect) => EntityClass::Effect { kind: effect.kind },
            EntityKind::Pickup(pickup) => EntityClass::Pickup { gold: pickup.gold },
        };

        EntitySnapshot {
            id: self.id,
            class,
            position: self.position,
            hit_points: self.hit_points,
        }
    }

    pub(crate) fn tower_snapshot(&self) -> Option<TowerSnapshot> {
        let EntityKind::Tower(tower) = &self.kind else {
            return None;
        };
        Some(TowerSnapshot {
            id: self.id,
            kind: tower.kind,
            cell: tower.cell,
            level: tower.level,
            stats: tower.stats,
        })
    }

    pub(crate) fn is_enemy(&self) -> bool {
        matches!(self.kind, EntityKind::Enemy(_))
    }
}

fn on_map(position: Position, grid: &Grid) -> bool {
    let max_x = grid.columns() as f32 - 0.5;
    let max_y = grid.rows() as f32 - 0.5;
    position.x() >= -0.5 && position.y() >= -0.5 && position.x() <= max_x && position.y() <= max_y
}

/// Registry that stores entities and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct EntityRegistry {
    entries: BTreeMap<EntityId, Entity>,
    next_id: u32,
}

impl EntityRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub(crate) fn insert(
        &mut self,
        position: Position,
        hit_points: Health,
        kind: EntityKind,
    ) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self.entries.insert(
            id,
            Entity {
                id,
                position,
                hit_points,
                lifecycle: Lifecycle::Active,
                kind,
            },
        );
        id
    }

    pub(crate) fn spawn_effect(&mut self, kind: EffectKind, position: Position) -> EntityId {
        self.insert(
            position,
            Health::ZERO,
            EntityKind::Effect(EffectState {
                kind,
                remaining: kind.lifetime(),
            }),
        )
    }

    pub(crate) fn spawn_pickup(&mut self, gold: Gold, position: Position) -> EntityId {
        self.insert(
            position,
            Health::ZERO,
            EntityKind::Pickup(PickupState {
                gold,
                remaining: PICKUP_LIFETIME,
            }),
        )
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entries.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entries.values_mut()
    }

    pub(crate) fn enemy_count(&self) -> usize {
        self.entries.values().filter(|entity| entity.is_enemy()).count()
    }
}
