#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Castle Defence engine.
//!
//! This crate defines the message surface that connects the driver, the
//! authoritative world, and pure systems. Drivers submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to. Systems consume event streams, query immutable data such as the
//! [`Grid`], and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Grid weight marking an edge cell that may emit enemies.
pub const SPAWN_WEIGHT: u32 = 8;
/// Grid weight marking the castle cell enemies try to reach.
pub const CASTLE_WEIGHT: u32 = 9;
/// Weight carried by road cells and the constant used to invert path costs.
///
/// Higher terrain weight is cheaper to cross, so road cells cost nothing
/// beyond the random noise added during search.
pub const ROAD_WEIGHT: u32 = 10;
/// Highest level a tower can be upgraded to.
pub const MAX_TOWER_LEVEL: u8 = 3;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances every live entity by the provided simulated duration.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that an enemy enter the map following the provided route.
    SpawnEnemy {
        /// Kind of enemy to create.
        kind: EnemyKind,
        /// Route assigned to the enemy. An empty route discards the enemy.
        route: Route,
    },
    /// Records that the scheduler started spawning the provided wave.
    BeginWave {
        /// Zero-based index of the wave within the level configuration.
        wave: WaveIndex,
    },
    /// Records that every configured wave has fully spawned.
    ConcludeWaves,
    /// Requests construction of a tower on the provided cell.
    BuildTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Cell the tower should occupy.
        cell: CellCoord,
    },
    /// Requests that the tower on the provided cell be sold.
    SellTower {
        /// Cell occupied by the tower.
        cell: CellCoord,
    },
    /// Requests that the tower on the provided cell be upgraded one level.
    UpgradeTower {
        /// Cell occupied by the tower.
        cell: CellCoord,
    },
    /// Removes hit points from an enemy.
    DamageEnemy {
        /// Identifier of the enemy receiving damage.
        enemy: EntityId,
        /// Hit points to remove.
        amount: u32,
    },
    /// Collects a gold pickup, crediting its value to the player.
    CollectPickup {
        /// Identifier of the pickup entity.
        pickup: EntityId,
    },
    /// Checks whether the level reached victory or defeat.
    EvaluateOutcome,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the map.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EntityId,
        /// Kind of enemy that spawned.
        kind: EnemyKind,
        /// Cell the enemy appeared on.
        cell: CellCoord,
    },
    /// Reports that an enemy could not be spawned because its route was empty.
    EnemyDiscarded {
        /// Kind of enemy that was dropped.
        kind: EnemyKind,
    },
    /// Reports that an enemy walked to the end of its route.
    EnemyReachedGoal {
        /// Identifier of the enemy.
        enemy: EntityId,
    },
    /// Reports that an enemy ran out of hit points.
    EnemyDefeated {
        /// Identifier of the enemy.
        enemy: EntityId,
        /// Kind of the defeated enemy.
        kind: EnemyKind,
    },
    /// Reports that the player lost a life.
    LifeLost {
        /// Lives remaining after the deduction.
        remaining: u32,
    },
    /// Confirms that an entity left the registry.
    EntityRemoved {
        /// Identifier of the removed entity.
        entity: EntityId,
    },
    /// Announces that the scheduler began spawning a wave.
    WaveStarted {
        /// Zero-based index of the wave.
        wave: WaveIndex,
    },
    /// Announces that no configured waves remain.
    WavesExhausted,
    /// Confirms that a tower was constructed.
    TowerBuilt {
        /// Identifier of the tower entity.
        tower: EntityId,
        /// Type of tower that was built.
        kind: TowerKind,
        /// Cell occupied by the tower.
        cell: CellCoord,
    },
    /// Confirms that a tower gained a level.
    TowerUpgraded {
        /// Identifier of the tower entity.
        tower: EntityId,
        /// Cell occupied by the tower.
        cell: CellCoord,
        /// Level reached by the upgrade.
        level: u8,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Identifier of the removed tower entity.
        tower: EntityId,
        /// Cell the tower used to occupy.
        cell: CellCoord,
        /// Gold returned to the player.
        refund: Gold,
    },
    /// Reports that a tower request was rejected without mutating state.
    TowerActionRejected {
        /// Action that was requested.
        action: TowerAction,
        /// Cell targeted by the action.
        cell: CellCoord,
        /// Specific reason the request failed.
        reason: TowerError,
    },
    /// Announces the player's gold after a change.
    GoldChanged {
        /// Gold currently available.
        gold: Gold,
    },
    /// Confirms that a pickup was collected.
    PickupCollected {
        /// Identifier of the collected pickup.
        pickup: EntityId,
        /// Gold credited by the pickup.
        gold: Gold,
    },
    /// Terminal notification: every wave was cleared.
    Victory {
        /// Final state used for scoring.
        summary: LevelSummary,
    },
    /// Terminal notification: the player ran out of lives.
    Defeat {
        /// Final state used for scoring.
        summary: LevelSummary,
    },
}

/// Tower requests that may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TowerAction {
    /// Construction of a new tower of the provided kind.
    Build(TowerKind),
    /// Sale of an existing tower.
    Sell,
    /// Upgrade of an existing tower.
    Upgrade,
}

/// Reasons a tower request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum TowerError {
    /// The cell lies outside the grid.
    #[error("cell lies outside the map")]
    OutOfBounds,
    /// The cell carries a road, spawn or castle marker.
    #[error("towers cannot be built on this cell")]
    Ineligible,
    /// Another tower already occupies the cell.
    #[error("cell already holds a tower")]
    Occupied,
    /// No tower occupies the cell.
    #[error("no tower on this cell")]
    NoTower,
    /// The tower already reached [`MAX_TOWER_LEVEL`].
    #[error("tower is already at the maximum level")]
    MaxLevel,
    /// The player cannot afford the action.
    #[error("insufficient gold: {required} required, {available} available")]
    InsufficientGold {
        /// Gold the action costs.
        required: Gold,
        /// Gold the player holds.
        available: Gold,
    },
    /// Victory or defeat was already decided.
    #[error("the level has already concluded")]
    LevelConcluded,
}

/// Reasons a gold spend may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum EconomyError {
    /// The player holds less gold than the spend requires.
    #[error("insufficient gold: {required} required, {available} available")]
    InsufficientGold {
        /// Gold the spend requires.
        required: Gold,
        /// Gold the player holds.
        available: Gold,
    },
}

impl From<EconomyError> for TowerError {
    fn from(error: EconomyError) -> Self {
        match error {
            EconomyError::InsufficientGold {
                required,
                available,
            } => Self::InsufficientGold {
                required,
                available,
            },
        }
    }
}

/// Configuration problems that prevent a level from starting.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The grid has no rows or no columns.
    #[error("grid must contain at least one cell")]
    EmptyGrid,
    /// A grid row does not match the width of the first row.
    #[error("grid row {row} has {found} cells, expected {expected}")]
    RaggedGrid {
        /// Zero-based row index.
        row: u32,
        /// Width of the first row.
        expected: u32,
        /// Width of the offending row.
        found: u32,
    },
    /// A cell weight exceeds [`ROAD_WEIGHT`].
    #[error("cell ({column}, {row}) has weight {weight}, maximum is {max}", max = ROAD_WEIGHT)]
    WeightOutOfRange {
        /// Column of the offending cell.
        column: u32,
        /// Row of the offending cell.
        row: u32,
        /// Weight found in the cell.
        weight: u32,
    },
    /// No edge cell carries [`SPAWN_WEIGHT`].
    #[error("map has no spawn cell on its edge")]
    MissingSpawnPoint,
    /// No cell carries [`CASTLE_WEIGHT`].
    #[error("map has no castle cell")]
    MissingCastle,
    /// The level declares no waves.
    #[error("level declares no waves")]
    NoWaves,
    /// The level starts with zero lives.
    #[error("level must start with at least one life")]
    NoLives,
    /// The delay before the first wave is negative or not finite.
    #[error("level has an invalid initial delay")]
    InvalidInitialDelay,
    /// A group delay is negative or not finite.
    #[error("wave {wave} group {group} has an invalid delay")]
    InvalidDelay {
        /// Zero-based wave index.
        wave: usize,
        /// Zero-based group index.
        group: usize,
    },
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Continuous position measured in tiles; cell `(x, y)` is centred on `(x, y)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Creates a position from explicit coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Centre of the provided cell.
    #[must_use]
    pub fn of_cell(cell: CellCoord) -> Self {
        Self::new(cell.column() as f32, cell.row() as f32)
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance_to(self, other: Position) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Integer-weighted terrain describing traversal cost per cell.
///
/// A weight of zero is impassable. [`SPAWN_WEIGHT`], [`CASTLE_WEIGHT`] and
/// [`ROAD_WEIGHT`] double as semantic markers. The grid is validated once at
/// load time and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    weights: Vec<u32>,
}

impl Grid {
    /// Builds a grid from row-major weight rows.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the rows are empty, ragged, or contain a
    /// weight above [`ROAD_WEIGHT`].
    pub fn from_rows(rows: &[Vec<u32>]) -> Result<Self, ConfigError> {
        let Some(first) = rows.first() else {
            return Err(ConfigError::EmptyGrid);
        };
        if first.is_empty() {
            return Err(ConfigError::EmptyGrid);
        }

        let columns = u32::try_from(first.len()).map_err(|_| ConfigError::EmptyGrid)?;
        let row_count = u32::try_from(rows.len()).map_err(|_| ConfigError::EmptyGrid)?;
        let mut weights = Vec::with_capacity(first.len() * rows.len());

        for (row_index, row) in (0..row_count).zip(rows) {
            let found = u32::try_from(row.len()).unwrap_or(u32::MAX);
            if found != columns {
                return Err(ConfigError::RaggedGrid {
                    row: row_index,
                    expected: columns,
                    found,
                });
            }

            for (column_index, &weight) in (0..columns).zip(row) {
                if weight > ROAD_WEIGHT {
                    return Err(ConfigError::WeightOutOfRange {
                        column: column_index,
                        row: row_index,
                        weight,
                    });
                }
                weights.push(weight);
            }
        }

        Ok(Self {
            columns,
            rows: row_count,
            weights,
        })
    }

    /// Builds a grid where every cell carries the same weight.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for empty dimensions or an out-of-range weight.
    pub fn uniform(columns: u32, rows: u32, weight: u32) -> Result<Self, ConfigError> {
        let width = usize::try_from(columns).map_err(|_| ConfigError::EmptyGrid)?;
        let height = usize::try_from(rows).map_err(|_| ConfigError::EmptyGrid)?;
        Self::from_rows(&vec![vec![weight; width]; height])
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Reports whether the cell lies within the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Reports whether the cell lies on the outer border of the grid.
    #[must_use]
    pub fn is_edge(&self, cell: CellCoord) -> bool {
        self.contains(cell)
            && (cell.column() == 0
                || cell.row() == 0
                || cell.column() + 1 == self.columns
                || cell.row() + 1 == self.rows)
    }

    /// Weight stored for the cell, if it lies within the grid.
    #[must_use]
    pub fn weight(&self, cell: CellCoord) -> Option<u32> {
        self.index(cell)
            .and_then(|index| self.weights.get(index).copied())
    }

    /// Weight stored at a dense row-major index.
    #[must_use]
    pub fn weight_at(&self, index: usize) -> Option<u32> {
        self.weights.get(index).copied()
    }

    /// Number of cells in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Reports whether the grid holds no cells. Validated grids never do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Dense row-major index of the cell, if it lies within the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Cell located at a dense row-major index.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> Option<CellCoord> {
        if index >= self.weights.len() {
            return None;
        }
        let width = usize::try_from(self.columns).ok()?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// Iterator over every cell and its weight in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, u32)> + '_ {
        self.weights
            .iter()
            .enumerate()
            .filter_map(|(index, &weight)| self.cell_at(index).map(|cell| (cell, weight)))
    }
}

/// Ordered sequence of cells an enemy walks.
///
/// An empty route signals that the goal was unreachable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Route {
    cells: Vec<CellCoord>,
}

impl Route {
    /// Wraps the provided cells into a route.
    #[must_use]
    pub fn new(cells: Vec<CellCoord>) -> Self {
        Self { cells }
    }

    /// Route that signals an unreachable goal.
    #[must_use]
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Cells composing the route.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Number of cells in the route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the route is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at the provided position in the route.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<CellCoord> {
        self.cells.get(index).copied()
    }

    /// First cell of the route.
    #[must_use]
    pub fn first(&self) -> Option<CellCoord> {
        self.cells.first().copied()
    }

    /// Last cell of the route.
    #[must_use]
    pub fn last(&self) -> Option<CellCoord> {
        self.cells.last().copied()
    }
}

/// Unique identifier assigned to an entity by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Zero-based position of a wave in the level configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaveIndex(u32);

impl WaveIndex {
    /// Creates a new wave index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Amount of gold.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Gold(u32);

impl Gold {
    /// No gold.
    pub const ZERO: Self = Self(0);

    /// Wraps the provided amount.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric amount.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Adds two amounts, saturating at the numeric bound.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtracts `other`, returning `None` if the result would be negative.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(value) => Some(Self(value)),
            None => None,
        }
    }
}

impl std::fmt::Display for Gold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}g", self.0)
    }
}

/// Hit points of an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Health(u32);

impl Health {
    /// Depleted hit points.
    pub const ZERO: Self = Self(0);

    /// Wraps the provided hit points.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric hit points.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Reports whether no hit points remain.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Removes `amount` hit points, clamping at zero.
    #[must_use]
    pub const fn saturating_sub(self, amount: u32) -> Self {
        Self(self.0.saturating_sub(amount))
    }
}

/// Kinds of enemies a wave can contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Fast, fragile raider.
    Goblin,
    /// Slow, sturdy brute.
    Orc,
    /// Very fast runner with little health.
    Wolf,
    /// Slowest and toughest enemy.
    Troll,
}

impl EnemyKind {
    /// Hit points an enemy of this kind spawns with.
    #[must_use]
    pub const fn hit_points(self) -> Health {
        match self {
            Self::Goblin => Health::new(30),
            Self::Orc => Health::new(80),
            Self::Wolf => Health::new(20),
            Self::Troll => Health::new(200),
        }
    }

    /// Walking speed measured in tiles per second.
    #[must_use]
    pub const fn speed(self) -> f32 {
        match self {
            Self::Goblin => 1.5,
            Self::Orc => 1.0,
            Self::Wolf => 2.5,
            Self::Troll => 0.6,
        }
    }

    /// Gold dropped when the enemy is defeated.
    #[must_use]
    pub const fn bounty(self) -> Gold {
        match self {
            Self::Goblin => Gold::new(5),
            Self::Orc => Gold::new(12),
            Self::Wolf => Gold::new(6),
            Self::Troll => Gold::new(30),
        }
    }
}

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Cheap long-range tower.
    Archer,
    /// Expensive, sturdy short-range tower.
    Cannon,
    /// Balanced tower with the longest reach.
    Mage,
}

impl TowerKind {
    /// Combat statistics and cost for the provided level.
    ///
    /// Level zero means "not built" and, like levels above
    /// [`MAX_TOWER_LEVEL`], has no statistics.
    #[must_use]
    pub const fn stats(self, level: u8) -> Option<TowerStats> {
        let (cost, hit_points, damage, range) = match (self, level) {
            (Self::Archer, 1) => (70, 100, 8, 3.0),
            (Self::Archer, 2) => (110, 140, 12, 3.5),
            (Self::Archer, 3) => (160, 180, 18, 4.0),
            (Self::Cannon, 1) => (120, 160, 20, 2.5),
            (Self::Cannon, 2) => (180, 220, 32, 2.75),
            (Self::Cannon, 3) => (260, 300, 50, 3.0),
            (Self::Mage, 1) => (100, 80, 14, 3.5),
            (Self::Mage, 2) => (150, 110, 22, 4.0),
            (Self::Mage, 3) => (220, 150, 34, 4.5),
            _ => return None,
        };
        Some(TowerStats {
            cost: Gold::new(cost),
            hit_points: Health::new(hit_points),
            damage,
            range,
        })
    }

    /// Gold required to build a level one tower.
    #[must_use]
    pub const fn build_cost(self) -> Gold {
        match self.stats(1) {
            Some(stats) => stats.cost,
            None => Gold::ZERO,
        }
    }
}

/// Combat statistics of a tower at a given level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerStats {
    /// Gold paid for this tier; also the refund when sold at this tier.
    pub cost: Gold,
    /// Hit points of the tower.
    pub hit_points: Health,
    /// Damage per attack.
    pub damage: u32,
    /// Attack radius measured in tiles.
    pub range: f32,
}

/// Short-lived visual effects tracked by the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffectKind {
    /// Left behind by a defeated enemy.
    Explosion,
    /// Left behind by tower construction or sale.
    Dust,
}

impl EffectKind {
    /// Duration of the effect's animation.
    #[must_use]
    pub const fn lifetime(self) -> Duration {
        match self {
            Self::Explosion => Duration::from_millis(600),
            Self::Dust => Duration::from_millis(400),
        }
    }
}

/// Horizontal direction an enemy faces while walking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Walking toward decreasing columns.
    Left,
    /// Walking toward increasing columns.
    #[default]
    Right,
}

/// Category of an entity together with its kind-specific tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityClass {
    /// A walking enemy.
    Enemy {
        /// Kind of enemy.
        kind: EnemyKind,
        /// Direction the enemy faces.
        facing: Facing,
    },
    /// A stationary tower.
    Tower {
        /// Kind of tower.
        kind: TowerKind,
        /// Current upgrade level.
        level: u8,
    },
    /// A transient effect.
    Effect {
        /// Kind of effect.
        kind: EffectKind,
    },
    /// A collectable gold pickup.
    Pickup {
        /// Gold credited on collection.
        gold: Gold,
    },
}

/// Immutable representation of a single entity used for rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Identifier of the entity.
    pub id: EntityId,
    /// Category and kind of the entity.
    pub class: EntityClass,
    /// Current continuous position.
    pub position: Position,
    /// Remaining hit points.
    pub hit_points: Health,
}

/// Read-only snapshot describing every live entity.
#[derive(Clone, Debug, Default)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Creates a new entity view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no entity was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EntitySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a tower used for range indicators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier of the tower entity.
    pub id: EntityId,
    /// Kind of tower.
    pub kind: TowerKind,
    /// Cell occupied by the tower.
    pub cell: CellCoord,
    /// Current upgrade level.
    pub level: u8,
    /// Statistics for the current level.
    pub stats: TowerStats,
}

/// Number of enemies of one kind inside a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyCount {
    /// Kind of enemy.
    pub kind: EnemyKind,
    /// How many enemies of this kind spawn.
    pub count: u32,
}

/// Enemies that spawn together, followed by a delay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyGroup {
    /// Enemy counts per kind.
    pub enemies: Vec<EnemyCount>,
    /// Seconds to wait after the group spawned before the next one.
    #[serde(default)]
    pub delay_secs: f32,
}

impl EnemyGroup {
    /// Total number of enemies in the group.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.enemies
            .iter()
            .fold(0u32, |total, entry| total.saturating_add(entry.count))
    }

    /// Delay after the group as a duration; invalid values collapse to zero.
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::try_from_secs_f32(self.delay_secs).unwrap_or(Duration::ZERO)
    }
}

/// Ordered list of enemy groups.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    /// Groups spawned one after another.
    pub groups: Vec<EnemyGroup>,
}

impl Wave {
    /// Total number of enemies across all groups.
    #[must_use]
    pub fn total_enemies(&self) -> u32 {
        self.groups
            .iter()
            .fold(0u32, |total, group| total.saturating_add(group.total()))
    }
}

/// Declarative description of a level handed over by the loading layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Identifier of the map the level is played on.
    pub map: String,
    /// Gold available at the start.
    pub starting_gold: Gold,
    /// Lives available at the start; also the maximum.
    pub starting_lives: u32,
    /// Seconds before the first wave spawns.
    #[serde(default)]
    pub initial_delay_secs: f32,
    /// Waves in spawning order.
    pub waves: Vec<Wave>,
}

impl LevelConfig {
    /// Verifies that the level can start.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when no waves are declared, the level has no
    /// lives, or a delay is negative or not finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.waves.is_empty() {
            return Err(ConfigError::NoWaves);
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::NoLives);
        }
        if !valid_delay(self.initial_delay_secs) {
            return Err(ConfigError::InvalidInitialDelay);
        }
        for (wave_index, wave) in self.waves.iter().enumerate() {
            for (group_index, group) in wave.groups.iter().enumerate() {
                if !valid_delay(group.delay_secs) {
                    return Err(ConfigError::InvalidDelay {
                        wave: wave_index,
                        group: group_index,
                    });
                }
            }
        }
        Ok(())
    }

    /// Delay before the first wave as a duration.
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::try_from_secs_f32(self.initial_delay_secs).unwrap_or(Duration::ZERO)
    }
}

fn valid_delay(seconds: f32) -> bool {
    seconds.is_finite() && seconds >= 0.0
}

/// Terminal result of a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Every wave was cleared with lives remaining.
    Victory,
    /// The player ran out of lives.
    Defeat,
}

/// Final player state required to score a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LevelSummary {
    /// Lives remaining at the end.
    pub final_lives: u32,
    /// Lives available at the start.
    pub max_lives: u32,
    /// Cumulative gold spent.
    pub gold_spent: Gold,
    /// Gold available at the start.
    pub starting_gold: Gold,
}

impl LevelSummary {
    /// Star rating earned by the player.
    ///
    /// One star is always awarded. Two stars require more than half of the
    /// lives to survive. Three stars require every life to survive and at most
    /// half of the starting gold to be spent.
    #[must_use]
    pub fn stars(&self) -> u8 {
        let lives = u64::from(self.final_lives);
        let max_lives = u64::from(self.max_lives);
        let spent = u64::from(self.gold_spent.get());
        let starting = u64::from(self.starting_gold.get());

        if lives == max_lives && spent * 2 <= starting {
            3
        } else if lives * 2 > max_lives {
            2
        } else {
            1
        }
    }
}
