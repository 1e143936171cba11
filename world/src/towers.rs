//! Authoritative tower placement bookkeeping.

use std::collections::BTreeMap;

use castle_defence_core::{
    CellCoord, EntityId, Grid, TowerError, CASTLE_WEIGHT, ROAD_WEIGHT, SPAWN_WEIGHT,
};

/// Registry that maps occupied cells to the tower entity standing on them.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    cells: BTreeMap<CellCoord, EntityId>,
}

impl TowerRegistry {
    /// Creates an empty tower registry.
    pub(crate) fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
        }
    }

    /// Tower occupying the provided cell, if any.
    pub(crate) fn occupant(&self, cell: CellCoord) -> Option<EntityId> {
        self.cells.get(&cell).copied()
    }

    pub(crate) fn occupy(&mut self, cell: CellCoord, tower: EntityId) {
        let _ = self.cells.insert(cell, tower);
    }

    pub(crate) fn vacate(&mut self, cell: CellCoord) -> Option<EntityId> {
        self.cells.remove(&cell)
    }

    /// Tower identifiers in cell order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.cells.values().copied()
    }

    /// Checks whether a new tower may be placed on `cell`.
    pub(crate) fn check_buildable(&self, grid: &Grid, cell: CellCoord) -> Result<(), TowerError> {
        let weight = grid.weight(cell).ok_or(TowerError::OutOfBounds)?;
        if is_reserved_weight(weight) {
            return Err(TowerError::Ineligible);
        }
        if self.cells.contains_key(&cell) {
            return Err(TowerError::Occupied);
        }
        Ok(())
    }
}

/// Spawn, castle and road cells never hold towers.
fn is_reserved_weight(weight: u32) -> bool {
    matches!(weight, SPAWN_WEIGHT | CASTLE_WEIGHT | ROAD_WEIGHT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_starts_empty() {
        let registry = TowerRegistry::new();
        assert_eq!(registry.iter().count(), 0);
        assert!(registry.occupant(CellCoord::new(0, 0)).is_none());
    }

    #[test]
    fn marker_cells_reject_construction() {
        let grid = Grid::from_rows(&[vec![SPAWN_WEIGHT, ROAD_WEIGHT, CASTLE_WEIGHT, 3, 0]])
            .expect("valid grid");
        let registry = TowerRegistry::new();

        for column in 0..3 {
            assert_eq!(
                registry.check_buildable(&grid, CellCoord::new(column, 0)),
                Err(TowerError::Ineligible)
            );
        }
        assert_eq!(registry.check_buildable(&grid, CellCoord::new(3, 0)), Ok(()));
        assert_eq!(registry.check_buildable(&grid, CellCoord::new(4, 0)), Ok(()));
        assert_eq!(
            registry.check_buildable(&grid, CellCoord::new(5, 0)),
            Err(TowerError::OutOfBounds)
        );
    }

    #[test]
    fn occupied_cells_reject_construction_until_vacated() {
        let grid = Grid::uniform(2, 2, 1).expect("valid grid");
        let mut registry = TowerRegistry::new();
        let cell = CellCoord::new(1, 1);

        registry.occupy(cell, EntityId::new(4));
        assert_eq!(registry.check_buildable(&grid, cell), Err(TowerError::Occupied));
        assert_eq!(registry.occupant(cell), Some(EntityId::new(4)));

        assert_eq!(registry.vacate(cell), Some(EntityId::new(4)));
        assert_eq!(registry.check_buildable(&grid, cell), Ok(()));
    }
}
