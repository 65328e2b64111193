//! Position index for fast occupancy queries.
//!
//! Provides O(1) cell lookup and O(k) "who is here" queries, where k is the
//! number of entities on the cell, instead of scanning every live entity.
//! Unlike a per-frame rebuild, the index is updated in place whenever an
//! entity is created, moves to a different rounded cell, or is removed.

use crate::grid::Cell;
use bevy_ecs::prelude::*;
use std::collections::HashMap;

/// Cell-keyed index of live entities.
///
/// Entities are bucketed by their *rounded* position. Within a bucket,
/// entities keep the order in which they arrived.
#[derive(Resource, Debug, Default)]
pub struct PositionIndex {
    /// Map from cell to the entities whose rounded position is that cell.
    cells: HashMap<Cell, Vec<Entity>>,
    /// Reverse lookup: entity to cell.
    entity_cells: HashMap<Entity, Cell>,
}

impl PositionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `entity` at `cell`, moving it out of its previous bucket.
    pub fn insert(&mut self, entity: Entity, cell: Cell) {
        if let Some(&old_cell) = self.entity_cells.get(&entity) {
            if old_cell == cell {
                return;
            }
            self.detach(entity, old_cell);
        }

        self.cells.entry(cell).or_default().push(entity);
        self.entity_cells.insert(entity, cell);
    }

    /// Remove an entity from the index.
    pub fn remove(&mut self, entity: Entity) {
        if let Some(cell) = self.entity_cells.remove(&entity) {
            self.detach(entity, cell);
        }
    }

    fn detach(&mut self, entity: Entity, cell: Cell) {
        if let Some(entries) = self.cells.get_mut(&cell) {
            entries.retain(|&e| e != entity);
            if entries.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    /// Entities currently indexed at `cell`.
    pub fn at(&self, cell: Cell) -> &[Entity] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The cell an entity is indexed at.
    pub fn cell_of(&self, entity: Entity) -> Option<Cell> {
        self.entity_cells.get(&entity).copied()
    }
}
