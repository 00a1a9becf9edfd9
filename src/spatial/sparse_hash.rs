//! Sparse hash grid for efficient spatial queries

use ahash::AHashMap;
use glam::Vec2;

use crate::core::types::EntityId;

/// Sparse hash grid for radius queries over entity positions
///
/// Rebuilt from scratch once per tick; positions are stored alongside ids
/// so guards and citizens can share one grid.
pub struct SparseHashGrid {
    cell_size: f32,
    cells: AHashMap<(i32, i32), Vec<(EntityId, Vec2)>>,
}

impl SparseHashGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(0.01),
            cells: AHashMap::new(),
        }
    }

    #[inline]
    fn cell_coord(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn insert(&mut self, entity: EntityId, pos: Vec2) {
        let coord = self.cell_coord(pos);
        self.cells.entry(coord).or_default().push((entity, pos));
    }

    /// Rebuild the grid from an iterator of (id, position) pairs
    pub fn rebuild(&mut self, entities: impl Iterator<Item = (EntityId, Vec2)>) {
        self.clear();
        for (entity, pos) in entities {
            self.insert(entity, pos);
        }
    }

    /// Query all entities within `radius` of `center`
    ///
    /// Exact: candidates from covering cells are distance-filtered.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        let radius_sq = radius * radius;
        let cells_out = (radius / self.cell_size).ceil() as i32;
        let (cx, cy) = self.cell_coord(center);

        let mut found = Vec::new();
        for dx in -cells_out..=cells_out {
            for dy in -cells_out..=cells_out {
                if let Some(cell) = self.cells.get(&(cx + dx, cy + dy)) {
                    for &(entity, pos) in cell {
                        if center.distance_squared(pos) <= radius_sq {
                            found.push(entity);
                        }
                    }
                }
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(points: &[(f32, f32)]) -> (SparseHashGrid, Vec<EntityId>) {
        let mut grid = SparseHashGrid::new(8.0);
        let ids: Vec<EntityId> = points.iter().map(|_| EntityId::new()).collect();
        grid.rebuild(
            ids.iter()
                .zip(points)
                .map(|(&id, &(x, y))| (id, Vec2::new(x, y))),
        );
        (grid, ids)
    }

    #[test]
    fn test_query_radius_filters_by_distance() {
        let (grid, ids) = grid_with(&[(0.0, 0.0), (3.0, 4.0), (100.0, 0.0)]);

        let found = grid.query_radius(Vec2::ZERO, 6.0);
        assert!(found.contains(&ids[0]));
        assert!(found.contains(&ids[1]));
        assert!(!found.contains(&ids[2]));
    }

    #[test]
    fn test_query_radius_crosses_cell_boundaries() {
        // Radius larger than one cell must reach entities several cells out
        let (grid, ids) = grid_with(&[(30.0, 0.0)]);
        let found = grid.query_radius(Vec2::ZERO, 31.0);
        assert_eq!(found, vec![ids[0]]);
    }

    #[test]
    fn test_empty_grid_returns_nothing() {
        let grid = SparseHashGrid::new(8.0);
        assert!(grid.query_radius(Vec2::ZERO, 50.0).is_empty());
    }

    #[test]
    fn test_negative_coordinates() {
        let (grid, ids) = grid_with(&[(-20.0, -20.0)]);
        let found = grid.query_radius(Vec2::new(-22.0, -22.0), 5.0);
        assert_eq!(found, vec![ids[0]]);
    }
}
