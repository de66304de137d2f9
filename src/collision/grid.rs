use glam::Vec2;

use crate::core::body::BodyId;
use crate::error::{Error, Result};

/// One fixed-size square region of the grid holding body memberships.
#[derive(Debug, Clone, Default)]
pub struct Cell {
    members: Vec<BodyId>,
}

impl Cell {
    pub fn count(&self) -> usize {
        self.members.len()
    }

    pub fn members(&self) -> &[BodyId] {
        &self.members
    }

    fn remove(&mut self, id: BodyId) -> bool {
        if let Some(slot) = self.members.iter().position(|&m| m == id) {
            self.members.swap_remove(slot);
            true
        } else {
            false
        }
    }
}

/// Uniform collision grid over the simulation bounds.
///
/// The grid carries one padding ring of cells on every border: a world
/// position maps to cell `floor(p / cell_size) + 1`, so every in-bounds body
/// lands in an interior cell and the 3x3 neighborhood of any anchor never
/// indexes out of range. Cells are allocated once and never resized;
/// [`SpatialGrid::clear`] only empties memberships.
#[derive(Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cols: usize,
    rows: usize,
    occupancy_cap: usize,
    cells: Vec<Cell>,
}

impl SpatialGrid {
    pub fn new(width: f32, height: f32, cell_size: f32, occupancy_cap: usize) -> Self {
        let cols = (width / cell_size).ceil() as usize + 2;
        let rows = (height / cell_size).ceil() as usize + 2;
        Self {
            cell_size,
            cols,
            rows,
            occupancy_cap,
            cells: vec![Cell::default(); cols * rows],
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid coordinates for a world position, or `None` outside the grid
    /// (padding ring included).
    pub fn cell_of(&self, position: Vec2) -> Option<(usize, usize)> {
        let col = (position.x / self.cell_size).floor() as isize + 1;
        let row = (position.y / self.cell_size).floor() as isize + 1;
        if col < 0 || row < 0 || col as usize >= self.cols || row as usize >= self.rows {
            return None;
        }
        Some((col as usize, row as usize))
    }

    /// World-space bounds of a cell: `(min, max)` corners.
    pub fn cell_bounds(&self, col: usize, row: usize) -> (Vec2, Vec2) {
        let min = Vec2::new(
            (col as f32 - 1.0) * self.cell_size,
            (row as f32 - 1.0) * self.cell_size,
        );
        (min, min + Vec2::splat(self.cell_size))
    }

    pub fn cell(&self, col: usize, row: usize) -> &Cell {
        &self.cells[row * self.cols + col]
    }

    /// Registers a body in the cell covering `position`.
    ///
    /// Fails with [`Error::OutOfBounds`] when the position maps outside the
    /// grid and [`Error::CellOverflow`] past the occupancy cap; the cap is a
    /// safety bound validated against packing geometry at startup, so
    /// overflow indicates misconfiguration rather than a physical state.
    pub fn insert(&mut self, id: BodyId, position: Vec2) -> Result<()> {
        let (col, row) = self.cell_of(position).ok_or(Error::OutOfBounds {
            x: position.x,
            y: position.y,
        })?;
        let cap = self.occupancy_cap;
        let cell = &mut self.cells[row * self.cols + col];
        if cell.members.len() >= cap {
            return Err(Error::CellOverflow { col, row, cap });
        }
        cell.members.push(id);
        Ok(())
    }

    /// Unregisters a body from the cell covering `position`.
    ///
    /// Membership is index-based with swap-removal, so removing from the
    /// middle of a cell or collapsing a cell to empty are both O(1).
    pub fn remove(&mut self, id: BodyId, position: Vec2) -> bool {
        match self.cell_of(position) {
            Some((col, row)) => self.cells[row * self.cols + col].remove(id),
            None => false,
        }
    }

    /// Empties every cell without touching the grid topology.
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.members.clear();
        }
    }

    /// Interior anchor columns, `[1, cols - 1)`.
    pub fn interior_cols(&self) -> std::ops::Range<usize> {
        1..self.cols - 1
    }

    /// Invokes `f(anchor, neighbor)` for each of the 9 neighbor pairs of
    /// every interior anchor cell whose column lies in `cols`, skipping
    /// pairs where either side is empty.
    pub fn for_each_pair_in_columns<F>(&self, cols: std::ops::Range<usize>, mut f: F)
    where
        F: FnMut(&Cell, &Cell),
    {
        let lo = cols.start.max(1);
        let hi = cols.end.min(self.cols - 1);
        for row in 1..self.rows - 1 {
            for col in lo..hi {
                let anchor = self.cell(col, row);
                if anchor.count() == 0 {
                    continue;
                }
                for dr in -1i32..=1 {
                    for dc in -1i32..=1 {
                        let neighbor = self.cell(
                            (col as i32 + dc) as usize,
                            (row as i32 + dr) as usize,
                        );
                        if neighbor.count() == 0 {
                            continue;
                        }
                        f(anchor, neighbor);
                    }
                }
            }
        }
    }

    /// Body ids in the 3x3 neighborhood around a cell, bounds-checked.
    pub fn neighborhood_members(&self, col: usize, row: usize) -> Vec<BodyId> {
        let mut out = Vec::new();
        for dr in -1i32..=1 {
            for dc in -1i32..=1 {
                let c = col as i32 + dc;
                let r = row as i32 + dr;
                if c < 0 || r < 0 || c as usize >= self.cols || r as usize >= self.rows {
                    continue;
                }
                out.extend_from_slice(self.cell(c as usize, r as usize).members());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::allocator::ArenaIndex;

    fn grid() -> SpatialGrid {
        SpatialGrid::new(800.0, 700.0, 16.0, 16)
    }

    #[test]
    fn world_positions_map_to_interior_cells() {
        let g = grid();
        // 800 / 16 = 50 columns of play area plus the padding ring.
        assert_eq!(g.cols(), 52);
        assert_eq!(g.rows(), 46);
        assert_eq!(g.cell_of(Vec2::new(0.0, 0.0)), Some((1, 1)));
        assert_eq!(g.cell_of(Vec2::new(15.9, 15.9)), Some((1, 1)));
        assert_eq!(g.cell_of(Vec2::new(16.0, 0.0)), Some((2, 1)));
        assert_eq!(g.cell_of(Vec2::new(799.0, 699.0)), Some((50, 44)));
    }

    #[test]
    fn positions_in_the_padding_ring_still_map() {
        let g = grid();
        assert_eq!(g.cell_of(Vec2::new(-0.5, 3.0)), Some((0, 1)));
        assert_eq!(g.cell_of(Vec2::new(3.0, -0.5)), Some((1, 0)));
    }

    #[test]
    fn far_outside_positions_are_rejected() {
        let mut g = grid();
        assert_eq!(g.cell_of(Vec2::new(-20.0, 3.0)), None);
        let err = g.insert(ArenaIndex(0), Vec2::new(5000.0, 5.0)).unwrap_err();
        assert!(matches!(err, crate::error::Error::OutOfBounds { .. }));
    }

    #[test]
    fn insert_remove_round_trip() {
        let mut g = grid();
        let id = ArenaIndex(7);
        let pos = Vec2::new(100.0, 100.0);
        g.insert(id, pos).unwrap();
        let (col, row) = g.cell_of(pos).unwrap();
        assert_eq!(g.cell(col, row).members(), &[id]);
        assert!(g.remove(id, pos));
        assert_eq!(g.cell(col, row).count(), 0);
        assert!(!g.remove(id, pos));
    }

    #[test]
    fn occupancy_cap_is_enforced() {
        let mut g = SpatialGrid::new(64.0, 64.0, 16.0, 2);
        let pos = Vec2::new(8.0, 8.0);
        g.insert(ArenaIndex(0), pos).unwrap();
        g.insert(ArenaIndex(1), pos).unwrap();
        let err = g.insert(ArenaIndex(2), pos).unwrap_err();
        assert!(matches!(err, crate::error::Error::CellOverflow { cap: 2, .. }));
    }

    #[test]
    fn clear_keeps_topology() {
        let mut g = grid();
        g.insert(ArenaIndex(0), Vec2::new(50.0, 50.0)).unwrap();
        g.clear();
        assert_eq!(g.cols(), 52);
        let (col, row) = g.cell_of(Vec2::new(50.0, 50.0)).unwrap();
        assert_eq!(g.cell(col, row).count(), 0);
    }

    #[test]
    fn pair_sweep_visits_adjacent_occupied_cells() {
        let mut g = grid();
        g.insert(ArenaIndex(0), Vec2::new(8.0, 8.0)).unwrap();
        g.insert(ArenaIndex(1), Vec2::new(24.0, 8.0)).unwrap();
        let mut pairs = 0;
        g.for_each_pair_in_columns(g.interior_cols(), |anchor, neighbor| {
            assert!(anchor.count() > 0 && neighbor.count() > 0);
            pairs += 1;
        });
        // Each occupied anchor sees itself and the other occupied neighbor.
        assert_eq!(pairs, 4);
    }

    #[test]
    fn cell_bounds_align_with_mapping() {
        let g = grid();
        let (col, row) = g.cell_of(Vec2::new(20.0, 36.0)).unwrap();
        let (min, max) = g.cell_bounds(col, row);
        assert_eq!(min, Vec2::new(16.0, 32.0));
        assert_eq!(max, Vec2::new(32.0, 48.0));
    }
}
