use serde::{Deserialize, Serialize};

use crate::grid::{CellPos, MovementClass, PassabilityOracle};

/// Cost of one straight step over plain terrain.
pub const CELL_COST: i32 = 100;
/// Cost of one diagonal step over plain terrain.
pub const DIAGONAL_CELL_COST: i32 = 141;
/// Fixed cost of crossing a cluster border between two facing entrances.
pub const INTER_EDGE_COST: i32 = 1;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MovementPolicy {
    pub allow_diagonals: bool,
    pub allow_corner_cut: bool,
}

impl Default for MovementPolicy {
    fn default() -> Self {
        Self { allow_diagonals: true, allow_corner_cut: false }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Offset(pub i32, pub i32);

impl Offset {
    pub fn is_diagonal(self) -> bool {
        self.0 != 0 && self.1 != 0
    }
}

pub const CARDINAL_OFFSETS: [Offset; 4] = [Offset(1, 0), Offset(-1, 0), Offset(0, 1), Offset(0, -1)];

impl MovementPolicy {
    pub fn neighbor_offsets(&self) -> &'static [Offset] {
        const ALL: [Offset; 8] = [
            Offset(1, 0), Offset(-1, 0), Offset(0, 1), Offset(0, -1),
            Offset(1, 1), Offset(1, -1), Offset(-1, 1), Offset(-1, -1),
        ];
        if self.allow_diagonals { &ALL } else { &CARDINAL_OFFSETS }
    }

    /// Whether an agent standing on `from` may move into the adjacent cell `to`.
    ///
    /// `from` itself is not checked so a search can leave a cell its own agent occupies.
    /// The corner rule is symmetric, so a reverse search can ask the same question with the
    /// arguments swapped.
    pub fn can_step<G: PassabilityOracle + ?Sized>(
        &self,
        grid: &G,
        class: MovementClass,
        from: CellPos,
        to: CellPos,
    ) -> bool {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        if (dx == 0 && dy == 0) || dx.abs() > 1 || dy.abs() > 1 {
            return false;
        }
        if !grid.can_enter_cell(to, class) {
            return false;
        }
        if dx == 0 || dy == 0 {
            return true;
        }
        if !self.allow_diagonals {
            return false;
        }

        let horizontal = grid.can_enter_cell(from.offset(dx, 0), class);
        let vertical = grid.can_enter_cell(from.offset(0, dy), class);
        if self.allow_corner_cut {
            horizontal || vertical
        } else {
            horizontal && vertical
        }
    }

    /// Cost of entering `to` from the adjacent `from`.
    pub fn step_cost<G: PassabilityOracle + ?Sized>(
        &self,
        grid: &G,
        class: MovementClass,
        from: CellPos,
        to: CellPos,
    ) -> i32 {
        let cost = grid.movement_cost(to, class);
        if Offset(to.x - from.x, to.y - from.y).is_diagonal() {
            cost.saturating_mul(DIAGONAL_CELL_COST) / CELL_COST
        } else {
            cost
        }
    }
}

/// Octile distance on the [`CELL_COST`] scale.
pub fn diagonal_distance(a: CellPos, b: CellPos) -> i32 {
    let dx = (a.x - b.x).abs();
    let dy = (a.y - b.y).abs();
    let diag = dx.min(dy);
    let straight = dx + dy;
    CELL_COST * straight + (DIAGONAL_CELL_COST - 2 * CELL_COST) * diag
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileGrid;

    #[test]
    fn neighbor_offsets_no_diagonals() {
        let p = MovementPolicy { allow_diagonals: false, allow_corner_cut: false };
        let offs = p.neighbor_offsets();
        assert_eq!(offs.len(), 4);
        assert!(offs.contains(&Offset(1, 0)));
        assert!(offs.contains(&Offset(-1, 0)));
        assert!(offs.contains(&Offset(0, 1)));
        assert!(offs.contains(&Offset(0, -1)));
    }

    #[test]
    fn neighbor_offsets_with_diagonals() {
        let offs = MovementPolicy::default().neighbor_offsets();
        assert_eq!(offs.len(), 8);
        assert!(offs.contains(&Offset(1, 1)));
        assert!(offs.contains(&Offset(-1, -1)));
    }

    #[test]
    fn corner_cutting_depends_on_policy() -> crate::error::Result<()> {
        let grid = TileGrid::from_rows(&[".#", ".."])?;
        let from = CellPos::new(0, 0);
        let to = CellPos::new(1, 1);
        let strict = MovementPolicy::default();
        let loose = MovementPolicy { allow_diagonals: true, allow_corner_cut: true };
        assert!(!strict.can_step(&grid, MovementClass::FOOT, from, to));
        assert!(loose.can_step(&grid, MovementClass::FOOT, from, to));
        assert!(strict.can_step(&grid, MovementClass::FOOT, from, CellPos::new(0, 1)));
        assert!(!strict.can_step(&grid, MovementClass::FOOT, from, CellPos::new(1, 0)));
        assert!(!strict.can_step(&grid, MovementClass::FOOT, from, CellPos::new(0, 2)));
        Ok(())
    }

    #[test]
    fn step_costs_scale_diagonals() -> crate::error::Result<()> {
        let grid = TileGrid::from_rows(&[".,", ".."])?;
        let p = MovementPolicy::default();
        let origin = CellPos::new(0, 0);
        assert_eq!(p.step_cost(&grid, MovementClass::FOOT, origin, CellPos::new(0, 1)), CELL_COST);
        assert_eq!(p.step_cost(&grid, MovementClass::FOOT, origin, CellPos::new(1, 1)), DIAGONAL_CELL_COST);
        assert_eq!(p.step_cost(&grid, MovementClass::FOOT, origin, CellPos::new(1, 0)), 150);
        Ok(())
    }

    #[test]
    fn diagonal_distance_matches_octile_shape() {
        assert_eq!(diagonal_distance(CellPos::new(0, 0), CellPos::new(0, 0)), 0);
        assert_eq!(diagonal_distance(CellPos::new(0, 0), CellPos::new(3, 0)), 300);
        assert_eq!(diagonal_distance(CellPos::new(0, 0), CellPos::new(19, 19)), 19 * DIAGONAL_CELL_COST);
        assert_eq!(diagonal_distance(CellPos::new(2, 5), CellPos::new(0, 0)), 2 * DIAGONAL_CELL_COST + 300);
    }
}
