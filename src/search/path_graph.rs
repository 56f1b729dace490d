use super::cell_info::CellLayer;
use super::layer_pool::PooledCellLayer;
use crate::cluster::models::ComponentId;
use crate::cluster::neighbor_policy::MovementPolicy;
use crate::grid::{CellPos, GridBounds, MovementClass, PassabilityOracle};

pub type Blocker<'a> = Box<dyn Fn(CellPos) -> bool + 'a>;

/// Concrete grid adjacency for one movement class, paired with the scratch layer a search
/// writes into.
pub struct PathGraph<'a, G: PassabilityOracle + ?Sized> {
    grid: &'a G,
    class: MovementClass,
    policy: MovementPolicy,
    bounds: GridBounds,
    layer: PooledCellLayer<'a>,
    inverted: bool,
    confined: Option<(&'a [Option<ComponentId>], ComponentId)>,
    blocker: Option<Blocker<'a>>,
}

impl<'a, G: PassabilityOracle + ?Sized> PathGraph<'a, G> {
    pub fn new(grid: &'a G, class: MovementClass, policy: MovementPolicy, layer: PooledCellLayer<'a>) -> Self {
        Self {
            grid,
            class,
            policy,
            bounds: grid.bounds(),
            layer,
            inverted: false,
            confined: None,
            blocker: None,
        }
    }

    /// Walk edges backwards: neighbours are predecessors and steps are charged as the forward move.
    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    /// Only visit cells whose entry in `table` is `component`.
    pub fn confined_to(mut self, table: &'a [Option<ComponentId>], component: ComponentId) -> Self {
        self.confined = Some((table, component));
        self
    }

    /// Extra cells to treat as blocked on top of the oracle.
    pub fn with_blocker(mut self, blocker: impl Fn(CellPos) -> bool + 'a) -> Self {
        self.blocker = Some(Box::new(blocker));
        self
    }

    pub fn grid(&self) -> &'a G {
        self.grid
    }

    pub fn class(&self) -> MovementClass {
        self.class
    }

    pub fn layer(&self) -> &CellLayer {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut CellLayer {
        &mut self.layer
    }

    fn admits(&self, cell: CellPos) -> bool {
        if let Some((table, component)) = self.confined {
            if !self.bounds.contains(cell) || table[self.bounds.index(cell)] != Some(component) {
                return false;
            }
        }
        !self.blocker.as_ref().map_or(false, |blocked| blocked(cell))
    }

    /// Fill `out` with `(neighbour, step cost)` for every permitted move out of `cell`.
    pub fn neighbors_into(&self, cell: CellPos, out: &mut Vec<(CellPos, i32)>) {
        out.clear();
        for offset in self.policy.neighbor_offsets() {
            let next = cell.offset(offset.0, offset.1);
            if !self.admits(next) || !self.policy.can_step(self.grid, self.class, cell, next) {
                continue;
            }
            let cost = if self.inverted {
                self.policy.step_cost(self.grid, self.class, next, cell)
            } else {
                self.policy.step_cost(self.grid, self.class, cell, next)
            };
            out.push((next, cost));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileGrid;
    use crate::search::layer_pool::CellInfoLayerPool;

    #[test]
    fn inverted_graph_charges_forward_step() -> crate::error::Result<()> {
        let grid = TileGrid::from_rows(&[".,."])?;
        let pool = CellInfoLayerPool::new(grid.bounds(), 2);
        let policy = MovementPolicy::default();
        let forward = PathGraph::new(&grid, MovementClass::FOOT, policy, pool.get());
        let reverse = PathGraph::new(&grid, MovementClass::FOOT, policy, pool.get()).inverted();

        let mut out = Vec::new();
        forward.neighbors_into(CellPos::new(0, 0), &mut out);
        assert_eq!(out, vec![(CellPos::new(1, 0), 150)]);
        reverse.neighbors_into(CellPos::new(1, 0), &mut out);
        out.sort();
        assert_eq!(out, vec![(CellPos::new(0, 0), 150), (CellPos::new(2, 0), 150)]);
        Ok(())
    }

    #[test]
    fn confinement_and_blocker_filter_neighbours() -> crate::error::Result<()> {
        let grid = TileGrid::new(3, 1);
        let pool = CellInfoLayerPool::new(grid.bounds(), 2);
        let table = vec![Some(ComponentId(0)), Some(ComponentId(0)), Some(ComponentId(1))];
        let confined = PathGraph::new(&grid, MovementClass::FOOT, MovementPolicy::default(), pool.get())
            .confined_to(&table, ComponentId(0));
        let mut out = Vec::new();
        confined.neighbors_into(CellPos::new(1, 0), &mut out);
        assert_eq!(out, vec![(CellPos::new(0, 0), 100)]);

        let blocked = PathGraph::new(&grid, MovementClass::FOOT, MovementPolicy::default(), pool.get())
            .with_blocker(|c| c.x == 0);
        blocked.neighbors_into(CellPos::new(1, 0), &mut out);
        assert_eq!(out, vec![(CellPos::new(2, 0), 100)]);
        Ok(())
    }
}
