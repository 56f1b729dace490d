use std::collections::HashSet;

use super::path::Path;
use super::path_graph::PathGraph;
use super::path_search::PathSearch;
use crate::error::Result;
use crate::grid::{CellPos, PassabilityOracle};

/// Multi-target Dijkstra that reuses one layer and queue across origins.
pub struct Dijkstra<'a, G: PassabilityOracle + ?Sized> {
    search: PathSearch<'a, G>,
}

impl<'a, G: PassabilityOracle + ?Sized> Dijkstra<'a, G> {
    pub fn new(graph: PathGraph<'a, G>) -> Self {
        Self { search: PathSearch::new(graph, |_| 0) }
    }

    /// Shortest paths from `origin` to each of `targets`, in the same order; `None` where
    /// a target cannot be reached. Stops as soon as every target is closed.
    pub fn run(&mut self, origin: CellPos, targets: &[CellPos]) -> Result<Vec<Option<Path>>> {
        self.search.reset();
        self.search.add_origin(origin);

        let mut remaining: HashSet<CellPos> = targets.iter().copied().collect();
        while !remaining.is_empty() && self.search.can_expand() {
            let closed = self.search.expand()?;
            remaining.remove(&closed);
        }

        targets
            .iter()
            .map(|&target| {
                if self.search.is_closed(target) {
                    Path::reconstruct(self.search.layer(), target).map(Some)
                } else {
                    Ok(None)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::neighbor_policy::MovementPolicy;
    use crate::grid::{MovementClass, TileGrid};
    use crate::search::layer_pool::CellInfoLayerPool;

    #[test]
    fn reaches_every_target_or_reports_none() -> Result<()> {
        let grid = TileGrid::from_rows(&["...#.", ".#.#.", "...#."])?;
        let pool = CellInfoLayerPool::new(grid.bounds(), 1);
        let graph = PathGraph::new(&grid, MovementClass::FOOT, MovementPolicy::default(), pool.get());
        let mut dijkstra = Dijkstra::new(graph);

        let targets = [CellPos::new(2, 2), CellPos::new(4, 0), CellPos::new(0, 2)];
        let paths = dijkstra.run(CellPos::new(0, 0), &targets)?;
        assert_eq!(paths[0].as_ref().map(|p| p.cost), Some(400));
        assert!(paths[1].is_none());
        assert_eq!(paths[2].as_ref().map(|p| p.cost), Some(200));

        let again = dijkstra.run(CellPos::new(2, 2), &[CellPos::new(0, 0)])?;
        assert_eq!(again[0].as_ref().map(|p| p.cost), Some(400));
        assert_eq!(again[0].as_ref().and_then(|p| p.target()), Some(CellPos::new(0, 0)));
        Ok(())
    }
}
