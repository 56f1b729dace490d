//! World-level facade: owns the oracle, one cluster hierarchy per movement class and the
//! scratch-layer pool every query checks its state out of.

use log::{debug, info, trace};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::cluster::config::{HeuristicKind, Settings};
use crate::cluster::executor;
use crate::cluster::neighbor_policy::diagonal_distance;
use crate::cluster::updater::UpdateStats;
use crate::cluster::ClustersManager;
use crate::error::{PathError, Result};
use crate::grid::{CellPos, MovementClass, OccupancyEvent, OccupancySink, PassabilityOracle};
use crate::search::heuristic::{nearest_diagonal, HierarchicalHeuristic};
use crate::search::layer_pool::CellInfoLayerPool;
use crate::search::path::Path;
use crate::search::path_graph::PathGraph;
use crate::search::path_search::{Heuristic, PathSearch};

/// A path plus every cell the search considered, for debug overlays.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SearchTrace {
    pub path: Path,
    pub considered: Vec<(CellPos, i32)>,
    pub max_cost: i32,
}

pub struct PathFinder<G> {
    grid: G,
    settings: Settings,
    managers: BTreeMap<MovementClass, ClustersManager>,
    pool: CellInfoLayerPool,
}

fn build_managers<G: PassabilityOracle + Sync + ?Sized>(
    grid: &G,
    settings: &Settings,
    pool: &CellInfoLayerPool,
) -> Result<BTreeMap<MovementClass, ClustersManager>> {
    let mut managers = BTreeMap::new();
    for class in grid.movement_classes() {
        let (manager, _) = executor::run_pipeline(grid, class, settings, pool)?;
        managers.insert(class, manager);
    }
    Ok(managers)
}

/// Round-robin two searches until a cell closed by one side is already closed by the other.
///
/// Only the forward side running dry proves there is no path: the reverse side never enters
/// the source when the agent itself occupies it.
fn meet<'a, G: PassabilityOracle + ?Sized>(
    mut forward: PathSearch<'a, G>,
    mut reverse: PathSearch<'a, G>,
) -> Result<Path> {
    loop {
        if !forward.can_expand() {
            return Ok(Path::empty());
        }
        let cell = forward.expand()?;
        if reverse.is_closed(cell) {
            trace!("bidirectional search met at {}", cell);
            return Path::join(forward.layer(), reverse.layer(), cell);
        }
        if reverse.can_expand() {
            let cell = reverse.expand()?;
            if forward.is_closed(cell) {
                trace!("bidirectional search met at {}", cell);
                return Path::join(forward.layer(), reverse.layer(), cell);
            }
        }
    }
}

impl<G: PassabilityOracle + Sync> PathFinder<G> {
    /// Build the hierarchy for every movement class the oracle knows.
    pub fn new(grid: G, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let pool = CellInfoLayerPool::new(grid.bounds(), settings.pool_capacity);
        let managers = build_managers(&grid, &settings, &pool)?;
        info!("path finder ready: {} movement classes", managers.len());
        Ok(Self { grid, settings, managers, pool })
    }

    pub fn grid(&self) -> &G {
        &self.grid
    }

    /// Callers that change passability through this must follow up with
    /// [`PathFinder::notify_occupancy_changed`] or [`PathFinder::rebuild`].
    pub fn grid_mut(&mut self) -> &mut G {
        &mut self.grid
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pool(&self) -> &CellInfoLayerPool {
        &self.pool
    }

    pub fn classes(&self) -> impl Iterator<Item = MovementClass> + '_ {
        self.managers.keys().copied()
    }

    pub fn clusters(&self, class: MovementClass) -> Result<&ClustersManager> {
        self.managers.get(&class).ok_or(PathError::UnknownMovementClass(class))
    }

    /// Rebuild every hierarchy from scratch.
    pub fn rebuild(&mut self) -> Result<()> {
        self.managers = build_managers(&self.grid, &self.settings, &self.pool)?;
        Ok(())
    }

    fn checked(&self, class: MovementClass, cells: &[CellPos]) -> Result<&ClustersManager> {
        let bounds = self.grid.bounds();
        for &cell in cells {
            bounds.check(cell)?;
        }
        self.clusters(class)
    }

    fn graph(&self, class: MovementClass) -> PathGraph<'_, G> {
        PathGraph::new(&self.grid, class, self.settings.policy, self.pool.get())
    }

    pub fn find_path(&self, source: CellPos, target: CellPos, class: MovementClass) -> Result<Path> {
        let manager = self.checked(class, &[source, target])?;
        if source == target {
            return Ok(Path::single(source));
        }
        if !self.grid.can_enter_cell(target, class) {
            return Ok(Path::empty());
        }
        let policy = self.settings.policy;
        if policy.can_step(&self.grid, class, source, target) {
            let cost = policy.step_cost(&self.grid, class, source, target);
            return Ok(Path { cells: vec![source, target], cost });
        }

        let level = manager.heuristic_level();
        let source_component = level.component_at(source);
        let mut forward_h: Heuristic<'_> = Box::new(move |c: CellPos| diagonal_distance(c, target));
        let mut reverse_h: Heuristic<'_> = Box::new(move |c: CellPos| diagonal_distance(c, source));
        if source_component.is_some() && source_component != level.component_at(target) {
            let forward = HierarchicalHeuristic::build(level, target, source)?;
            if !forward.reached_origin() && !policy.allow_corner_cut {
                debug!("{}: {} and {} are not connected at level {}", class, source, target, level.level());
                return Ok(Path::empty());
            }
            if self.settings.heuristic == HeuristicKind::Hierarchical {
                let reverse = HierarchicalHeuristic::build(level, source, target)?;
                forward_h = Box::new(move |c: CellPos| forward.estimate(c));
                reverse_h = Box::new(move |c: CellPos| reverse.estimate(c));
            }
        }

        let mut forward = PathSearch::from_points(self.graph(class), [source], forward_h);
        if !self.settings.bidirectional {
            return forward.find_path();
        }
        let reverse = PathSearch::from_points(self.graph(class).inverted(), [target], reverse_h);
        meet(forward, reverse)
    }

    /// Cheapest path to whichever of `targets` is reached first. Targets the class cannot
    /// enter are ignored.
    pub fn find_path_to_any(&self, source: CellPos, targets: &[CellPos], class: MovementClass) -> Result<Path> {
        self.checked(class, &[source])?;
        self.checked(class, targets)?;
        let goals: Vec<CellPos> = targets.iter().copied().filter(|&t| self.grid.can_enter_cell(t, class)).collect();
        if goals.is_empty() {
            return Ok(Path::empty());
        }
        if goals.contains(&source) {
            return Ok(Path::single(source));
        }

        let seeds = goals.clone();
        let mut forward = PathSearch::from_points(self.graph(class), [source], move |c| nearest_diagonal(&goals, c));
        if !self.settings.bidirectional {
            return forward.find_path();
        }
        let reverse = PathSearch::from_points(self.graph(class).inverted(), seeds, move |c| diagonal_distance(c, source));
        meet(forward, reverse)
    }

    /// Unidirectional search that stops at the first closed cell satisfying `goal`.
    pub fn find_path_with_goal<'a>(
        &'a self,
        source: CellPos,
        class: MovementClass,
        goal: impl Fn(CellPos) -> bool + 'a,
        heuristic: impl Fn(CellPos) -> i32 + 'a,
    ) -> Result<Path> {
        self.checked(class, &[source])?;
        PathSearch::from_points(self.graph(class), [source], heuristic).with_goal(goal).find_path()
    }

    /// Plain A* with the diagonal heuristic, recording every considered cell.
    pub fn trace_path(&self, source: CellPos, target: CellPos, class: MovementClass) -> Result<SearchTrace> {
        self.checked(class, &[source, target])?;
        let mut search =
            PathSearch::from_points(self.graph(class), [source], move |c| diagonal_distance(c, target)).with_debug();
        let path = search.find_path()?;
        Ok(SearchTrace { path, considered: search.considered().to_vec(), max_cost: search.max_cost() })
    }

    /// Repair every hierarchy after the passability of `cells` changed in the oracle.
    pub fn notify_occupancy_changed(&mut self, cells: &[CellPos]) -> Result<Vec<(MovementClass, UpdateStats)>> {
        let bounds = self.grid.bounds();
        for &cell in cells {
            bounds.check(cell)?;
        }
        let mut all = Vec::with_capacity(self.managers.len());
        for (&class, manager) in self.managers.iter_mut() {
            all.push((class, manager.update(&self.grid, cells, &self.pool)?));
        }
        Ok(all)
    }
}

impl<G: PassabilityOracle + OccupancySink + Sync> PathFinder<G> {
    /// Feed occupancy events into the oracle, then repair the hierarchies once.
    pub fn apply_occupancy_events(&mut self, events: &[OccupancyEvent]) -> Result<Vec<(MovementClass, UpdateStats)>> {
        let bounds = self.grid.bounds();
        for event in events {
            bounds.check(event.cell)?;
        }
        for event in events {
            self.grid.apply_occupancy(event);
        }
        let changed: Vec<CellPos> = events.iter().map(|e| e.cell).collect::<BTreeSet<_>>().into_iter().collect();
        self.notify_occupancy_changed(&changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::neighbor_policy::DIAGONAL_CELL_COST;
    use crate::grid::TileGrid;

    fn finder(rows: &[&str]) -> anyhow::Result<PathFinder<TileGrid>> {
        Ok(PathFinder::new(TileGrid::from_rows(rows)?, Settings::default())?)
    }

    #[test]
    fn rejects_bad_input_before_searching() -> anyhow::Result<()> {
        let finder = PathFinder::new(TileGrid::new(5, 5), Settings::default())?;
        let res = finder.find_path(CellPos::new(0, 0), CellPos::new(5, 0), MovementClass::FOOT);
        assert_eq!(res, Err(PathError::OutOfBounds { x: 5, y: 0 }));
        let res = finder.find_path(CellPos::new(0, 0), CellPos::new(1, 0), MovementClass(7));
        assert_eq!(res, Err(PathError::UnknownMovementClass(MovementClass(7))));
        Ok(())
    }

    #[test]
    fn trivial_queries_skip_the_search() -> anyhow::Result<()> {
        let finder = finder(&["...", ".#.", "..."])?;
        let here = CellPos::new(0, 0);
        assert_eq!(finder.find_path(here, here, MovementClass::FOOT)?, Path::single(here));
        assert_eq!(finder.find_path(here, CellPos::new(1, 1), MovementClass::FOOT)?, Path::empty());
        let step = finder.find_path(here, CellPos::new(1, 0), MovementClass::FOOT)?;
        assert_eq!(step.cells, vec![here, CellPos::new(1, 0)]);
        assert_eq!(step.cost, 100);
        // diagonal past the wall is a corner cut
        let around = finder.find_path(CellPos::new(1, 0), CellPos::new(2, 1), MovementClass::FOOT)?;
        assert_eq!(around.cost, 200);
        Ok(())
    }

    #[test]
    fn disconnected_components_short_circuit() -> anyhow::Result<()> {
        let rows = vec!["..........#.........."; 10];
        let finder = finder(&rows)?;
        let path = finder.find_path(CellPos::new(2, 5), CellPos::new(15, 5), MovementClass::FOOT)?;
        assert!(path.is_empty());
        assert_eq!(path.cost, 0);
        Ok(())
    }

    #[test]
    fn unidirectional_diagonal_search_is_optimal() -> anyhow::Result<()> {
        let settings = Settings { bidirectional: false, heuristic: HeuristicKind::Diagonal, ..Settings::default() };
        let finder = PathFinder::new(TileGrid::new(20, 20), settings)?;
        let path = finder.find_path(CellPos::new(0, 0), CellPos::new(19, 19), MovementClass::FOOT)?;
        assert_eq!(path.cost, 19 * DIAGONAL_CELL_COST);
        assert_eq!(path.len(), 20);
        Ok(())
    }

    #[test]
    fn naval_class_only_sails_water() -> anyhow::Result<()> {
        let finder = finder(&["~~~~", "~..~", "~~~~"])?;
        let path = finder.find_path(CellPos::new(0, 0), CellPos::new(3, 2), MovementClass::NAVAL)?;
        assert!(!path.is_empty());
        let land = finder.find_path(CellPos::new(0, 0), CellPos::new(1, 1), MovementClass::NAVAL)?;
        assert!(land.is_empty());
        Ok(())
    }

    #[test]
    fn any_target_and_custom_goal() -> anyhow::Result<()> {
        let finder = finder(&["..........", "..........", ".........."])?;
        let source = CellPos::new(0, 1);
        let path = finder.find_path_to_any(source, &[CellPos::new(9, 1), CellPos::new(4, 1)], MovementClass::FOOT)?;
        assert_eq!(path.target(), Some(CellPos::new(4, 1)));
        assert_eq!(path.cost, 400);
        assert!(finder.find_path_to_any(source, &[], MovementClass::FOOT)?.is_empty());

        let ranged = finder.find_path_with_goal(source, MovementClass::FOOT, |c| c.x >= 6, |_| 0)?;
        assert_eq!(ranged.target().map(|c| c.x), Some(6));
        assert_eq!(ranged.cost, 600);
        Ok(())
    }

    #[test]
    fn trace_records_considered_cells() -> anyhow::Result<()> {
        let finder = finder(&["....", "###.", "...."])?;
        let trace = finder.trace_path(CellPos::new(0, 0), CellPos::new(0, 2), MovementClass::FOOT)?;
        assert_eq!(trace.path.target(), Some(CellPos::new(0, 2)));
        assert_eq!(trace.considered.first(), Some(&(CellPos::new(0, 0), 0)));
        assert!(trace.considered.len() >= trace.path.len());
        assert!(trace.max_cost >= trace.path.cost);
        Ok(())
    }

    #[test]
    fn occupancy_events_update_every_class() -> anyhow::Result<()> {
        let mut finder = PathFinder::new(TileGrid::new(20, 10), Settings::default())?;
        let blocked = CellPos::new(10, 5);
        let stats = finder.apply_occupancy_events(&[OccupancyEvent::entered(blocked)])?;
        assert_eq!(stats.len(), finder.classes().count());
        assert!(finder.grid().is_occupied(blocked));
        let path = finder.find_path(CellPos::new(9, 5), CellPos::new(11, 5), MovementClass::FOOT)?;
        assert!(!path.cells.contains(&blocked));

        let res = finder.apply_occupancy_events(&[OccupancyEvent::left(blocked), OccupancyEvent::left(CellPos::new(-1, 0))]);
        assert_eq!(res, Err(PathError::OutOfBounds { x: -1, y: 0 }));
        assert!(finder.grid().is_occupied(blocked));
        Ok(())
    }
}
