//! Distance estimates for A*.
//!
//! The hierarchical estimate is not admissible: it follows the cheapest abstract route through
//! entrance nodes and may overshoot across component boundaries. That trades optimality for
//! far fewer expanded cells on long queries.

use log::{debug, warn};
use std::collections::{HashMap, HashSet};

use super::priority_queue::PriorityQueue;
use crate::cluster::models::ComponentId;
use crate::cluster::neighbor_policy::diagonal_distance;
use crate::cluster::ClusterLevel;
use crate::error::{PathError, Result};
use crate::grid::CellPos;

/// Estimate for cells whose component has no abstract route to the goal.
pub const UNREACHABLE_PENALTY: i32 = i32::MAX / 4;

/// Octile distance to the closest of `targets`; zero only on a target.
pub fn nearest_diagonal(targets: &[CellPos], cell: CellPos) -> i32 {
    targets.iter().map(|&t| diagonal_distance(cell, t)).min().unwrap_or(0)
}

/// Exit entrance and its cost to the goal for one component.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AbstractStep {
    pub exit: CellPos,
    pub cost: i32,
}

/// Abstract-graph guided estimate toward a single goal cell.
#[derive(Debug)]
pub struct HierarchicalHeuristic<'a> {
    level: &'a ClusterLevel,
    goal: CellPos,
    goal_component: Option<ComponentId>,
    steps: HashMap<ComponentId, AbstractStep>,
    reached_origin: bool,
}

impl<'a> HierarchicalHeuristic<'a> {
    /// Search the abstract graph outward from the goal's component until the origin's
    /// component is reached, recording for every component the first entrance settled in it.
    pub fn build(level: &'a ClusterLevel, goal: CellPos, origin: CellPos) -> Result<Self> {
        let goal_component = level.component_at(goal);
        let origin_component = level.component_at(origin);
        let mut steps: HashMap<ComponentId, AbstractStep> = HashMap::new();
        let mut reached_origin = goal_component.is_some() && goal_component == origin_component;

        let seeds: Vec<CellPos> = goal_component
            .and_then(|id| level.component(id))
            .map(|c| c.entrances.iter().copied().collect())
            .unwrap_or_default();

        let mut best: HashMap<CellPos, i32> = HashMap::new();
        let mut settled: HashSet<CellPos> = HashSet::new();
        let mut queue = PriorityQueue::with_capacity(seeds.len().max(16));
        for seed in seeds {
            let cost = diagonal_distance(seed, goal);
            best.insert(seed, cost);
            queue.add(cost, seed);
        }

        while !reached_origin {
            let Ok((cost, node)) = queue.pop() else {
                break;
            };
            if !settled.insert(node) {
                continue;
            }
            if let Some(component) = level.component_at(node) {
                steps.entry(component).or_insert(AbstractStep { exit: node, cost });
                if Some(component) == origin_component {
                    reached_origin = true;
                    break;
                }
            }

            let edges = level.graph().edges(node);
            if edges.is_empty() {
                let message = format!("entrance {} has no edges at level {}", node, level.level());
                if cfg!(debug_assertions) {
                    return Err(PathError::Invariant(message));
                }
                warn!("{}; skipping", message);
                continue;
            }
            for edge in edges {
                let next = cost.saturating_add(edge.cost);
                if settled.contains(&edge.to) || best.get(&edge.to).map_or(false, |&b| b <= next) {
                    continue;
                }
                best.insert(edge.to, next);
                queue.add(next, edge.to);
            }
        }

        debug!(
            "hierarchical heuristic toward {}: {} components mapped, origin reached: {}",
            goal,
            steps.len(),
            reached_origin
        );
        Ok(Self { level, goal, goal_component, steps, reached_origin })
    }

    /// Whether the abstract search connected the origin's component to the goal's.
    pub fn reached_origin(&self) -> bool {
        self.reached_origin
    }

    pub fn step(&self, component: ComponentId) -> Option<AbstractStep> {
        self.steps.get(&component).copied()
    }

    pub fn estimate(&self, cell: CellPos) -> i32 {
        match self.level.component_at(cell) {
            None => diagonal_distance(cell, self.goal),
            Some(c) if Some(c) == self.goal_component => diagonal_distance(cell, self.goal),
            Some(c) => match self.steps.get(&c) {
                Some(step) => diagonal_distance(cell, step.exit).saturating_add(step.cost),
                None => UNREACHABLE_PENALTY,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::config::Settings;
    use crate::cluster::ClustersManager;
    use crate::grid::{MovementClass, PassabilityOracle, TileGrid};

    #[test]
    fn same_component_falls_back_to_diagonal() -> Result<()> {
        let grid = TileGrid::new(20, 20);
        let manager = ClustersManager::build(&grid, MovementClass::FOOT, &Settings::default())?;
        let goal = CellPos::new(3, 3);
        let h = HierarchicalHeuristic::build(manager.heuristic_level(), goal, CellPos::new(0, 0))?;
        assert!(h.reached_origin());
        assert_eq!(h.estimate(CellPos::new(0, 0)), diagonal_distance(CellPos::new(0, 0), goal));
        assert_eq!(h.estimate(goal), 0);
        Ok(())
    }

    #[test]
    fn remote_cells_route_through_exit_entrances() -> Result<()> {
        let grid = TileGrid::new(30, 10);
        let manager = ClustersManager::build(&grid, MovementClass::FOOT, &Settings::default())?;
        let level = manager.heuristic_level();
        let goal = CellPos::new(25, 5);
        let origin = CellPos::new(2, 5);
        let h = HierarchicalHeuristic::build(level, goal, origin)?;
        assert!(h.reached_origin());
        let origin_component = level.component_at(origin).ok_or(PathError::Invariant("no component".into()))?;
        let step = h.step(origin_component).ok_or(PathError::Invariant("no step".into()))?;
        assert_eq!(step.exit.x, 9);
        assert_eq!(h.estimate(origin), diagonal_distance(origin, step.exit) + step.cost);
        assert!(h.estimate(origin) >= diagonal_distance(origin, goal) / 2);
        Ok(())
    }

    #[test]
    fn walled_off_components_get_the_penalty() -> Result<()> {
        let rows = vec!["..........#.........."; 10];
        let grid = TileGrid::from_rows(&rows)?;
        assert_eq!(grid.bounds().width, 21);
        let manager = ClustersManager::build(&grid, MovementClass::FOOT, &Settings::default())?;
        let level = manager.heuristic_level();
        let h = HierarchicalHeuristic::build(level, CellPos::new(15, 5), CellPos::new(2, 5))?;
        assert!(!h.reached_origin());
        assert_eq!(h.estimate(CellPos::new(2, 5)), UNREACHABLE_PENALTY);
        Ok(())
    }

    #[test]
    fn nearest_diagonal_picks_closest_target() {
        let targets = [CellPos::new(10, 0), CellPos::new(2, 0)];
        assert_eq!(nearest_diagonal(&targets, CellPos::new(0, 0)), 200);
        assert_eq!(nearest_diagonal(&targets, CellPos::new(2, 0)), 0);
        assert_eq!(nearest_diagonal(&[], CellPos::new(2, 0)), 0);
    }
}
