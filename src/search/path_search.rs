//! A*/Dijkstra expansion over a [`PathGraph`].
//!
//! Cells move Unvisited -> Open -> Closed. A neighbour is only updated when the tentative
//! cost strictly improves on what the layer already holds; superseded heap entries are
//! dropped when they reach the top. Dijkstra is the same machine with a zero heuristic.

use log::trace;

use super::cell_info::{CellInfo, CellLayer, CellStatus};
use super::path::Path;
use super::path_graph::PathGraph;
use super::priority_queue::PriorityQueue;
use crate::error::Result;
use crate::grid::{CellPos, PassabilityOracle};

pub type Heuristic<'a> = Box<dyn Fn(CellPos) -> i32 + 'a>;
pub type GoalFn<'a> = Box<dyn Fn(CellPos) -> bool + 'a>;

const INITIAL_QUEUE_CAPACITY: usize = 256;

pub struct PathSearch<'a, G: PassabilityOracle + ?Sized> {
    graph: PathGraph<'a, G>,
    heuristic: Heuristic<'a>,
    goal: Option<GoalFn<'a>>,
    queue: PriorityQueue<CellPos>,
    neighbors: Vec<(CellPos, i32)>,
    considered: Option<Vec<(CellPos, i32)>>,
    max_cost: i32,
}

impl<'a, G: PassabilityOracle + ?Sized> PathSearch<'a, G> {
    pub fn new(graph: PathGraph<'a, G>, heuristic: impl Fn(CellPos) -> i32 + 'a) -> Self {
        Self {
            graph,
            heuristic: Box::new(heuristic),
            goal: None,
            queue: PriorityQueue::with_capacity(INITIAL_QUEUE_CAPACITY),
            neighbors: Vec::with_capacity(8),
            considered: None,
            max_cost: 0,
        }
    }

    /// A search seeded from every cell in `origins`.
    pub fn from_points(
        graph: PathGraph<'a, G>,
        origins: impl IntoIterator<Item = CellPos>,
        heuristic: impl Fn(CellPos) -> i32 + 'a,
    ) -> Self {
        let mut search = Self::new(graph, heuristic);
        for origin in origins {
            search.add_origin(origin);
        }
        search
    }

    /// Replace the default "estimate reached zero" goal test.
    pub fn with_goal(mut self, goal: impl Fn(CellPos) -> bool + 'a) -> Self {
        self.goal = Some(Box::new(goal));
        self
    }

    /// Record every considered cell and its cost for overlays, starting with the origins
    /// already seeded.
    pub fn with_debug(mut self) -> Self {
        let seeded = self.graph.layer().visited().map(|(cell, info)| (cell, info.cost_so_far)).collect();
        self.considered = Some(seeded);
        self
    }

    pub fn add_origin(&mut self, cell: CellPos) {
        if !self.graph.layer().bounds().contains(cell) {
            return;
        }
        let estimate = (self.heuristic)(cell);
        self.graph.layer_mut().set(
            cell,
            CellInfo { cost_so_far: 0, estimated_total: estimate, previous: cell, status: CellStatus::Open },
        );
        self.queue.add(estimate, cell);
        if let Some(considered) = self.considered.as_mut() {
            considered.push((cell, 0));
        }
    }

    /// Forget all progress so the same layer and queue can serve another origin.
    pub fn reset(&mut self) {
        self.graph.layer_mut().reset();
        self.queue.clear();
        self.max_cost = 0;
        if let Some(considered) = self.considered.as_mut() {
            considered.clear();
        }
    }

    pub fn graph(&self) -> &PathGraph<'a, G> {
        &self.graph
    }

    pub fn layer(&self) -> &CellLayer {
        self.graph.layer()
    }

    pub fn info(&self, cell: CellPos) -> CellInfo {
        self.graph.layer().get(cell)
    }

    pub fn is_closed(&self, cell: CellPos) -> bool {
        self.info(cell).status == CellStatus::Closed
    }

    fn skip_closed(&mut self) {
        while let Ok((_, top)) = self.queue.peek() {
            if self.graph.layer().get(top).status != CellStatus::Closed {
                break;
            }
            let _ = self.queue.pop();
        }
    }

    pub fn can_expand(&mut self) -> bool {
        self.skip_closed();
        !self.queue.is_empty()
    }

    /// Close the cheapest open cell, relax its neighbours and return it.
    pub fn expand(&mut self) -> Result<CellPos> {
        self.skip_closed();
        let (_, current) = self.queue.pop()?;

        let mut info = self.graph.layer().get(current);
        info.status = CellStatus::Closed;
        self.graph.layer_mut().set(current, info);
        let base = info.cost_so_far;

        self.graph.neighbors_into(current, &mut self.neighbors);
        for &(next, step) in &self.neighbors {
            let known = self.graph.layer().get(next);
            if known.status == CellStatus::Closed {
                continue;
            }
            let cost = base.saturating_add(step);
            if cost >= known.cost_so_far {
                continue;
            }
            let estimate = cost.saturating_add((self.heuristic)(next));
            self.graph.layer_mut().set(
                next,
                CellInfo { cost_so_far: cost, estimated_total: estimate, previous: current, status: CellStatus::Open },
            );
            self.queue.add(estimate, next);

            if let Some(considered) = self.considered.as_mut() {
                considered.push((next, cost));
                self.max_cost = self.max_cost.max(cost);
            }
        }
        Ok(current)
    }

    pub fn is_target(&self, cell: CellPos) -> bool {
        match &self.goal {
            Some(goal) => goal(cell),
            None => {
                let info = self.info(cell);
                info.status != CellStatus::Unvisited && info.estimated_total - info.cost_so_far == 0
            }
        }
    }

    /// Expand until a target is closed. Exhausting the frontier yields the empty path.
    pub fn find_path(&mut self) -> Result<Path> {
        while self.can_expand() {
            let current = self.expand()?;
            if self.is_target(current) {
                trace!("search reached {} after touching {} cells", current, self.layer().touched());
                return Path::reconstruct(self.layer(), current);
            }
        }
        Ok(Path::empty())
    }

    pub fn considered(&self) -> &[(CellPos, i32)] {
        self.considered.as_deref().unwrap_or(&[])
    }

    pub fn max_cost(&self) -> i32 {
        self.max_cost
    }
}
