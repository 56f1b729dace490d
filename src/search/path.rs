use serde::Serialize;

use super::cell_info::CellLayer;
use crate::error::{PathError, Result};
use crate::grid::CellPos;

/// Ordered cells from source to target plus the total cost.
///
/// No path is the empty list with cost 0.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Path {
    pub cells: Vec<CellPos>,
    pub cost: i32,
}

impl Path {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(cell: CellPos) -> Self {
        Self { cells: vec![cell], cost: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn source(&self) -> Option<CellPos> {
        self.cells.first().copied()
    }

    pub fn target(&self) -> Option<CellPos> {
        self.cells.last().copied()
    }

    /// Walk predecessor links from `goal` back to the search origin.
    pub fn reconstruct(layer: &CellLayer, goal: CellPos) -> Result<Path> {
        let mut cells = walk_predecessors(layer, goal)?;
        cells.reverse();
        Ok(Path { cells, cost: layer.get(goal).cost_so_far })
    }

    /// Join the halves of a bidirectional search at `meet`, which both sides have reached.
    pub fn join(forward: &CellLayer, reverse: &CellLayer, meet: CellPos) -> Result<Path> {
        let mut cells = walk_predecessors(forward, meet)?;
        cells.reverse();
        let tail = walk_predecessors(reverse, meet)?;
        cells.extend(tail.into_iter().skip(1));
        let cost = forward.get(meet).cost_so_far.saturating_add(reverse.get(meet).cost_so_far);
        Ok(Path { cells, cost })
    }
}

/// `start` first, origin last.
fn walk_predecessors(layer: &CellLayer, start: CellPos) -> Result<Vec<CellPos>> {
    let limit = layer.bounds().len();
    let mut cells = vec![start];
    let mut current = start;
    loop {
        let previous = layer.get(current).previous;
        if previous == current {
            return Ok(cells);
        }
        if cells.len() > limit {
            return Err(PathError::Invariant(format!("predecessor cycle through {}", start)));
        }
        cells.push(previous);
        current = previous;
    }
}

/// Keep only the cells where the direction of travel changes, plus both ends.
pub fn reduce_to_breakpoints(path: &[CellPos]) -> Vec<CellPos> {
    if path.len() < 2 {
        return path.to_vec();
    }
    let mut reduced = Vec::with_capacity(path.len());
    reduced.push(path[0]);
    for window in path.windows(3) {
        if direction(window[0], window[1]) != direction(window[1], window[2]) && reduced.last() != Some(&window[1]) {
            reduced.push(window[1]);
        }
    }
    if let Some(&last) = path.last() {
        if reduced.last() != Some(&last) {
            reduced.push(last);
        }
    }
    reduced
}

fn direction(from: CellPos, to: CellPos) -> (i32, i32) {
    ((to.x - from.x).signum(), (to.y - from.y).signum())
}
