#![allow(dead_code)]

use cluster_pathfinder::cluster::models::EdgeKind;
use cluster_pathfinder::cluster::ClustersManager;
use cluster_pathfinder::grid::CellPos;

/// Level contents with component ids erased: the cell partition, the entrance nodes and every
/// edge as `(from, to, kind, cost)`.
#[derive(Debug, PartialEq, Eq)]
pub struct CanonicalLevel {
    pub partition: Vec<Vec<CellPos>>,
    pub entrances: Vec<CellPos>,
    pub edges: Vec<(CellPos, CellPos, EdgeKind, i32)>,
}

pub fn canonical(manager: &ClustersManager) -> Vec<CanonicalLevel> {
    manager
        .levels()
        .iter()
        .map(|level| {
            let mut partition: Vec<Vec<CellPos>> = level
                .components()
                .map(|c| {
                    let mut cells = c.cells.clone();
                    cells.sort();
                    cells
                })
                .collect();
            partition.sort();
            let entrances: Vec<CellPos> = level.graph().nodes().collect();
            let mut edges: Vec<(CellPos, CellPos, EdgeKind, i32)> = entrances
                .iter()
                .flat_map(|&from| level.graph().edges(from).iter().map(move |e| (from, e.to, e.kind, e.cost)))
                .collect();
            edges.sort();
            CanonicalLevel { partition, entrances, edges }
        })
        .collect()
}

/// Deterministic scatter of rock cells from a seed.
pub fn scattered_rows(width: usize, height: usize, seed: u64, density_percent: u64) -> Vec<String> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..height)
        .map(|_| {
            (0..width)
                .map(|_| {
                    state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                    if (state >> 33) % 100 < density_percent { '#' } else { '.' }
                })
                .collect()
        })
        .collect()
}
