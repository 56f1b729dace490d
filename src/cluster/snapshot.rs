use serde::Serialize;

use super::models::{Boundaries, ClusterId, ComponentId, EdgeKind};
use super::{ClusterLevel, ClustersManager};
use crate::grid::{CellPos, MovementClass};
use crate::search::path::reduce_to_breakpoints;

/// Read-only view of the hierarchy for overlays and the `dump` command.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClustersSnapshot {
    pub class: MovementClass,
    pub width: i32,
    pub height: i32,
    pub levels: Vec<LevelSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LevelSnapshot {
    pub level: usize,
    pub cluster_size: i32,
    pub clusters: Vec<ClusterSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClusterSnapshot {
    pub id: ClusterId,
    pub bounds: Boundaries,
    pub entrances: Vec<CellPos>,
    pub components: Vec<ComponentSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentSnapshot {
    pub id: ComponentId,
    pub cells: usize,
    pub entrances: Vec<CellPos>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EdgeSnapshot {
    pub from: CellPos,
    pub to: CellPos,
    pub kind: EdgeKind,
    pub cost: i32,
    /// Turning points of the cached path; empty for Inter edges.
    pub waypoints: Vec<CellPos>,
}

pub fn capture(manager: &ClustersManager, only: Option<usize>) -> ClustersSnapshot {
    let levels = manager
        .levels
        .iter()
        .filter(|l| only.map_or(true, |n| n == l.level))
        .map(capture_level)
        .collect();
    ClustersSnapshot { class: manager.class, width: manager.bounds.width, height: manager.bounds.height, levels }
}

fn capture_level(level: &ClusterLevel) -> LevelSnapshot {
    let clusters = level
        .clusters
        .iter()
        .map(|cluster| ClusterSnapshot {
            id: cluster.id,
            bounds: cluster.bounds,
            entrances: cluster.entrances.iter().copied().collect(),
            components: cluster
                .components
                .iter()
                .filter_map(|&id| level.component(id))
                .map(|c| ComponentSnapshot { id: c.id, cells: c.cells.len(), entrances: c.entrances.iter().copied().collect() })
                .collect(),
        })
        .collect();

    let mut edges: Vec<EdgeSnapshot> = level
        .graph
        .nodes()
        .flat_map(|from| {
            level.graph.edges(from).iter().map(move |e| EdgeSnapshot {
                from,
                to: e.to,
                kind: e.kind,
                cost: e.cost,
                waypoints: reduce_to_breakpoints(&e.path),
            })
        })
        .collect();
    edges.sort_by(|a, b| (a.from, a.to, a.kind).cmp(&(b.from, b.to, b.kind)));

    LevelSnapshot { level: level.level, cluster_size: level.cluster_size, clusters, edges }
}
