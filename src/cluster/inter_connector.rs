use log::debug;
use std::collections::BTreeSet;

use super::models::{BorderPair, ClusterId, EdgeKind};
use super::ClusterLevel;
use crate::error::{PathError, Result};
use crate::grid::CellPos;

#[derive(Clone, Debug, Default)]
pub struct InterStats {
    pub edges_removed: usize,
    pub nodes_removed: usize,
    /// Clusters that lost at least one entrance node, and with it that node's Intra edges.
    pub clusters_stripped: BTreeSet<ClusterId>,
}

/// Make `a` and `b` entrance nodes of their own clusters and components and join them with
/// a pair of Inter edges.
pub fn register_entrance_pair(level: &mut ClusterLevel, a: CellPos, b: CellPos) -> Result<()> {
    for cell in [a, b] {
        let cluster = level
            .cluster_at(cell)
            .ok_or_else(|| PathError::Invariant(format!("entrance {} lies outside the grid", cell)))?;
        let component = level.component_at(cell).ok_or_else(|| {
            PathError::Invariant(format!("entrance {} has no component at level {}", cell, level.level))
        })?;
        if let Some(c) = level.cluster_mut(cluster) {
            c.entrances.insert(cell);
        }
        if let Some(c) = level.components.get_mut(&component) {
            c.entrances.insert(cell);
        }
    }
    level.graph.connect_inter(a, b);
    Ok(())
}

/// Drop every Inter edge across `pair` and any entrance left without one.
pub fn unregister_border(level: &mut ClusterLevel, pair: BorderPair) -> InterStats {
    let mut stats = InterStats::default();
    for (a, b) in level.border_cells(pair) {
        let removed = level.graph.disconnect(a, b, EdgeKind::Inter);
        if removed == 0 {
            continue;
        }
        stats.edges_removed += removed;
        for cell in [a, b] {
            if let Some(cluster) = remove_if_orphaned(level, cell) {
                stats.nodes_removed += 1;
                stats.clusters_stripped.insert(cluster);
            }
        }
    }
    debug!(
        "level {} border {}->{}: removed {} inter edges, {} entrances",
        level.level, pair.a.0, pair.b.0, stats.edges_removed, stats.nodes_removed
    );
    stats
}

/// An entrance exists only while it has an Inter edge; otherwise forget it everywhere.
/// Returns the cluster the entrance was taken from.
fn remove_if_orphaned(level: &mut ClusterLevel, cell: CellPos) -> Option<ClusterId> {
    if level.graph.edges(cell).iter().any(|e| e.kind == EdgeKind::Inter) {
        return None;
    }
    level.graph.remove_node(cell);
    let id = level.cluster_at(cell)?;
    if let Some(cluster) = level.cluster_mut(id) {
        cluster.entrances.remove(&cell);
    }
    if let Some(component) = level.component_at(cell).and_then(|c| level.components.get_mut(&c)) {
        component.entrances.remove(&cell);
    }
    Some(id)
}
