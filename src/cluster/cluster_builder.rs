use log::debug;
use std::collections::VecDeque;

use super::models::{ClusterId, Component};
use super::neighbor_policy::CARDINAL_OFFSETS;
use super::ClusterLevel;
use crate::error::{PathError, Result};
use crate::grid::{CellPos, MovementClass, PassabilityOracle};

#[derive(Clone, Debug, Default)]
pub struct BuildStats {
    pub clusters_processed: usize,
    pub components_created: usize,
}

/// Flood-fill every cluster of `level`.
pub fn build_clusters<G: PassabilityOracle + ?Sized>(
    grid: &G,
    class: MovementClass,
    level: &mut ClusterLevel,
) -> Result<BuildStats> {
    let mut stats = BuildStats::default();
    for index in 0..level.clusters.len() {
        stats.components_created += decompose_cluster(grid, class, level, ClusterId(index as u32))?;
        stats.clusters_processed += 1;
    }
    Ok(stats)
}

/// Replace the components of one cluster with a fresh 4-connected flood fill and re-attach its
/// entrances to whichever new component now holds them. Returns the number of components.
pub fn decompose_cluster<G: PassabilityOracle + ?Sized>(
    grid: &G,
    class: MovementClass,
    level: &mut ClusterLevel,
    id: ClusterId,
) -> Result<usize> {
    let (bounds, old) = match level.cluster_mut(id) {
        Some(cluster) => (cluster.bounds, std::mem::take(&mut cluster.components)),
        None => return Err(PathError::Invariant(format!("no cluster {:?} at level {}", id, level.level))),
    };
    let grid_bounds = level.bounds;

    for component in old {
        if let Some(removed) = level.components.remove(&component) {
            for cell in removed.cells {
                level.cell_components[grid_bounds.index(cell)] = None;
            }
        }
    }

    let mut created = Vec::new();
    let mut queue: VecDeque<CellPos> = VecDeque::new();
    for start in bounds.cells() {
        let start_idx = grid_bounds.index(start);
        if level.cell_components[start_idx].is_some() || !grid.can_enter_cell(start, class) {
            continue;
        }

        let component = level.allocate_component();
        let mut cells = Vec::new();
        level.cell_components[start_idx] = Some(component);
        queue.push_back(start);
        while let Some(cell) = queue.pop_front() {
            cells.push(cell);
            for offset in CARDINAL_OFFSETS {
                let next = cell.offset(offset.0, offset.1);
                if !bounds.contains(next) {
                    continue;
                }
                let idx = grid_bounds.index(next);
                if level.cell_components[idx].is_none() && grid.can_enter_cell(next, class) {
                    level.cell_components[idx] = Some(component);
                    queue.push_back(next);
                }
            }
        }
        cells.sort_unstable_by_key(|c| (c.y, c.x));
        level.components.insert(
            component,
            Component { id: component, cluster: id, cells, entrances: Default::default() },
        );
        created.push(component);
    }

    let entrances: Vec<CellPos> = level.cluster(id).map(|c| c.entrances.iter().copied().collect()).unwrap_or_default();
    for entrance in entrances {
        if let Some(component) = level.component_at(entrance).and_then(|c| level.components.get_mut(&c)) {
            component.entrances.insert(entrance);
        }
    }

    debug!(
        "level {} cluster {} [{}..={}, {}..={}]: {} components",
        level.level,
        id.0,
        bounds.left,
        bounds.right,
        bounds.top,
        bounds.bottom,
        created.len()
    );
    let count = created.len();
    if let Some(cluster) = level.cluster_mut(id) {
        cluster.components = created;
    }
    Ok(count)
}
