use log::{debug, trace};
use rayon::prelude::*;

use super::models::{ClusterId, ComponentId, EdgeKind};
use super::neighbor_policy::MovementPolicy;
use super::ClusterLevel;
use crate::error::Result;
use crate::grid::{CellPos, MovementClass, PassabilityOracle};
use crate::search::dijkstra::Dijkstra;
use crate::search::layer_pool::CellInfoLayerPool;
use crate::search::path::Path;
use crate::search::path_graph::PathGraph;

#[derive(Clone, Debug, Default)]
pub struct IntraStats {
    pub components_processed: usize,
    pub edges_created: usize,
    pub unreachable_pairs: usize,
}

struct ComponentEdges {
    paths: Vec<(CellPos, CellPos, Path)>,
    unreachable: usize,
}

/// Connect every entrance pair inside each listed component with an Intra edge.
///
/// Components are searched in parallel, each worker checking its own layer out of `pool`;
/// edges are written back in component order.
pub fn build_intra_edges<G: PassabilityOracle + Sync + ?Sized>(
    grid: &G,
    class: MovementClass,
    policy: MovementPolicy,
    level: &mut ClusterLevel,
    components: &[ComponentId],
    pool: &CellInfoLayerPool,
) -> Result<IntraStats> {
    let found = {
        let shared: &ClusterLevel = level;
        components
            .par_iter()
            .map(|&id| connect_component(grid, class, policy, shared, id, pool))
            .collect::<Result<Vec<_>>>()?
    };

    let mut stats = IntraStats::default();
    for edges in found {
        stats.components_processed += 1;
        stats.unreachable_pairs += edges.unreachable;
        for (a, b, path) in edges.paths {
            level.graph.connect_intra(a, b, path.cost, path.cells);
            stats.edges_created += 2;
        }
    }
    debug!(
        "level {}: {} intra edges over {} components ({} unreachable pairs)",
        level.level, stats.edges_created, stats.components_processed, stats.unreachable_pairs
    );
    Ok(stats)
}

/// Every component of `level`, in id order.
pub fn build_level_intra_edges<G: PassabilityOracle + Sync + ?Sized>(
    grid: &G,
    class: MovementClass,
    policy: MovementPolicy,
    level: &mut ClusterLevel,
    pool: &CellInfoLayerPool,
) -> Result<IntraStats> {
    let ids: Vec<ComponentId> = level.components.keys().copied().collect();
    build_intra_edges(grid, class, policy, level, &ids, pool)
}

/// Remove all Intra edges owned by the entrances of `cluster`.
pub fn drop_intra_edges(level: &mut ClusterLevel, cluster: ClusterId) -> usize {
    let entrances: Vec<CellPos> = level.cluster(cluster).map(|c| c.entrances.iter().copied().collect()).unwrap_or_default();
    entrances
        .into_iter()
        .map(|e| level.graph.remove_edges(e, |edge| edge.kind == EdgeKind::Intra))
        .sum()
}

fn connect_component<G: PassabilityOracle + ?Sized>(
    grid: &G,
    class: MovementClass,
    policy: MovementPolicy,
    level: &ClusterLevel,
    id: ComponentId,
    pool: &CellInfoLayerPool,
) -> Result<ComponentEdges> {
    let mut out = ComponentEdges { paths: Vec::new(), unreachable: 0 };
    let Some(component) = level.component(id) else {
        return Ok(out);
    };
    let entrances: Vec<CellPos> = component.entrances.iter().copied().collect();
    if entrances.len() < 2 {
        return Ok(out);
    }

    let graph = PathGraph::new(grid, class, policy, pool.get()).confined_to(&level.cell_components, id);
    let mut dijkstra = Dijkstra::new(graph);
    for (i, &origin) in entrances.iter().enumerate() {
        let targets = &entrances[i + 1..];
        if targets.is_empty() {
            break;
        }
        for (&target, path) in targets.iter().zip(dijkstra.run(origin, targets)?) {
            match path {
                Some(path) => out.paths.push((origin, target, path)),
                None => {
                    trace!("component {:?}: {} cannot reach {}", id, origin, target);
                    out.unreachable += 1;
                }
            }
        }
    }
    Ok(out)
}
