use anyhow::Result;
use log::info;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

use super::load_map::load_map;
use crate::cluster::config::Settings;
use crate::cluster::executor::run_pipeline;
use crate::grid::PassabilityOracle;
use crate::search::layer_pool::CellInfoLayerPool;

#[derive(Serialize, Debug)]
struct LevelSummary {
    level: usize,
    cluster_size: i32,
    clusters: usize,
    components: usize,
    entrances: usize,
    entrance_pairs: usize,
    intra_edges: usize,
    unreachable_pairs: usize,
}

#[derive(Serialize, Debug)]
struct ClassSummary {
    class: String,
    levels: Vec<LevelSummary>,
}

/// Build every movement class's hierarchy and summarise each level.
pub fn cmd_build(map: &Path, settings: &Settings) -> Result<Value> {
    let grid = load_map(map)?;
    let pool = CellInfoLayerPool::new(grid.bounds(), settings.pool_capacity);

    let mut classes = Vec::new();
    for class in grid.movement_classes() {
        let (manager, stats) = run_pipeline(&grid, class, settings, &pool)?;
        let levels = manager
            .levels()
            .iter()
            .zip(&stats.levels)
            .map(|(level, s)| LevelSummary {
                level: s.level,
                cluster_size: s.cluster_size,
                clusters: level.clusters().len(),
                components: level.components().count(),
                entrances: level.graph().node_count(),
                entrance_pairs: s.entrances.entrances_created + s.entrances.edges_promoted,
                intra_edges: s.intra.edges_created,
                unreachable_pairs: s.intra.unreachable_pairs,
            })
            .collect();
        classes.push(ClassSummary { class: class.to_string(), levels });
    }
    info!("Built {} movement classes from {}", classes.len(), map.display());
    Ok(serde_json::to_value(classes)?)
}
