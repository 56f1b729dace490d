//! Local repair of the hierarchy after passability changes.
//!
//! Per level, bottom-up: clusters holding a changed cell are re-flood-filled, borders holding
//! a changed cell are torn down and detected again, and Intra edges are recomputed only for
//! clusters whose components or entrance nodes changed. The result matches a full rebuild up to
//! component ids.

use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeSet;

use super::cluster_builder::decompose_cluster;
use super::entrance_discovery::{detect_border, promote_border};
use super::executor::validate_manager;
use super::inter_connector::unregister_border;
use super::intra_connector::{build_intra_edges, drop_intra_edges};
use super::models::{BorderPair, ClusterId, ComponentId};
use super::{ClusterLevel, ClustersManager};
use crate::error::Result;
use crate::grid::{CellPos, PassabilityOracle};
use crate::search::layer_pool::CellInfoLayerPool;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct LevelUpdateStats {
    pub level: usize,
    pub clusters_touched: usize,
    pub pairs_recomputed: usize,
    pub clusters_recomputed: usize,
    pub entrances_removed: usize,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct UpdateStats {
    pub levels: Vec<LevelUpdateStats>,
}

impl UpdateStats {
    pub fn pairs_recomputed(&self) -> usize {
        self.levels.iter().map(|l| l.pairs_recomputed).sum()
    }

    pub fn clusters_recomputed(&self) -> usize {
        self.levels.iter().map(|l| l.clusters_recomputed).sum()
    }
}

fn entrance_set(level: &ClusterLevel, id: ClusterId) -> BTreeSet<CellPos> {
    level.cluster(id).map(|c| c.entrances.clone()).unwrap_or_default()
}

pub fn update<G: PassabilityOracle + Sync + ?Sized>(
    manager: &mut ClustersManager,
    grid: &G,
    changed: &[CellPos],
    pool: &CellInfoLayerPool,
) -> Result<UpdateStats> {
    for &cell in changed {
        manager.bounds.check(cell)?;
    }
    let mut stats = UpdateStats::default();
    if changed.is_empty() {
        return Ok(stats);
    }

    let class = manager.class;
    let settings = manager.settings;
    for index in 0..manager.levels.len() {
        let (lower, upper) = manager.levels.split_at_mut(index);
        let child = lower.last();
        let level = &mut upper[0];
        let mut level_stats = LevelUpdateStats { level: index, ..Default::default() };

        let touched: BTreeSet<ClusterId> = changed.iter().filter_map(|&c| level.cluster_at(c)).collect();
        let marked: BTreeSet<BorderPair> = changed.iter().flat_map(|&c| level.pairs_touching(c)).collect();
        level_stats.clusters_touched = touched.len();
        level_stats.pairs_recomputed = marked.len();

        for &id in &touched {
            decompose_cluster(grid, class, level, id)?;
        }

        let mut recompute = touched.clone();
        for &pair in &marked {
            let before = (entrance_set(level, pair.a), entrance_set(level, pair.b));
            let removed = unregister_border(level, pair);
            level_stats.entrances_removed += removed.nodes_removed;
            // a re-detected entrance comes back without the Intra edges its old node had
            recompute.extend(removed.clusters_stripped);
            match child {
                Some(child) => promote_border(child, level, pair)?,
                None => detect_border(grid, class, level, pair, settings.max_entrance_width)?,
            };
            if entrance_set(level, pair.a) != before.0 {
                recompute.insert(pair.a);
            }
            if entrance_set(level, pair.b) != before.1 {
                recompute.insert(pair.b);
            }
        }

        for &id in &recompute {
            drop_intra_edges(level, id);
        }
        let components: Vec<ComponentId> = recompute
            .iter()
            .filter_map(|&id| level.cluster(id))
            .flat_map(|c| c.components.iter().copied())
            .collect();
        build_intra_edges(grid, class, settings.policy, level, &components, pool)?;
        level_stats.clusters_recomputed = recompute.len();

        debug!(
            "{} level {} update: {} touched, {} borders, {} clusters reconnected",
            class, index, level_stats.clusters_touched, level_stats.pairs_recomputed, level_stats.clusters_recomputed
        );
        stats.levels.push(level_stats);
    }

    if cfg!(debug_assertions) {
        validate_manager(manager)?;
    }
    info!(
        "{}: applied {} changed cells, {} borders and {} clusters recomputed",
        class,
        changed.len(),
        stats.pairs_recomputed(),
        stats.clusters_recomputed()
    );
    Ok(stats)
}
