use log::info;

use super::cluster_builder::{self, BuildStats};
use super::config::Settings;
use super::entrance_discovery::{self, EntrancesStats};
use super::intra_connector::{self, IntraStats};
use super::models::EdgeKind;
use super::{cluster_size_at, ClusterLevel, ClustersManager};
use crate::error::{PathError, Result};
use crate::grid::{CellPos, MovementClass, PassabilityOracle};
use crate::search::layer_pool::CellInfoLayerPool;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Stage {
    Decompose,
    Entrances,
    Intra,
    Validate,
}

impl Stage {
    pub fn key(self) -> &'static str {
        match self {
            Stage::Decompose => "decompose",
            Stage::Entrances => "entrances",
            Stage::Intra => "intra",
            Stage::Validate => "validate",
        }
    }

    /// Stages run once per level, in order.
    pub fn per_level() -> &'static [Stage] {
        &[Stage::Decompose, Stage::Entrances, Stage::Intra]
    }
}

#[derive(Clone, Debug, Default)]
pub struct LevelStats {
    pub level: usize,
    pub cluster_size: i32,
    pub build: BuildStats,
    pub entrances: EntrancesStats,
    pub intra: IntraStats,
}

#[derive(Clone, Debug, Default)]
pub struct ExecStats {
    pub levels: Vec<LevelStats>,
    pub ran_validate: bool,
}

/// Build the whole hierarchy for `class`: each level is decomposed, bordered and connected
/// before the next one is promoted from it, then the result is validated.
pub fn run_pipeline<G: PassabilityOracle + Sync + ?Sized>(
    grid: &G,
    class: MovementClass,
    settings: &Settings,
    pool: &CellInfoLayerPool,
) -> Result<(ClustersManager, ExecStats)> {
    settings.validate()?;
    let bounds = grid.bounds();
    if bounds.width <= 0 || bounds.height <= 0 {
        return Err(PathError::InvalidMap(format!("grid is {}x{}", bounds.width, bounds.height)));
    }
    if !grid.has_movement_class(class) {
        return Err(PathError::UnknownMovementClass(class));
    }

    let mut stats = ExecStats::default();
    let mut levels: Vec<ClusterLevel> = Vec::with_capacity(settings.levels);
    for index in 0..settings.levels {
        let size = cluster_size_at(settings.cluster_size, index);
        levels.push(ClusterLevel::new(index, size, bounds));
        let mut level_stats = LevelStats { level: index, cluster_size: size, ..Default::default() };

        for &stage in Stage::per_level() {
            match stage {
                Stage::Decompose => {
                    level_stats.build = cluster_builder::build_clusters(grid, class, &mut levels[index])?;
                    validate_build(grid, class, &levels[index])?;
                }
                Stage::Entrances => {
                    level_stats.entrances = entrance_discovery::discover_entrances(
                        grid,
                        class,
                        &mut levels,
                        index,
                        settings.max_entrance_width,
                    )?;
                    validate_inter(&levels[index])?;
                }
                Stage::Intra => {
                    level_stats.intra = intra_connector::build_level_intra_edges(
                        grid,
                        class,
                        settings.policy,
                        &mut levels[index],
                        pool,
                    )?;
                    validate_intra(&levels[index])?;
                }
                Stage::Validate => {}
            }
        }
        info!(
            "{} level {} (size {}): {} clusters, {} components, {} entrances, {} intra edges",
            class,
            index,
            size,
            level_stats.build.clusters_processed,
            level_stats.build.components_created,
            levels[index].graph.node_count(),
            level_stats.intra.edges_created
        );
        stats.levels.push(level_stats);
    }

    let manager = ClustersManager { class, settings: *settings, bounds, levels };
    validate_manager(&manager)?;
    stats.ran_validate = true;
    info!("{}: {} stage complete", class, Stage::Validate.key());
    Ok((manager, stats))
}

// ---- Validations ----

/// Enterable cells belong to exactly one component, blocked cells to none.
pub fn validate_build<G: PassabilityOracle + ?Sized>(grid: &G, class: MovementClass, level: &ClusterLevel) -> Result<()> {
    let bounds = level.bounds;
    for (index, owner) in level.cell_components.iter().enumerate() {
        let cell = bounds.cell_at(index);
        if owner.is_some() != grid.can_enter_cell(cell, class) {
            return Err(PathError::Invariant(format!(
                "validate_build: level {} cell {} component {:?} disagrees with passability",
                level.level, cell, owner
            )));
        }
    }
    let listed: usize = level.components.values().map(|c| c.cells.len()).sum();
    let owned = level.cell_components.iter().filter(|c| c.is_some()).count();
    if listed != owned {
        return Err(PathError::Invariant(format!(
            "validate_build: level {} lists {} component cells but owns {}",
            level.level, listed, owned
        )));
    }
    Ok(())
}

/// Inter edges come in mirrored pairs of equal cost between different clusters.
pub fn validate_inter(level: &ClusterLevel) -> Result<()> {
    for node in level.graph.nodes() {
        for edge in level.graph.edges(node).iter().filter(|e| e.kind == EdgeKind::Inter) {
            let mirrored = level.graph.edge(edge.to, node, EdgeKind::Inter).map(|e| e.cost);
            if mirrored != Some(edge.cost) {
                return Err(PathError::Invariant(format!(
                    "validate_inter: {} -> {} has no mirror of cost {}",
                    node, edge.to, edge.cost
                )));
            }
            if level.cluster_at(node) == level.cluster_at(edge.to) {
                return Err(PathError::Invariant(format!("validate_inter: {} -> {} stays inside one cluster", node, edge.to)));
            }
        }
    }
    Ok(())
}

/// Intra edges are mirrored, stay inside one component and carry their path.
pub fn validate_intra(level: &ClusterLevel) -> Result<()> {
    for node in level.graph.nodes() {
        for edge in level.graph.edges(node).iter().filter(|e| e.kind == EdgeKind::Intra) {
            let mirrored = level.graph.edge(edge.to, node, EdgeKind::Intra).map(|e| e.cost);
            if mirrored != Some(edge.cost) {
                return Err(PathError::Invariant(format!("validate_intra: {} -> {} is not paired", node, edge.to)));
            }
            if level.component_at(node) != level.component_at(edge.to) {
                return Err(PathError::Invariant(format!("validate_intra: {} -> {} spans components", node, edge.to)));
            }
            if edge.path.first() != Some(&node) || edge.path.last() != Some(&edge.to) {
                return Err(PathError::Invariant(format!("validate_intra: {} -> {} path endpoints", node, edge.to)));
            }
        }
    }
    Ok(())
}

/// No orphaned nodes, and every node is registered as an entrance of its cluster and component.
pub fn validate_manager(manager: &ClustersManager) -> Result<()> {
    for pair in manager.levels.windows(2) {
        let (child, parent) = (&pair[0], &pair[1]);
        for c in &child.clusters {
            let corner = CellPos::new(c.bounds.left, c.bounds.top);
            let nested = parent
                .cluster_at(corner)
                .and_then(|id| parent.cluster(id))
                .map_or(false, |p| p.bounds.contains_bounds(&c.bounds));
            if !nested {
                return Err(PathError::Invariant(format!(
                    "validate_manager: level {} cluster {} straddles level {} clusters",
                    child.level, c.id.0, parent.level
                )));
            }
        }
    }
    for level in &manager.levels {
        for node in level.graph.nodes() {
            if level.graph.edges(node).iter().all(|e| e.kind != EdgeKind::Inter) {
                return Err(PathError::Invariant(format!(
                    "validate_manager: level {} node {} has no inter edge",
                    level.level, node
                )));
            }
            let in_cluster = level
                .cluster_at(node)
                .and_then(|id| level.cluster(id))
                .map_or(false, |c| c.entrances.contains(&node));
            let in_component = level
                .component_at(node)
                .and_then(|id| level.component(id))
                .map_or(false, |c| c.entrances.contains(&node));
            if !in_cluster || !in_component {
                return Err(PathError::Invariant(format!(
                    "validate_manager: level {} node {} is not registered",
                    level.level, node
                )));
            }
        }
        let registered: usize = level.clusters.iter().map(|c| c.entrances.len()).sum();
        if registered != level.graph.node_count() {
            return Err(PathError::Invariant(format!(
                "validate_manager: level {} registers {} entrances for {} nodes",
                level.level,
                registered,
                level.graph.node_count()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TileGrid;

    #[test]
    fn pipeline_runs_every_level() -> Result<()> {
        let grid = TileGrid::new(60, 60);
        let settings = Settings { levels: 2, ..Settings::default() };
        let pool = CellInfoLayerPool::new(grid.bounds(), 4);
        let (manager, stats) = run_pipeline(&grid, MovementClass::FOOT, &settings, &pool)?;
        assert!(stats.ran_validate);
        assert_eq!(stats.levels.len(), 2);
        assert_eq!(stats.levels[0].build.clusters_processed, 36);
        assert_eq!(stats.levels[1].build.clusters_processed, 4);
        assert_eq!(stats.levels[1].cluster_size, 30);
        assert!(stats.levels[1].entrances.edges_promoted > 0);
        assert_eq!(manager.levels().len(), 2);
        Ok(())
    }

    #[test]
    fn bad_inputs_abort_the_build() {
        let grid = TileGrid::new(10, 10);
        let pool = CellInfoLayerPool::new(grid.bounds(), 1);
        let zero = Settings { cluster_size: 0, ..Settings::default() };
        assert!(matches!(run_pipeline(&grid, MovementClass::FOOT, &zero, &pool), Err(PathError::InvalidMap(_))));
        let unknown = run_pipeline(&grid, MovementClass(9), &Settings::default(), &pool);
        assert!(matches!(unknown, Err(PathError::UnknownMovementClass(MovementClass(9)))));
        let empty = TileGrid::new(0, 0);
        let res = run_pipeline(&empty, MovementClass::FOOT, &Settings::default(), &pool);
        assert!(matches!(res, Err(PathError::InvalidMap(_))));
    }
}
