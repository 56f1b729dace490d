//! Cluster hierarchy: decomposition, entrances and the abstract graph per level.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::grid::{CellPos, GridBounds, MovementClass, PassabilityOracle};
use crate::search::layer_pool::CellInfoLayerPool;

pub mod config;
pub mod logging;
pub mod models;
pub mod neighbor_policy;
pub mod graph;
pub mod cluster_builder;
pub mod entrance_discovery;
pub mod inter_connector;
pub mod intra_connector;
pub mod executor;
pub mod updater;
pub mod snapshot;

use config::Settings;
use graph::AbstractGraph;
use models::{BorderPair, BorderSide, Boundaries, Cluster, ClusterId, Component, ComponentId};
use snapshot::ClustersSnapshot;
use updater::UpdateStats;

/// Cluster edge length at `level`: `base * 3^level`.
pub fn cluster_size_at(base: i32, level: usize) -> i32 {
    let factor = 3i32.saturating_pow(u32::try_from(level).unwrap_or(u32::MAX));
    base.saturating_mul(factor)
}

/// One tier of the hierarchy: its clusters, components and abstract graph.
#[derive(Clone, Debug)]
pub struct ClusterLevel {
    pub(crate) level: usize,
    pub(crate) cluster_size: i32,
    pub(crate) bounds: GridBounds,
    pub(crate) columns: i32,
    pub(crate) rows: i32,
    pub(crate) clusters: Vec<Cluster>,
    pub(crate) components: BTreeMap<ComponentId, Component>,
    pub(crate) cell_components: Vec<Option<ComponentId>>,
    pub(crate) graph: AbstractGraph,
    next_component: u32,
}

impl ClusterLevel {
    /// Tile `bounds` into clusters of `cluster_size`; the last column and row absorb the remainder.
    pub fn new(level: usize, cluster_size: i32, bounds: GridBounds) -> Self {
        let columns = (bounds.width / cluster_size).max(1);
        let rows = (bounds.height / cluster_size).max(1);
        let mut clusters = Vec::with_capacity((columns * rows) as usize);
        for cy in 0..rows {
            for cx in 0..columns {
                let left = cx * cluster_size;
                let top = cy * cluster_size;
                let right = if cx == columns - 1 { bounds.width - 1 } else { left + cluster_size - 1 };
                let bottom = if cy == rows - 1 { bounds.height - 1 } else { top + cluster_size - 1 };
                clusters.push(Cluster {
                    id: ClusterId((cy * columns + cx) as u32),
                    level,
                    bounds: Boundaries { top, left, right, bottom },
                    components: Vec::new(),
                    entrances: Default::default(),
                });
            }
        }
        Self {
            level,
            cluster_size,
            bounds,
            columns,
            rows,
            clusters,
            components: BTreeMap::new(),
            cell_components: vec![None; bounds.len()],
            graph: AbstractGraph::new(),
            next_component: 0,
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn cluster_size(&self) -> i32 {
        self.cluster_size
    }

    pub fn dimensions(&self) -> (i32, i32) {
        (self.columns, self.rows)
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(id.0 as usize)
    }

    pub(crate) fn cluster_mut(&mut self, id: ClusterId) -> Option<&mut Cluster> {
        self.clusters.get_mut(id.0 as usize)
    }

    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(&id)
    }

    /// Dense per-cell component table, row-major.
    pub fn cell_components(&self) -> &[Option<ComponentId>] {
        &self.cell_components
    }

    pub fn graph(&self) -> &AbstractGraph {
        &self.graph
    }

    pub fn cluster_at(&self, cell: CellPos) -> Option<ClusterId> {
        if !self.bounds.contains(cell) {
            return None;
        }
        let cx = (cell.x / self.cluster_size).min(self.columns - 1);
        let cy = (cell.y / self.cluster_size).min(self.rows - 1);
        Some(ClusterId((cy * self.columns + cx) as u32))
    }

    pub fn component_at(&self, cell: CellPos) -> Option<ComponentId> {
        if !self.bounds.contains(cell) {
            return None;
        }
        self.cell_components[self.bounds.index(cell)]
    }

    pub(crate) fn allocate_component(&mut self) -> ComponentId {
        let id = ComponentId(self.next_component);
        self.next_component += 1;
        id
    }

    fn grid_position(&self, id: ClusterId) -> (i32, i32) {
        let i = id.0 as i32;
        (i % self.columns, i / self.columns)
    }

    /// Every pair of clusters sharing a border.
    pub fn border_pairs(&self) -> Vec<BorderPair> {
        let mut pairs = Vec::new();
        for cluster in &self.clusters {
            let (cx, cy) = self.grid_position(cluster.id);
            if cx + 1 < self.columns {
                pairs.push(BorderPair { a: cluster.id, b: ClusterId(cluster.id.0 + 1), side: BorderSide::East });
            }
            if cy + 1 < self.rows {
                pairs.push(BorderPair {
                    a: cluster.id,
                    b: ClusterId(cluster.id.0 + self.columns as u32),
                    side: BorderSide::South,
                });
            }
        }
        pairs
    }

    /// Border pairs whose shared edge includes `cell`.
    pub fn pairs_touching(&self, cell: CellPos) -> Vec<BorderPair> {
        let Some(id) = self.cluster_at(cell) else {
            return Vec::new();
        };
        let bounds = self.clusters[id.0 as usize].bounds;
        let (cx, cy) = self.grid_position(id);
        let columns = self.columns as u32;
        let mut pairs = Vec::new();
        if cell.x == bounds.left && cx > 0 {
            pairs.push(BorderPair { a: ClusterId(id.0 - 1), b: id, side: BorderSide::East });
        }
        if cell.x == bounds.right && cx + 1 < self.columns {
            pairs.push(BorderPair { a: id, b: ClusterId(id.0 + 1), side: BorderSide::East });
        }
        if cell.y == bounds.top && cy > 0 {
            pairs.push(BorderPair { a: ClusterId(id.0 - columns), b: id, side: BorderSide::South });
        }
        if cell.y == bounds.bottom && cy + 1 < self.rows {
            pairs.push(BorderPair { a: id, b: ClusterId(id.0 + columns), side: BorderSide::South });
        }
        pairs
    }

    /// Facing cells along the shared edge, `a` side first, in scan order.
    pub fn border_cells(&self, pair: BorderPair) -> Vec<(CellPos, CellPos)> {
        let a = self.clusters[pair.a.0 as usize].bounds;
        match pair.side {
            BorderSide::East => (a.top..=a.bottom).map(|y| (CellPos::new(a.right, y), CellPos::new(a.right + 1, y))).collect(),
            BorderSide::South => {
                (a.left..=a.right).map(|x| (CellPos::new(x, a.bottom), CellPos::new(x, a.bottom + 1))).collect()
            }
        }
    }
}

/// The full hierarchy for one movement class.
#[derive(Clone, Debug)]
pub struct ClustersManager {
    pub(crate) class: MovementClass,
    pub(crate) settings: Settings,
    pub(crate) bounds: GridBounds,
    pub(crate) levels: Vec<ClusterLevel>,
}

impl ClustersManager {
    /// Decompose `grid` for `class` and build every level's abstract graph.
    pub fn build<G: PassabilityOracle + Sync + ?Sized>(grid: &G, class: MovementClass, settings: &Settings) -> Result<Self> {
        let pool = CellInfoLayerPool::new(grid.bounds(), settings.pool_capacity);
        executor::run_pipeline(grid, class, settings, &pool).map(|(manager, _)| manager)
    }

    pub fn class(&self) -> MovementClass {
        self.class
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    pub fn levels(&self) -> &[ClusterLevel] {
        &self.levels
    }

    pub fn level(&self, level: usize) -> Option<&ClusterLevel> {
        self.levels.get(level)
    }

    /// Level consulted by the hierarchical heuristic.
    pub fn heuristic_level(&self) -> &ClusterLevel {
        let index = self.settings.heuristic_level.min(self.levels.len().saturating_sub(1));
        &self.levels[index]
    }

    /// Repair the hierarchy after the cells in `changed` switched passability.
    pub fn update<G: PassabilityOracle + Sync + ?Sized>(
        &mut self,
        grid: &G,
        changed: &[CellPos],
        pool: &CellInfoLayerPool,
    ) -> Result<UpdateStats> {
        updater::update(self, grid, changed, pool)
    }

    pub fn snapshot(&self, level: Option<usize>) -> ClustersSnapshot {
        snapshot::capture(self, level)
    }
}
