use anyhow::Result;

use cluster_pathfinder::cluster::config::Settings;
use cluster_pathfinder::cluster::executor::{self, validate_manager};
use cluster_pathfinder::cluster::models::EdgeKind;
use cluster_pathfinder::cluster::neighbor_policy::MovementPolicy;
use cluster_pathfinder::cluster::ClustersManager;
use cluster_pathfinder::grid::{CellPos, MovementClass, PassabilityOracle, TileGrid};
use cluster_pathfinder::search::dijkstra::Dijkstra;
use cluster_pathfinder::search::layer_pool::CellInfoLayerPool;
use cluster_pathfinder::search::path_graph::PathGraph;

mod common;
use common::{canonical, scattered_rows};

#[test]
fn pipeline_runs_all_stages() -> Result<()> {
    let grid = TileGrid::from_rows(&scattered_rows(60, 45, 7, 20))?;
    let settings = Settings { levels: 2, ..Settings::default() };
    let pool = CellInfoLayerPool::new(grid.bounds(), settings.pool_capacity);
    let (manager, stats) = executor::run_pipeline(&grid, MovementClass::FOOT, &settings, &pool)?;
    assert!(stats.ran_validate);
    assert_eq!(stats.levels.len(), 2);
    assert_eq!(stats.levels[0].build.clusters_processed, 6 * 4);
    assert_eq!(stats.levels[1].build.clusters_processed, 2);
    validate_manager(&manager)?;

    // every enterable cell has exactly one component per level, blocked cells none
    for level in manager.levels() {
        for y in 0..45 {
            for x in 0..60 {
                let cell = CellPos::new(x, y);
                assert_eq!(level.component_at(cell).is_some(), grid.can_enter_cell(cell, MovementClass::FOOT));
            }
        }
    }
    Ok(())
}

#[test]
fn open_map_has_one_midpoint_entrance_per_border() -> Result<()> {
    let grid = TileGrid::new(20, 20);
    let settings = Settings { max_entrance_width: 10, ..Settings::default() };
    let manager = ClustersManager::build(&grid, MovementClass::FOOT, &settings)?;
    let level = &manager.levels()[0];
    assert_eq!(level.clusters().len(), 4);
    assert_eq!(level.components().count(), 4);
    for cluster in level.clusters() {
        assert_eq!(cluster.components.len(), 1);
    }

    let graph = level.graph();
    assert_eq!(graph.node_count(), 8);
    for (a, b) in [((9, 4), (10, 4)), ((4, 9), (4, 10)), ((9, 14), (10, 14)), ((14, 9), (14, 10))] {
        let (a, b) = (CellPos::from(a), CellPos::from(b));
        assert_eq!(graph.edge(a, b, EdgeKind::Inter).map(|e| e.cost), Some(1));
        assert_eq!(graph.edge(b, a, EdgeKind::Inter).map(|e| e.cost), Some(1));
    }
    Ok(())
}

#[test]
fn long_open_border_gets_entrances_at_both_ends() -> Result<()> {
    let grid = TileGrid::new(20, 10);
    let manager = ClustersManager::build(&grid, MovementClass::FOOT, &Settings::default())?;
    let graph = manager.levels()[0].graph();
    assert_eq!(graph.node_count(), 4);
    assert!(graph.edge(CellPos::new(9, 0), CellPos::new(10, 0), EdgeKind::Inter).is_some());
    assert!(graph.edge(CellPos::new(9, 9), CellPos::new(10, 9), EdgeKind::Inter).is_some());
    Ok(())
}

#[test]
fn rebuild_is_idempotent() -> Result<()> {
    let grid = TileGrid::from_rows(&scattered_rows(37, 29, 11, 30))?;
    let settings = Settings { cluster_size: 4, levels: 2, ..Settings::default() };
    let first = ClustersManager::build(&grid, MovementClass::FOOT, &settings)?;
    let second = ClustersManager::build(&grid, MovementClass::FOOT, &settings)?;
    assert_eq!(canonical(&first), canonical(&second));
    assert_eq!(first.snapshot(None), second.snapshot(None));
    Ok(())
}

#[test]
fn intra_costs_match_an_independent_confined_search() -> Result<()> {
    let grid = TileGrid::from_rows(&scattered_rows(30, 30, 3, 25))?;
    let settings = Settings { levels: 2, cluster_size: 5, ..Settings::default() };
    let manager = ClustersManager::build(&grid, MovementClass::FOOT, &settings)?;
    let pool = CellInfoLayerPool::new(grid.bounds(), 1);

    let mut checked = 0;
    for level in manager.levels() {
        for component in level.components() {
            let entrances: Vec<CellPos> = component.entrances.iter().copied().collect();
            for &a in &entrances {
                let graph = PathGraph::new(&grid, MovementClass::FOOT, MovementPolicy::default(), pool.get())
                    .confined_to(level.cell_components(), component.id);
                let others: Vec<CellPos> = entrances.iter().copied().filter(|&b| b != a).collect();
                let paths = Dijkstra::new(graph).run(a, &others)?;
                for (&b, path) in others.iter().zip(paths) {
                    let cached = level.graph().edge(a, b, EdgeKind::Intra).map(|e| e.cost);
                    assert_eq!(cached, path.map(|p| p.cost), "level {} {} -> {}", level.level(), a, b);
                    checked += 1;
                }
            }
        }
    }
    assert!(checked > 0);
    Ok(())
}

#[test]
fn abstract_route_splices_into_a_walkable_path() -> Result<()> {
    let grid = TileGrid::from_rows(&scattered_rows(40, 40, 5, 15))?;
    let manager = ClustersManager::build(&grid, MovementClass::FOOT, &Settings::default())?;
    let level = &manager.levels()[0];
    let graph = level.graph();
    let nodes: Vec<CellPos> = graph.nodes().collect();
    let (Some(&from), Some(&to)) = (nodes.first(), nodes.last()) else {
        anyhow::bail!("map produced no entrances");
    };

    let Some((cost, route)) = graph.route(from, to) else {
        // the scatter may separate the two corners; nothing to splice then
        return Ok(());
    };
    let cells = graph.splice(&route).ok_or_else(|| anyhow::anyhow!("route has no edges to splice"))?;
    assert_eq!(cells.first(), Some(&from));
    assert_eq!(cells.last(), Some(&to));
    let policy = MovementPolicy::default();
    let mut walked = 0;
    for pair in cells.windows(2) {
        assert!(pair[0].is_adjacent(pair[1]));
        assert!(policy.can_step(&grid, MovementClass::FOOT, pair[0], pair[1]));
        walked += policy.step_cost(&grid, MovementClass::FOOT, pair[0], pair[1]);
    }
    // inter edges cost 1 in the abstract graph but a full step on the grid
    assert!(walked >= cost);
    Ok(())
}

#[test]
fn malformed_inputs_abort_the_build() {
    let grid = TileGrid::new(10, 10);
    assert!(ClustersManager::build(&grid, MovementClass::FOOT, &Settings { levels: 0, ..Settings::default() }).is_err());
    assert!(ClustersManager::build(&grid, MovementClass(42), &Settings::default()).is_err());
    assert!(TileGrid::from_rows(&["..", "..."]).is_err());
}
