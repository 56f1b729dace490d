//! Hierarchical path-finding over grid maps.
//!
//! The map is tiled into clusters, each cluster is split into connected components, and
//! entrances across cluster borders form an abstract graph per level. Queries run A* on the
//! concrete grid guided by that graph; occupancy changes repair the graph locally.

pub mod cluster;
pub mod commands;
pub mod error;
pub mod grid;
pub mod pathfinder;
pub mod search;
pub mod util;

pub use cluster::config::{Config, HeuristicKind, Settings};
pub use cluster::neighbor_policy::MovementPolicy;
pub use cluster::ClustersManager;
pub use error::{PathError, Result};
pub use grid::{CellPos, GridBounds, MovementClass, OccupancyEvent, PassabilityOracle, TileGrid};
pub use pathfinder::PathFinder;
pub use search::Path;
