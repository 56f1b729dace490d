//! Concrete grid search: scratch layers, the open set and A*/Dijkstra.

pub mod cell_info;
pub mod dijkstra;
pub mod heuristic;
pub mod layer_pool;
pub mod path;
pub mod path_graph;
pub mod path_search;
pub mod priority_queue;

pub use layer_pool::CellInfoLayerPool;
pub use path::Path;
