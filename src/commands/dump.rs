use anyhow::Result;
use serde_json::Value;
use std::path::Path;

use super::load_map::load_map;
use crate::cluster::config::Settings;
use crate::cluster::ClustersManager;
use crate::grid::MovementClass;

/// Serialise the hierarchy of one movement class, optionally a single level.
pub fn cmd_dump(map: &Path, settings: &Settings, class: MovementClass, level: Option<usize>) -> Result<Value> {
    let grid = load_map(map)?;
    let manager = ClustersManager::build(&grid, class, settings)?;
    if let Some(level) = level {
        if manager.level(level).is_none() {
            anyhow::bail!("Level {} not built; {} levels available", level, manager.levels().len());
        }
    }
    Ok(serde_json::to_value(manager.snapshot(level))?)
}
