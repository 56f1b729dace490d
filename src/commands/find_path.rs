use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::path::Path;

use super::load_map::load_map;
use crate::cluster::config::Settings;
use crate::grid::{CellPos, MovementClass};
use crate::pathfinder::PathFinder;
use crate::search::path::reduce_to_breakpoints;

/// Run one query and report the path, its turning points and, with `trace`, the search frontier.
pub fn cmd_path(
    map: &Path,
    settings: &Settings,
    from: CellPos,
    to: CellPos,
    class: MovementClass,
    trace: bool,
) -> Result<Value> {
    let finder = PathFinder::new(load_map(map)?, *settings)?;
    let path = finder
        .find_path(from, to, class)
        .with_context(|| format!("find {} path {} -> {}", class, from, to))?;
    log::info!("{} path {} -> {}: {} cells, cost {}", class, from, to, path.len(), path.cost);

    let mut out = json!({
        "class": class.to_string(),
        "found": !path.is_empty(),
        "cost": path.cost,
        "waypoints": reduce_to_breakpoints(&path.cells),
        "cells": path.cells,
    });
    if trace {
        let traced = finder.trace_path(from, to, class)?;
        out["trace"] = json!({
            "considered": traced.considered.len(),
            "max_cost": traced.max_cost,
            "cost": traced.path.cost,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reports_path_and_trace() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let map = dir.path().join("map.txt");
        fs::write(&map, "....\n###.\n....\n")?;
        let out = cmd_path(&map, &Settings::default(), CellPos::new(0, 0), CellPos::new(0, 2), MovementClass::FOOT, true)?;
        assert_eq!(out["found"], true);
        assert_eq!(out["cells"][0], json!({ "x": 0, "y": 0 }));
        assert!(out["trace"]["considered"].as_u64().unwrap_or(0) > 0);

        let blocked = cmd_path(&map, &Settings::default(), CellPos::new(0, 0), CellPos::new(0, 1), MovementClass::FOOT, false)?;
        assert_eq!(blocked["found"], false);
        assert_eq!(blocked["cost"], 0);

        let outside = cmd_path(&map, &Settings::default(), CellPos::new(0, 0), CellPos::new(9, 9), MovementClass::FOOT, false);
        assert!(outside.is_err());
        Ok(())
    }
}
