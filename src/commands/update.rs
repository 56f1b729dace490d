use anyhow::Result;
use log::info;
use serde_json::{json, Value};
use std::path::Path;

use super::load_map::{load_events, load_map};
use crate::cluster::config::Settings;
use crate::pathfinder::PathFinder;

/// Apply an occupancy events file and report what each class had to recompute.
pub fn cmd_update(map: &Path, events: &Path, settings: &Settings) -> Result<Value> {
    let mut finder = PathFinder::new(load_map(map)?, *settings)?;
    let events = load_events(events)?;
    let stats = finder.apply_occupancy_events(&events)?;
    info!("Applied {} occupancy events", events.len());

    let classes: Vec<Value> = stats
        .into_iter()
        .map(|(class, s)| {
            json!({
                "class": class.to_string(),
                "pairs_recomputed": s.pairs_recomputed(),
                "clusters_recomputed": s.clusters_recomputed(),
                "levels": s.levels,
            })
        })
        .collect();
    Ok(json!({ "events": events.len(), "classes": classes, "map": finder.grid().to_rows() }))
}
