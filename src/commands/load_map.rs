use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::grid::{LocomotorProfile, OccupancyChange, OccupancyEvent, TileGrid};
use crate::util::parse_cell;

#[derive(Deserialize, Debug)]
struct MapFile {
    rows: Vec<String>,
    #[serde(default)]
    profiles: Option<Vec<LocomotorProfile>>,
}

/// Read a terrain map: JSON `{"rows": [...], "profiles": [...]}` or plain ASCII, one row per
/// line. Maps without profiles use the built-in locomotor table.
pub fn load_map(path: &Path) -> Result<TileGrid> {
    if !path.exists() {
        anyhow::bail!("Map file not found: {}", path.display());
    }
    let text = fs::read_to_string(path).with_context(|| format!("read map {}", path.display()))?;
    let (rows, profiles): (Vec<String>, Option<Vec<LocomotorProfile>>) = if text.trim_start().starts_with('{') {
        let parsed: MapFile = serde_json::from_str(&text).with_context(|| format!("parse JSON map {}", path.display()))?;
        (parsed.rows, parsed.profiles)
    } else {
        (text.lines().map(str::trim_end).filter(|l| !l.is_empty()).map(String::from).collect(), None)
    };
    let mut grid = TileGrid::from_rows(&rows).with_context(|| format!("build grid from {}", path.display()))?;
    if let Some(profiles) = profiles {
        if profiles.is_empty() {
            anyhow::bail!("Map {} lists no locomotor profiles", path.display());
        }
        grid = grid.with_profiles(profiles);
    }
    log::info!("Loaded {}x{} map from {}", rows.first().map_or(0, |r| r.chars().count()), rows.len(), path.display());
    Ok(grid)
}

/// Read occupancy events, one `x,y,entered|left` per line; blank lines and `#` comments are skipped.
pub fn load_events(path: &Path) -> Result<Vec<OccupancyEvent>> {
    if !path.exists() {
        anyhow::bail!("Events file not found: {}", path.display());
    }
    let file = File::open(path).with_context(|| format!("open events file {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut events = Vec::new();
    for (idx, line_res) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line_res.with_context(|| format!("read events line {}", line_no))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some((cell, change)) = trimmed.rsplit_once(',') else {
            anyhow::bail!(
                "Invalid events line {} in {}: expected x,y,entered|left",
                line_no,
                path.display()
            );
        };
        let cell = parse_cell(cell).with_context(|| format!("parse cell on line {}", line_no))?;
        let change = match change.trim().to_ascii_lowercase().as_str() {
            "entered" | "enter" => OccupancyChange::Entered,
            "left" | "leave" => OccupancyChange::Left,
            other => anyhow::bail!("Unknown occupancy change '{}' on line {}", other, line_no),
        };
        events.push(OccupancyEvent { cell, change });
    }
    Ok(events)
}
