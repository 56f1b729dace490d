//! CLI subcommands. Each returns the JSON document the binary prints.

use anyhow::Result;
use std::path::Path;

use crate::cluster::config::Config;

pub mod build;
pub mod dump;
pub mod find_path;
pub mod load_map;
pub mod update;

/// Layer a JSON config file, command-line values and `HPA_*` environment variables, in
/// increasing precedence.
pub fn resolve_config(config_path: Option<&Path>, cli: Config) -> Result<Config> {
    let base = match config_path {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    Ok(base.overlay(cli).overlay(Config::from_env_defaults()))
}
