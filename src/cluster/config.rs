use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, str::FromStr};

use super::neighbor_policy::MovementPolicy;
use crate::error::PathError;
use crate::search::layer_pool::DEFAULT_POOL_CAPACITY;
use crate::util::parse_flag;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeuristicKind {
    Diagonal,
    Hierarchical,
}

impl FromStr for HeuristicKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diagonal" => Ok(HeuristicKind::Diagonal),
            "hierarchical" => Ok(HeuristicKind::Hierarchical),
            other => Err(format!("unknown heuristic '{}'", other)),
        }
    }
}

/// Resolved build and query parameters.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Settings {
    pub cluster_size: i32,
    pub levels: usize,
    pub max_entrance_width: i32,
    pub pool_capacity: usize,
    pub heuristic: HeuristicKind,
    /// Level whose abstract graph drives the hierarchical heuristic; clamped to the top level.
    pub heuristic_level: usize,
    pub bidirectional: bool,
    pub policy: MovementPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cluster_size: 10,
            levels: 1,
            max_entrance_width: 6,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            heuristic: HeuristicKind::Hierarchical,
            heuristic_level: 0,
            bidirectional: true,
            policy: MovementPolicy::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.cluster_size <= 0 {
            return Err(PathError::InvalidMap(format!("cluster size must be positive, got {}", self.cluster_size)));
        }
        if self.levels == 0 {
            return Err(PathError::InvalidMap("at least one cluster level is required".into()));
        }
        if self.max_entrance_width <= 0 {
            return Err(PathError::InvalidMap(format!(
                "max entrance width must be positive, got {}",
                self.max_entrance_width
            )));
        }
        Ok(())
    }
}

/// Partial configuration; unset fields fall through to the next layer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub cluster_size: Option<i32>,
    pub levels: Option<usize>,
    pub max_entrance_width: Option<usize>,
    pub pool_capacity: Option<usize>,
    pub heuristic: Option<HeuristicKind>,
    pub heuristic_level: Option<usize>,
    pub bidirectional: Option<bool>,
    pub allow_diagonals: Option<bool>,
    pub allow_corner_cut: Option<bool>,
    pub threads: Option<usize>,
    pub log_level: Option<String>,
}

impl Config {
    pub fn from_env_defaults() -> Self {
        let num = |key: &str| env::var(key).ok().and_then(|s| s.trim().parse::<usize>().ok());
        let flag = |key: &str| env::var(key).ok().and_then(|s| parse_flag(&s));
        Self {
            cluster_size: env::var("HPA_CLUSTER_SIZE").ok().and_then(|s| s.trim().parse::<i32>().ok()),
            levels: num("HPA_LEVELS"),
            max_entrance_width: num("HPA_MAX_ENTRANCE_WIDTH"),
            pool_capacity: num("HPA_POOL_CAPACITY"),
            heuristic: env::var("HPA_HEURISTIC").ok().and_then(|s| s.parse().ok()),
            heuristic_level: num("HPA_HEURISTIC_LEVEL"),
            bidirectional: flag("HPA_BIDIRECTIONAL"),
            allow_diagonals: flag("HPA_ALLOW_DIAGONALS"),
            allow_corner_cut: flag("HPA_ALLOW_CORNER_CUT"),
            threads: num("HPA_THREADS"),
            log_level: env::var("HPA_LOG_LEVEL").ok(),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    /// Fields set in `top` win.
    pub fn overlay(self, top: Config) -> Config {
        Config {
            cluster_size: top.cluster_size.or(self.cluster_size),
            levels: top.levels.or(self.levels),
            max_entrance_width: top.max_entrance_width.or(self.max_entrance_width),
            pool_capacity: top.pool_capacity.or(self.pool_capacity),
            heuristic: top.heuristic.or(self.heuristic),
            heuristic_level: top.heuristic_level.or(self.heuristic_level),
            bidirectional: top.bidirectional.or(self.bidirectional),
            allow_diagonals: top.allow_diagonals.or(self.allow_diagonals),
            allow_corner_cut: top.allow_corner_cut.or(self.allow_corner_cut),
            threads: top.threads.or(self.threads),
            log_level: top.log_level.or(self.log_level),
        }
    }

    pub fn settings(&self) -> Settings {
        let d = Settings::default();
        Settings {
            cluster_size: self.cluster_size.unwrap_or(d.cluster_size),
            levels: self.levels.unwrap_or(d.levels),
            max_entrance_width: self
                .max_entrance_width
                .map(|w| i32::try_from(w).unwrap_or(i32::MAX))
                .unwrap_or(d.max_entrance_width),
            pool_capacity: self.pool_capacity.unwrap_or(d.pool_capacity),
            heuristic: self.heuristic.unwrap_or(d.heuristic),
            heuristic_level: self.heuristic_level.unwrap_or(d.heuristic_level),
            bidirectional: self.bidirectional.unwrap_or(d.bidirectional),
            policy: MovementPolicy {
                allow_diagonals: self.allow_diagonals.unwrap_or(d.policy.allow_diagonals),
                allow_corner_cut: self.allow_corner_cut.unwrap_or(d.policy.allow_corner_cut),
            },
        }
    }
}
