use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use cluster_pathfinder::cluster::config::{Config, HeuristicKind};
use cluster_pathfinder::cluster::logging;
use cluster_pathfinder::commands;
use cluster_pathfinder::grid::MovementClass;
use cluster_pathfinder::util::parse_cell;

#[derive(Parser, Debug)]
#[command(name = "cluster_pathfinder", version, about = "Hierarchical grid path-finding tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Map file: JSON {"rows": [...]} or ASCII rows
    #[arg(long)]
    map: PathBuf,
    /// JSON config file; command-line flags and HPA_* variables override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    cluster_size: Option<i32>,
    #[arg(long)]
    levels: Option<usize>,
    #[arg(long)]
    max_entrance_width: Option<usize>,
    #[arg(long)]
    pool_capacity: Option<usize>,
    /// diagonal or hierarchical
    #[arg(long)]
    heuristic: Option<HeuristicKind>,
    #[arg(long)]
    heuristic_level: Option<usize>,
    #[arg(long)]
    bidirectional: Option<bool>,
    #[arg(long)]
    allow_diagonals: Option<bool>,
    #[arg(long)]
    allow_corner_cut: Option<bool>,
    /// Worker threads for intra-edge construction (default: all cores)
    #[arg(long)]
    threads: Option<usize>,
    #[arg(long)]
    log_level: Option<String>,
}

impl CommonArgs {
    fn to_config(&self) -> Config {
        Config {
            cluster_size: self.cluster_size,
            levels: self.levels,
            max_entrance_width: self.max_entrance_width,
            pool_capacity: self.pool_capacity,
            heuristic: self.heuristic,
            heuristic_level: self.heuristic_level,
            bidirectional: self.bidirectional,
            allow_diagonals: self.allow_diagonals,
            allow_corner_cut: self.allow_corner_cut,
            threads: self.threads,
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build clusters for every movement class and print per-level statistics
    Build {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Find a path between two cells
    Path {
        #[command(flatten)]
        common: CommonArgs,
        /// Source cell as x,y
        #[arg(long)]
        from: String,
        /// Target cell as x,y
        #[arg(long)]
        to: String,
        /// foot, wheeled, naval or a numeric class id
        #[arg(long, default_value = "foot")]
        class: String,
        /// Also report how many cells a plain A* considered
        #[arg(long)]
        trace: bool,
    },

    /// Print clusters, components, entrances and edges as JSON
    Dump {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long, default_value = "foot")]
        class: String,
        /// Only this level
        #[arg(long)]
        level: Option<usize>,
    },

    /// Apply an occupancy events file (lines: x,y,entered|left) and print update statistics
    Update {
        #[command(flatten)]
        common: CommonArgs,
        #[arg(long)]
        events: PathBuf,
    },
}

fn setup(common: &CommonArgs) -> Result<Config> {
    let config = commands::resolve_config(common.config.as_deref(), common.to_config())?;
    logging::init(config.log_level.as_deref());
    if let Some(threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configure rayon thread pool")?;
    }
    Ok(config)
}

fn parse_class(name: &str) -> Result<MovementClass> {
    MovementClass::from_name(name).with_context(|| format!("unknown movement class '{}'", name))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let out = match cli.command {
        Commands::Build { common } => {
            let config = setup(&common)?;
            commands::build::cmd_build(&common.map, &config.settings())?
        }
        Commands::Path { common, from, to, class, trace } => {
            let config = setup(&common)?;
            let from = parse_cell(&from).with_context(|| format!("invalid --from '{}', expected x,y", from))?;
            let to = parse_cell(&to).with_context(|| format!("invalid --to '{}', expected x,y", to))?;
            commands::find_path::cmd_path(&common.map, &config.settings(), from, to, parse_class(&class)?, trace)?
        }
        Commands::Dump { common, class, level } => {
            let config = setup(&common)?;
            commands::dump::cmd_dump(&common.map, &config.settings(), parse_class(&class)?, level)?
        }
        Commands::Update { common, events } => {
            let config = setup(&common)?;
            commands::update::cmd_update(&common.map, &events, &config.settings())?
        }
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
