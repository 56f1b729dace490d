use env_logger::{Builder, Env};

pub const DEFAULT_LEVEL: &str = "info";

/// Install the global logger once; `RUST_LOG` overrides `level`. Later calls are no-ops.
pub fn init(level: Option<&str>) {
    let default = level.unwrap_or(DEFAULT_LEVEL);
    let _ = Builder::from_env(Env::default().default_filter_or(default))
        .format_timestamp_millis()
        .try_init();
}
