use env_logger::{Builder, Env};
use log::LevelFilter;

/// Install the global logger.  `RUST_LOG` overrides the default level.
pub fn init(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let env = Env::default().default_filter_or(level.to_string());
    // Fails only if a logger is already installed.
    let _ = Builder::from_env(env).format_timestamp_millis().try_init();
}
