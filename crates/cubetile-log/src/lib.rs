//! Structured logging for the cube-sphere tiler.
//!
//! The library crates only emit `tracing` events; this crate installs the
//! subscriber that prints them. Console output carries an uptime timer and
//! module paths, and debug builds can also write JSON lines to a file.

use cubetile_config::Config;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used in release builds when nothing else is configured.
pub const RELEASE_FILTER: &str = "info";

/// Filter used in debug builds: per-tile splitting becomes visible.
pub const DEBUG_FILTER: &str = "info,cubetile_tile=debug,cubetile_geometry=debug";

/// Name of the JSON log file written into `log_dir`.
pub const LOG_FILE: &str = "cubetile.log";

/// Initialize the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, else from
/// `config.debug.log_level`, else from [`default_filter`]. When
/// `debug_build` is true and `log_dir` can be created, events are also
/// written there as JSON.
///
/// ```no_run
/// use cubetile_config::Config;
/// use cubetile_log::init_logging;
///
/// let config = Config::default();
/// init_logging(None, false, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = match config {
        Some(config) if !config.debug.log_level.is_empty() => config.debug.log_level.clone(),
        _ => default_filter(debug_build).to_string(),
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true) // tile requests usually run on named workers
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// The filter string used when neither `RUST_LOG` nor the config sets one.
#[must_use]
pub fn default_filter(debug_build: bool) -> &'static str {
    if debug_build { DEBUG_FILTER } else { RELEASE_FILTER }
}

/// An `EnvFilter` built from [`default_filter`].
pub fn default_env_filter(debug_build: bool) -> EnvFilter {
    EnvFilter::new(default_filter(debug_build))
}
