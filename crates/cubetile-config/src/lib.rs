//! Configuration for the cube-sphere tiler.
//!
//! Settings persist to disk as RON. Every section falls back to its defaults
//! when missing, so older or partial files keep loading.

mod config;
mod error;

pub use config::{CONFIG_FILE, Config, DebugConfig, MAX_ZOOM_LIMIT, TilingConfig};
pub use error::ConfigError;
