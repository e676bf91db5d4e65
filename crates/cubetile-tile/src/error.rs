//! Tile builder error types.

use cubetile_config::ConfigError;
use cubetile_geometry::GeometryError;

/// Errors raised while setting up a [`TileBuilder`](crate::TileBuilder).
/// Requests for tiles never fail; a missing tile is `None`.
#[derive(Debug, thiserror::Error)]
pub enum TileError {
    /// The tiling options were rejected.
    #[error("invalid tiling options: {0}")]
    Config(#[from] ConfigError),

    /// The input features could not be read or converted.
    #[error("invalid input: {0}")]
    Geometry(#[from] GeometryError),
}
