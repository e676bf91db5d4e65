//! On-demand tiling of vector features over the cube sphere.
//!
//! A [`TileBuilder`] converts its input once, indexes it into the six face
//! root tiles and splits those down to the index zoom. Each
//! [`get_tile`](TileBuilder::get_tile) request then splits only below the
//! deepest cached tile on the branch leading to the requested cell.

mod builder;
mod error;
mod split;
mod tile;

pub use builder::TileBuilder;
pub use error::TileError;
pub use split::{TileChild, split_tile};
pub use tile::{DEFAULT_LAYER, Layer, Tile};
