//! Cube-sphere indexing: face coordinate systems, lon/lat utilities, and the
//! 64-bit Hilbert-curve [`CellId`] with its hierarchy and neighbor queries.

mod cell_id;
pub mod coords;
mod face;
mod hilbert;
mod lonlat;
mod neighbor;
mod point;

pub use cell_id::CellId;
pub use coords::{K_MAX_SIZE, MAX_LEVEL};
pub use face::{Face, InvalidFace};
pub use lonlat::LonLat;
pub use neighbor::face_ij_neighbors;
pub use point::{
    point_from_ij, point_from_lonlat, point_from_st, point_from_uv, point_normalize,
    point_to_ij, point_to_lonlat, point_to_st, point_to_uv,
};

// Re-exported so downstream crates share one vector type.
pub use glam::DVec3;
