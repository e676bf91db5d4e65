//! Conversions between the per-face coordinate systems.
//!
//! - **IJ**: integer leaf grid, `[0, 2^30)` on each axis.
//! - **ST**: the IJ grid normalized to `[0, 1]`.
//! - **UV**: ST warped into `[-1, 1]` so cells keep a near-uniform area once
//!   projected onto the sphere.
//! - **XYZ**: a point on (or off) the unit sphere.
//!
//! Everything here is total over its domain and allocation free.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use glam::DVec3;

use crate::Face;

/// Number of leaf cells along one axis of a face (`2^30`).
pub const K_MAX_SIZE: u32 = 1 << 30;

/// Deepest subdivision level.
pub const MAX_LEVEL: u8 = 30;

// ---------------------------------------------------------------------------
// ST <-> UV
// ---------------------------------------------------------------------------

/// Linear ST→UV: no area correction.
#[inline]
#[must_use]
pub fn linear_st_to_uv(s: f64) -> f64 {
    2.0 * s - 1.0
}

/// Inverse of [`linear_st_to_uv`].
#[inline]
#[must_use]
pub fn linear_uv_to_st(u: f64) -> f64 {
    0.5 * (u + 1.0)
}

/// Tangent ST→UV: most uniform cell areas, slowest to evaluate.
#[inline]
#[must_use]
pub fn tan_st_to_uv(s: f64) -> f64 {
    (FRAC_PI_2 * s - FRAC_PI_4).tan()
}

/// Inverse of [`tan_st_to_uv`].
#[inline]
#[must_use]
pub fn tan_uv_to_st(u: f64) -> f64 {
    (2.0 / std::f64::consts::PI) * (u.atan() + FRAC_PI_4)
}

/// Quadratic ST→UV, the projection used throughout the engine.
///
/// Piecewise quadratic and symmetric about `s = 0.5`; maps 0, 0.5 and 1
/// exactly onto -1, 0 and 1.
#[inline]
#[must_use]
pub fn quadratic_st_to_uv(s: f64) -> f64 {
    if s >= 0.5 {
        (1.0 / 3.0) * (4.0 * s * s - 1.0)
    } else {
        (1.0 / 3.0) * (1.0 - 4.0 * (1.0 - s) * (1.0 - s))
    }
}

/// Inverse of [`quadratic_st_to_uv`].
#[inline]
#[must_use]
pub fn quadratic_uv_to_st(u: f64) -> f64 {
    if u >= 0.0 {
        0.5 * (1.0 + 3.0 * u).sqrt()
    } else {
        1.0 - 0.5 * (1.0 - 3.0 * u).sqrt()
    }
}

/// Default ST→UV projection (quadratic).
#[inline]
#[must_use]
pub fn st_to_uv(s: f64) -> f64 {
    quadratic_st_to_uv(s)
}

/// Default UV→ST projection (quadratic).
#[inline]
#[must_use]
pub fn uv_to_st(u: f64) -> f64 {
    quadratic_uv_to_st(u)
}

// ---------------------------------------------------------------------------
// ST <-> IJ
// ---------------------------------------------------------------------------

/// Leaf grid coordinate containing `s`, clamped to `[0, 2^30 - 1]`.
#[inline]
#[must_use]
pub fn st_to_ij(s: f64) -> u32 {
    let max = f64::from(K_MAX_SIZE);
    (max * s).floor().clamp(0.0, max - 1.0) as u32
}

/// Lower edge of leaf column `i` in ST space.
#[inline]
#[must_use]
pub fn ij_to_st(i: u32) -> f64 {
    f64::from(i) / f64::from(K_MAX_SIZE)
}

/// Converts a doubled leaf coordinate (`2i` or `2i + 1`) into ST.
#[inline]
#[must_use]
pub fn si_ti_to_st(si: u64) -> f64 {
    si as f64 / 2_147_483_648.0
}

// ---------------------------------------------------------------------------
// Face UV <-> XYZ
// ---------------------------------------------------------------------------

/// Point on the cube surface for `(u, v)` on `face` (not normalized).
#[must_use]
pub fn face_uv_to_xyz(face: Face, u: f64, v: f64) -> DVec3 {
    match face {
        Face::PosX => DVec3::new(1.0, u, v),
        Face::PosY => DVec3::new(-u, 1.0, v),
        Face::PosZ => DVec3::new(-u, -v, 1.0),
        Face::NegX => DVec3::new(-1.0, -v, -u),
        Face::NegY => DVec3::new(v, -1.0, -u),
        Face::NegZ => DVec3::new(v, u, -1.0),
    }
}

/// Projects `xyz` onto `face` and returns its `(u, v)`.
///
/// The result is only meaningful when `xyz` lies in the pyramid of `face`.
#[must_use]
pub fn face_xyz_to_uv(face: Face, xyz: DVec3) -> (f64, f64) {
    let DVec3 { x, y, z } = xyz;
    match face {
        Face::PosX => (y / x, z / x),
        Face::PosY => (-x / y, z / y),
        Face::PosZ => (-x / z, -y / z),
        Face::NegX => (z / x, y / x),
        Face::NegY => (z / y, -x / y),
        Face::NegZ => (-y / z, -x / z),
    }
}

/// Face whose axis dominates `xyz`.
#[must_use]
pub fn xyz_to_face(xyz: DVec3) -> Face {
    let abs = xyz.abs();
    let axis = if abs.x > abs.y {
        if abs.x > abs.z { 0 } else { 2 }
    } else if abs.y > abs.z {
        1
    } else {
        2
    };
    if xyz[axis] < 0.0 {
        Face::from_index(axis as u8 + 3)
    } else {
        Face::from_index(axis as u8)
    }
}

/// Face and `(u, v)` for `xyz`.
#[must_use]
pub fn xyz_to_face_uv(xyz: DVec3) -> (Face, f64, f64) {
    let face = xyz_to_face(xyz);
    let (u, v) = face_xyz_to_uv(face, xyz);
    (face, u, v)
}

// ---------------------------------------------------------------------------
// Lon/lat <-> XYZ
// ---------------------------------------------------------------------------

/// Unit-sphere point for a longitude/latitude in degrees.
#[must_use]
pub fn lonlat_to_xyz(lon: f64, lat: f64) -> DVec3 {
    let (lon, lat) = (lon.to_radians(), lat.to_radians());
    DVec3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

/// Longitude/latitude in degrees for `xyz`. Longitude is in `(-180, 180]`.
#[must_use]
pub fn xyz_to_lonlat(xyz: DVec3) -> (f64, f64) {
    let DVec3 { x, y, z } = xyz;
    let lon = y.atan2(x).to_degrees();
    let lat = z.atan2((x * x + y * y).sqrt()).to_degrees();
    (lon, lat)
}

// ---------------------------------------------------------------------------
// Tiles
// ---------------------------------------------------------------------------

/// Tile column/row containing the UV coordinate at `zoom`.
#[must_use]
pub fn tile_xy_from_uv_zoom(u: f64, v: f64, zoom: u8) -> (i64, i64) {
    tile_xy_from_st_zoom(uv_to_st(u), uv_to_st(v), zoom)
}

/// Tile column/row containing the ST coordinate at `zoom`.
#[must_use]
pub fn tile_xy_from_st_zoom(s: f64, t: f64, zoom: u8) -> (i64, i64) {
    let division = 1.0 / f64::from(1u32 << zoom);
    ((s / division).floor() as i64, (t / division).floor() as i64)
}

/// UV bounds `[left, bottom, right, top]` of tile `(x, y)` at `zoom`.
#[must_use]
pub fn bbox_uv(x: u32, y: u32, zoom: u8) -> [f64; 4] {
    let division = 2.0 / f64::from(1u32 << zoom);
    let (x, y) = (f64::from(x), f64::from(y));
    [
        division * x - 1.0,
        division * y - 1.0,
        division * (x + 1.0) - 1.0,
        division * (y + 1.0) - 1.0,
    ]
}

/// ST bounds `[left, bottom, right, top]` of tile `(x, y)` at `zoom`.
#[must_use]
pub fn bbox_st(x: u32, y: u32, zoom: u8) -> [f64; 4] {
    let division = 1.0 / f64::from(1u32 << zoom);
    let (x, y) = (f64::from(x), f64::from(y));
    [
        division * x,
        division * y,
        division * (x + 1.0),
        division * (y + 1.0),
    ]
}

// ---------------------------------------------------------------------------
// Edge normals
// ---------------------------------------------------------------------------

/// Right-handed normal (not unit length) of the edge running along +v at
/// the given `u` of `face`.
#[must_use]
pub fn u_norm(face: Face, u: f64) -> DVec3 {
    match face {
        Face::PosX => DVec3::new(u, -1.0, 0.0),
        Face::PosY => DVec3::new(1.0, u, 0.0),
        Face::PosZ => DVec3::new(1.0, 0.0, u),
        Face::NegX => DVec3::new(-u, 0.0, 1.0),
        Face::NegY => DVec3::new(0.0, -u, 1.0),
        Face::NegZ => DVec3::new(0.0, -1.0, -u),
    }
}

/// Right-handed normal (not unit length) of the edge running along +u at
/// the given `v` of `face`.
#[must_use]
pub fn v_norm(face: Face, v: f64) -> DVec3 {
    match face {
        Face::PosX => DVec3::new(-v, 0.0, 1.0),
        Face::PosY => DVec3::new(0.0, -v, 1.0),
        Face::PosZ => DVec3::new(0.0, -1.0, -v),
        Face::NegX => DVec3::new(v, -1.0, 0.0),
        Face::NegY => DVec3::new(1.0, v, 0.0),
        Face::NegZ => DVec3::new(1.0, 0.0, v),
    }
}
