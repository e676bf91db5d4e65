//! Sphere points (`DVec3`) to and from the per-face systems.

use glam::DVec3;

use crate::coords::{
    face_uv_to_xyz, ij_to_st, lonlat_to_xyz, st_to_ij, st_to_uv, uv_to_st, xyz_to_face_uv,
    xyz_to_lonlat,
};
use crate::{Face, LonLat};

/// Unit-sphere point for a longitude/latitude.
#[must_use]
pub fn point_from_lonlat(ll: LonLat) -> DVec3 {
    lonlat_to_xyz(ll.lon, ll.lat)
}

/// Longitude/latitude of a sphere point.
#[must_use]
pub fn point_to_lonlat(p: DVec3) -> LonLat {
    let (lon, lat) = xyz_to_lonlat(p);
    LonLat::new(lon, lat)
}

/// Unit-sphere point for face UV coordinates.
#[must_use]
pub fn point_from_uv(face: Face, u: f64, v: f64) -> DVec3 {
    point_normalize(face_uv_to_xyz(face, u, v))
}

/// Unit-sphere point for face ST coordinates.
#[must_use]
pub fn point_from_st(face: Face, s: f64, t: f64) -> DVec3 {
    point_from_uv(face, st_to_uv(s), st_to_uv(t))
}

/// Unit-sphere point at the low corner of leaf `(i, j)`.
#[must_use]
pub fn point_from_ij(face: Face, i: u32, j: u32) -> DVec3 {
    point_from_st(face, ij_to_st(i), ij_to_st(j))
}

/// Face and UV coordinates of a sphere point.
#[must_use]
pub fn point_to_uv(p: DVec3) -> (Face, f64, f64) {
    xyz_to_face_uv(p)
}

/// Face and ST coordinates of a sphere point.
#[must_use]
pub fn point_to_st(p: DVec3) -> (Face, f64, f64) {
    let (face, u, v) = point_to_uv(p);
    (face, uv_to_st(u), uv_to_st(v))
}

/// Face and leaf grid coordinates of a sphere point, optionally coarsened
/// to `level`.
#[must_use]
pub fn point_to_ij(p: DVec3, level: Option<u8>) -> (Face, u32, u32) {
    let (face, s, t) = point_to_st(p);
    let (mut i, mut j) = (st_to_ij(s), st_to_ij(t));
    if let Some(level) = level {
        assert!(level <= 30, "level {level} exceeds 30");
        i >>= 30 - level;
        j >>= 30 - level;
    }
    (face, i, j)
}

/// `p` scaled to unit length. A zero vector is returned unchanged.
#[must_use]
pub fn point_normalize(p: DVec3) -> DVec3 {
    let len = p.length();
    if len > 0.0 { p / len } else { p }
}
