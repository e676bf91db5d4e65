//! 64-bit hierarchical cell identifiers on the cube-sphere.
//!
//! Layout, from the most significant bit down:
//!
//! ```text
//! fff pp pp .. pp 1 00 .. 00
//! ^^^ ^^^^^^^^^^^ ^ ^^^^^^^^
//! face  position  | 2 * (30 - level) zero bits
//!                 sentinel
//! ```
//!
//! Positions follow a Hilbert curve within each face, so ids that are close
//! numerically are usually close on the sphere, and every descendant of a
//! cell lies in a contiguous id range.

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::coords::{
    MAX_LEVEL, face_uv_to_xyz, ij_to_st, si_ti_to_st, st_to_ij, st_to_uv, u_norm,
    uv_to_st, v_norm, xyz_to_lonlat,
};
use crate::hilbert::{SWAP_MASK, tables};
use crate::point::{point_from_lonlat, point_from_uv, point_normalize, point_to_ij};
use crate::{Face, LonLat};

/// Number of bits below the face bits.
const POS_BITS: u32 = 61;

/// Mask of the position bits (everything except the face).
const POS_MASK: u64 = (1 << POS_BITS) - 1;

/// Subtracted from an id that runs past the last face.
const WRAP_OFFSET: u64 = 6 << POS_BITS;

/// Sentinel positions at which the final orientation must be swapped back.
const ODD_LEVEL_SENTINELS: u64 = 0x1111_1111_1111_1100;

/// A cell on the cube-sphere, encoded as a Hilbert-curve position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub u64);

impl CellId {
    // ---------------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------------

    /// The level-0 cell covering a whole face.
    #[must_use]
    pub const fn from_face(face: Face) -> Self {
        Self(((face as u64) << POS_BITS) + (1 << 60))
    }

    /// Cell at `level` containing the leaf at Hilbert position `pos` on `face`.
    #[must_use]
    pub fn from_face_pos_level(face: Face, pos: u64, level: u8) -> Self {
        Self((u64::from(face.index()) << POS_BITS) + (pos | 1)).parent(Some(level))
    }

    /// Leaf cell containing a longitude/latitude.
    #[must_use]
    pub fn from_lonlat(ll: LonLat) -> Self {
        Self::from_s2_point(point_from_lonlat(ll), None)
    }

    /// Cell containing a sphere point, at `level` or at leaf level.
    #[must_use]
    pub fn from_s2_point(p: DVec3, level: Option<u8>) -> Self {
        let (face, i, j) = point_to_ij(p, None);
        let id = Self::from_ij(face, i, j, None);
        match level {
            Some(level) => id.parent(Some(level)),
            None => id,
        }
    }

    /// Cell containing face UV coordinates.
    #[must_use]
    pub fn from_uv(face: Face, u: f64, v: f64, level: Option<u8>) -> Self {
        Self::from_st(face, uv_to_st(u), uv_to_st(v), level)
    }

    /// Cell containing face ST coordinates.
    #[must_use]
    pub fn from_st(face: Face, s: f64, t: f64, level: Option<u8>) -> Self {
        let id = Self::from_ij(face, st_to_ij(s), st_to_ij(t), None);
        match level {
            Some(level) => id.parent(Some(level)),
            None => id,
        }
    }

    /// Inverse of [`CellId::distance`].
    #[must_use]
    pub fn from_distance(distance: u64, level: u8) -> Self {
        assert_level(level);
        let shift = 2 * u32::from(MAX_LEVEL - level);
        Self((distance << (shift + 1)) + (1 << shift))
    }

    /// Encodes face grid coordinates.
    ///
    /// Without `level`, `(i, j)` are leaf coordinates in `[0, 2^30)` and a
    /// leaf cell is returned. With `level`, they are grid coordinates at that
    /// level and the cell at that level is returned.
    #[must_use]
    pub fn from_ij(face: Face, i: u32, j: u32, level: Option<u8>) -> Self {
        let (mut i, mut j) = (u64::from(i), u64::from(j));
        if let Some(level) = level {
            assert_level(level);
            i <<= MAX_LEVEL - level;
            j <<= MAX_LEVEL - level;
        }
        let lookup = &tables().pos;
        let mut n = u64::from(face.index()) << (POS_BITS - 1);
        let mut bits = u64::from(face.orientation_parity());
        for k in (0..8).rev() {
            let shift = k * 4;
            bits += ((i >> shift) & 15) << 6;
            bits += ((j >> shift) & 15) << 2;
            bits = u64::from(lookup[bits as usize]);
            n |= (bits >> 2) << (k * 8);
            bits &= 3;
        }
        let id = Self(n * 2 + 1);
        match level {
            Some(level) => id.parent(Some(level)),
            None => id,
        }
    }

    // ---------------------------------------------------------------------
    // Decoding
    // ---------------------------------------------------------------------

    /// Face, level and grid coordinates at the cell's own level.
    #[must_use]
    pub fn to_face_ij(self) -> (Face, u8, u32, u32) {
        let level = self.level();
        let (face, i, j, _) = self.to_ij(Some(level));
        (face, level, i, j)
    }

    /// Face, grid coordinates and Hilbert orientation.
    ///
    /// Without `level` the coordinates are those of the leaf at the cell's
    /// center; with `level` they are shifted down to that level's grid.
    #[must_use]
    pub fn to_ij(self, level: Option<u8>) -> (Face, u32, u32, u8) {
        let id = self.0;
        let lookup = &tables().ij;
        let face = self.face();
        let (mut i, mut j) = (0u64, 0u64);
        let mut bits = u64::from(face.orientation_parity());
        for k in (0..8).rev() {
            let nbits: u64 = if k == 7 { 2 } else { 4 };
            bits += ((id >> (k * 8 + 1)) & ((1 << (2 * nbits)) - 1)) << 2;
            bits = u64::from(lookup[bits as usize]);
            i += (bits >> 6) << (k * 4);
            j += ((bits >> 2) & 15) << (k * 4);
            bits &= 3;
        }
        if self.lsb() & ODD_LEVEL_SENTINELS != 0 {
            bits ^= SWAP_MASK;
        }
        if let Some(level) = level {
            assert_level(level);
            i >>= MAX_LEVEL - level;
            j >>= MAX_LEVEL - level;
        }
        (face, i as u32, j as u32, bits as u8)
    }

    /// Face and ST coordinates of the cell's center leaf.
    #[must_use]
    pub fn to_st(self) -> (Face, f64, f64) {
        let (face, i, j, _) = self.to_ij(None);
        (face, ij_to_st(i), ij_to_st(j))
    }

    /// Face and UV coordinates of the cell's center leaf.
    #[must_use]
    pub fn to_uv(self) -> (Face, f64, f64) {
        let (face, s, t) = self.to_st();
        (face, st_to_uv(s), st_to_uv(t))
    }

    #[must_use]
    pub fn to_lonlat(self) -> LonLat {
        let (lon, lat) = xyz_to_lonlat(self.to_s2_point());
        LonLat::new(lon, lat)
    }

    /// Unit-sphere point at the cell's center leaf.
    #[must_use]
    pub fn to_s2_point(self) -> DVec3 {
        let (face, u, v) = self.to_uv();
        point_from_uv(face, u, v)
    }

    // ---------------------------------------------------------------------
    // Properties
    // ---------------------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn face(self) -> Face {
        Face::from_index((self.0 >> POS_BITS) as u8)
    }

    /// `true` for the level-0 cell of a face.
    #[inline]
    #[must_use]
    pub fn is_face(self) -> bool {
        self.0 & ((1 << 60) - 1) == 0
    }

    /// Position bits (the id without its face).
    #[inline]
    #[must_use]
    pub fn pos(self) -> u64 {
        self.0 & POS_MASK
    }

    /// Subdivision level: 0 for a face, 30 for a leaf.
    #[inline]
    #[must_use]
    pub fn level(self) -> u8 {
        let zeros = self.0.trailing_zeros().min(60);
        MAX_LEVEL - (zeros / 2) as u8
    }

    /// Lowest set bit (the sentinel).
    #[inline]
    #[must_use]
    pub fn lsb(self) -> u64 {
        self.0 & self.0.wrapping_neg()
    }

    #[inline]
    #[must_use]
    pub fn is_leaf(self) -> bool {
        self.0 & 1 == 1
    }

    /// Index of the cell along the curve at `level` (defaults to its own).
    #[must_use]
    pub fn distance(self, level: Option<u8>) -> u64 {
        let level = level.unwrap_or_else(|| self.level());
        assert_level(level);
        self.0 >> (2 * u32::from(MAX_LEVEL - level) + 1)
    }

    // ---------------------------------------------------------------------
    // Hierarchy
    // ---------------------------------------------------------------------

    /// Child at curve position `pos` (0..=3).
    #[must_use]
    pub fn child(self, pos: u8) -> Self {
        assert!(pos < 4, "child position {pos} out of range 0..=3");
        let new_lsb = (self.lsb() >> 2) as i64;
        Self(self.0.wrapping_add_signed((2 * i64::from(pos) - 3) * new_lsb))
    }

    /// The four children. Orientation 0 yields curve order; any other
    /// orientation swaps the second and fourth entries.
    #[must_use]
    pub fn children(self, orientation: u8) -> [Self; 4] {
        let mut children = [self.child(0), self.child(3), self.child(2), self.child(1)];
        if orientation == 0 {
            children.swap(1, 3);
        }
        children
    }

    /// Children of the cell at `(face, level, i, j)` in bottom-left,
    /// bottom-right, top-left, top-right order.
    #[must_use]
    pub fn children_ij(face: Face, level: u8, i: u32, j: u32) -> [Self; 4] {
        let (i, j) = (i << 1, j << 1);
        let level = Some(level + 1);
        [
            Self::from_ij(face, i, j, level),
            Self::from_ij(face, i + 1, j, level),
            Self::from_ij(face, i, j + 1, level),
            Self::from_ij(face, i + 1, j + 1, level),
        ]
    }

    /// Which child (0..=3) of its level-`level - 1` ancestor the level-`level`
    /// ancestor of this cell is.
    #[must_use]
    pub fn child_position(self, level: u8) -> u8 {
        assert_level(level);
        ((self.0 >> (2 * u32::from(MAX_LEVEL - level) + 1)) & 3) as u8
    }

    /// Ancestor at `level`, or the immediate parent without one.
    #[must_use]
    pub fn parent(self, level: Option<u8>) -> Self {
        let new_lsb = match level {
            Some(level) => {
                assert_level(level);
                1u64 << (2 * u32::from(MAX_LEVEL - level))
            }
            None => self.lsb() << 2,
        };
        Self((self.0 & new_lsb.wrapping_neg()) | new_lsb)
    }

    /// Inclusive range of leaf ids under this cell.
    #[must_use]
    pub fn range(self) -> (CellId, CellId) {
        let span = self.lsb().wrapping_sub(1);
        (
            Self(self.0.wrapping_sub(span)),
            Self(self.0.wrapping_add(span)),
        )
    }

    /// `true` if `other` is this cell or one of its descendants.
    #[must_use]
    pub fn contains(self, other: CellId) -> bool {
        let (min, max) = self.range();
        other >= min && other <= max
    }

    #[must_use]
    pub fn contains_point(self, p: DVec3) -> bool {
        self.contains(Self::from_s2_point(p, None))
    }

    /// `true` if the two leaf ranges overlap.
    #[must_use]
    pub fn intersects(self, other: CellId) -> bool {
        let (a_min, a_max) = self.range();
        let (b_min, b_max) = other.range();
        b_min <= a_max && b_max >= a_min
    }

    /// Next cell along the curve at the same level, wrapping after face 5.
    #[must_use]
    pub fn next(self) -> Self {
        let n = self.0.wrapping_add(self.lsb() << 1);
        if n < WRAP_OFFSET {
            Self(n)
        } else {
            Self(n.wrapping_sub(WRAP_OFFSET))
        }
    }

    /// Previous cell along the curve at the same level, wrapping before face 0.
    #[must_use]
    pub fn prev(self) -> Self {
        let p = self.0.wrapping_sub(self.lsb() << 1);
        if p < WRAP_OFFSET {
            Self(p)
        } else {
            Self(p.wrapping_add(WRAP_OFFSET))
        }
    }

    // ---------------------------------------------------------------------
    // Geometry
    // ---------------------------------------------------------------------

    /// Face and ST coordinates of the cell center.
    #[must_use]
    pub fn center_st(self) -> (Face, f64, f64) {
        let (face, i, j, _) = self.to_ij(None);
        let delta: u64 = if self.is_leaf() {
            1
        } else if (u64::from(i) ^ (self.0 >> 2)) & 1 != 0 {
            2
        } else {
            0
        };
        let si = 2 * u64::from(i) + delta;
        let ti = 2 * u64::from(j) + delta;
        (face, si_ti_to_st(si), si_ti_to_st(ti))
    }

    /// ST bounds `[left, bottom, right, top]` of a `level`-sized cell
    /// around this cell's center.
    #[must_use]
    pub fn bounds_st(self, level: Option<u8>) -> [f64; 4] {
        let level = level.unwrap_or_else(|| self.level());
        let (_, s, t) = self.center_st();
        let half = Self::size_st(level) * 0.5;
        [s - half, t - half, s + half, t + half]
    }

    /// Edge length in ST of a cell at `level`.
    #[must_use]
    pub fn size_st(level: u8) -> f64 {
        ij_to_st(Self::size_ij(level))
    }

    /// Edge length in leaf cells of a cell at `level`.
    #[must_use]
    pub fn size_ij(level: u8) -> u32 {
        assert_level(level);
        1 << (MAX_LEVEL - level)
    }

    /// UV bounds `[u_low, u_high, v_low, v_high]`.
    #[must_use]
    pub fn bound_uv(self) -> [f64; 4] {
        let (_, i, j, _) = self.to_ij(None);
        let size = Self::size_ij(self.level());
        let i_low = i & !(size - 1);
        let j_low = j & !(size - 1);
        [i_low, i_low + size, j_low, j_low + size].map(|n| st_to_uv(ij_to_st(n)))
    }

    /// Corners on the unit sphere, counter-clockwise in UV from lower left.
    #[must_use]
    pub fn vertices(self) -> [DVec3; 4] {
        self.vertices_raw().map(point_normalize)
    }

    /// Corners on the cube surface (not normalized).
    #[must_use]
    pub fn vertices_raw(self) -> [DVec3; 4] {
        let face = self.face();
        let [u_low, u_high, v_low, v_high] = self.bound_uv();
        [
            face_uv_to_xyz(face, u_low, v_low),
            face_uv_to_xyz(face, u_high, v_low),
            face_uv_to_xyz(face, u_high, v_high),
            face_uv_to_xyz(face, u_low, v_high),
        ]
    }

    /// Unit inward normals of the great circles through each edge, edge `k`
    /// running from vertex `k` to vertex `k + 1`.
    #[must_use]
    pub fn edges(self) -> [DVec3; 4] {
        self.edges_raw().map(point_normalize)
    }

    /// Like [`CellId::edges`] without normalization.
    #[must_use]
    pub fn edges_raw(self) -> [DVec3; 4] {
        let face = self.face();
        let [u_low, u_high, v_low, v_high] = self.bound_uv();
        [
            v_norm(face, v_low),
            u_norm(face, u_high),
            -v_norm(face, v_high),
            -u_norm(face, u_low),
        ]
    }
}

impl From<u64> for CellId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<CellId> for u64 {
    fn from(id: CellId) -> Self {
        id.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (face, level, i, j) = self.to_face_ij();
        write!(f, "{}({face}/{level}/{i}/{j})", self.0)
    }
}

#[inline]
pub(crate) fn assert_level(level: u8) {
    assert!(level <= MAX_LEVEL, "level {level} exceeds {MAX_LEVEL}");
}
