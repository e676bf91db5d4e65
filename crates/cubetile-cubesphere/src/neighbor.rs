//! Edge and vertex neighbors of cells, including across face boundaries.
//!
//! A neighbor that lands outside `[0, 2^30)` on its face is reprojected onto
//! the adjacent face through XYZ, so callers never need to know the cube's
//! face adjacency.

use crate::cell_id::assert_level;
use crate::coords::{K_MAX_SIZE, face_uv_to_xyz, st_to_ij, xyz_to_face_uv};
use crate::{CellId, Face};

const MAX_SIZE: i64 = K_MAX_SIZE as i64;

/// Slightly more than 1, so UV just past the face edge survives clamping.
const UV_LIMIT: f64 = 1.0 + f64::EPSILON;

impl CellId {
    /// Edge neighbors in `[down, right, up, left]` order, at this cell's level.
    #[must_use]
    pub fn neighbors(self) -> [CellId; 4] {
        let level = self.level();
        let (face, i, j, _) = self.to_ij(None);
        Self::neighbors_ij(face, i, j, level)
    }

    /// Edge neighbors at `level` of the leaf `(i, j)` on `face`, in
    /// `[down, right, up, left]` order.
    #[must_use]
    pub fn neighbors_ij(face: Face, i: u32, j: u32, level: u8) -> [CellId; 4] {
        let size = i64::from(Self::size_ij(level));
        let (i, j) = (i64::from(i), i64::from(j));
        let level = Some(level);
        [
            Self::from_ij_same(face, i, j - size, j - size >= 0).parent(level),
            Self::from_ij_same(face, i + size, j, i + size < MAX_SIZE).parent(level),
            Self::from_ij_same(face, i, j + size, j + size < MAX_SIZE).parent(level),
            Self::from_ij_same(face, i - size, j, i - size >= 0).parent(level),
        ]
    }

    /// Leaf at `(i, j)`, taken directly when `same_face` is set and
    /// reprojected with [`CellId::from_ij_wrap`] otherwise.
    #[must_use]
    pub fn from_ij_same(face: Face, i: i64, j: i64, same_face: bool) -> CellId {
        if same_face {
            Self::from_ij(face, i as u32, j as u32, None)
        } else {
            Self::from_ij_wrap(face, i, j)
        }
    }

    /// Leaf at leaf coordinates that may lie up to one leaf past the face
    /// edge, reprojected onto whichever face actually contains them.
    #[must_use]
    pub fn from_ij_wrap(face: Face, i: i64, j: i64) -> CellId {
        // Keep the point a single leaf beyond the edge so the projection
        // below cannot overflow or land two faces away.
        let i = i.clamp(-1, MAX_SIZE);
        let j = j.clamp(-1, MAX_SIZE);

        let scale = 1.0 / MAX_SIZE as f64;
        let u = (scale * (2 * (i - MAX_SIZE / 2) + 1) as f64).clamp(-UV_LIMIT, UV_LIMIT);
        let v = (scale * (2 * (j - MAX_SIZE / 2) + 1) as f64).clamp(-UV_LIMIT, UV_LIMIT);

        let (n_face, n_u, n_v) = xyz_to_face_uv(face_uv_to_xyz(face, u, v));
        Self::from_ij(
            n_face,
            st_to_ij(0.5 * (n_u + 1.0)),
            st_to_ij(0.5 * (n_v + 1.0)),
            None,
        )
    }

    /// The cells at `level` (defaults to this cell's) that share the vertex
    /// nearest to this cell's center: three at a cube corner, four elsewhere.
    /// The first entry is always this cell's own ancestor at `level`.
    #[must_use]
    pub fn vertex_neighbors(self, level: Option<u8>) -> Vec<CellId> {
        let level = level.unwrap_or_else(|| self.level());
        assert_level(level);
        assert!(level < 30, "leaf cells have no finer quadrant to pick a vertex from");
        let (face, i, j, _) = self.to_ij(None);

        let half = i64::from(Self::size_ij(level + 1));
        let size = half << 1;
        let (i, j) = (i64::from(i), i64::from(j));

        let (i_offset, i_same) = if i & half != 0 {
            (size, i + size < MAX_SIZE)
        } else {
            (-size, i - size >= 0)
        };
        let (j_offset, j_same) = if j & half != 0 {
            (size, j + size < MAX_SIZE)
        } else {
            (-size, j - size >= 0)
        };

        let level = Some(level);
        let mut neighbors = vec![
            self.parent(level),
            Self::from_ij_same(face, i + i_offset, j, i_same).parent(level),
            Self::from_ij_same(face, i, j + j_offset, j_same).parent(level),
        ];
        if i_same || j_same {
            neighbors.push(
                Self::from_ij_same(face, i + i_offset, j + j_offset, i_same && j_same)
                    .parent(level),
            );
        }
        neighbors
    }
}

/// Face grid coordinates of the four edge neighbors of `(i, j)` at `level`,
/// in `[down, right, up, left]` order.
#[must_use]
pub fn face_ij_neighbors(face: Face, i: u32, j: u32, level: u8) -> [(Face, u32, u32); 4] {
    let shift = 30 - u32::from(level);
    let size = 1i64 << shift;
    let (i, j) = (i64::from(i) << shift, i64::from(j) << shift);
    let wrap = |i: i64, j: i64, same_face: bool| {
        let id = CellId::from_ij_same(face, i, j, same_face);
        let (f, i, j, _) = id.to_ij(None);
        (f, i >> shift, j >> shift)
    };
    [
        wrap(i, j - size, j - size >= 0),
        wrap(i + size, j, i + size < MAX_SIZE),
        wrap(i, j + size, j + size < MAX_SIZE),
        wrap(i - size, j, i - size >= 0),
    ]
}
