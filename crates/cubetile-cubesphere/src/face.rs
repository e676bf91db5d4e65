//! The six faces of the cube-sphere and their basis vectors.

use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Returned when an integer does not name one of the six faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid cube face index {0} (expected 0..=5)")]
pub struct InvalidFace(pub u8);

/// The six faces of the cube that is projected onto the sphere.
///
/// Discriminants match the face bits stored in the top of a
/// [`CellId`](crate::CellId): the three positive axes come first, then the
/// negative ones, so `face + 3` is always the opposite face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Face {
    /// +X face
    PosX = 0,
    /// +Y face
    PosY = 1,
    /// +Z face (north pole)
    PosZ = 2,
    /// −X face
    NegX = 3,
    /// −Y face
    NegY = 4,
    /// −Z face (south pole)
    NegZ = 5,
}

impl Face {
    /// All six faces in Hilbert-curve order.
    pub const ALL: [Face; 6] = [
        Face::PosX,
        Face::PosY,
        Face::PosZ,
        Face::NegX,
        Face::NegY,
        Face::NegZ,
    ];

    /// Face from its index.
    ///
    /// # Panics
    ///
    /// Panics if `index > 5`.
    #[must_use]
    pub fn from_index(index: u8) -> Face {
        match Face::try_from(index) {
            Ok(face) => face,
            Err(err) => panic!("{err}"),
        }
    }

    /// Index 0..=5 of this face.
    #[inline]
    #[must_use]
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Odd faces walk the Hilbert curve with swapped axes.
    #[inline]
    #[must_use]
    pub fn orientation_parity(self) -> u8 {
        self.index() & 1
    }

    /// The opposite face (e.g., `PosX` → `NegX`).
    #[must_use]
    pub fn opposite(self) -> Face {
        Face::from_index((self.index() + 3) % 6)
    }

    /// Outward-pointing unit normal for this face.
    #[must_use]
    pub fn normal(self) -> DVec3 {
        match self {
            Face::PosX => DVec3::X,
            Face::PosY => DVec3::Y,
            Face::PosZ => DVec3::Z,
            Face::NegX => DVec3::NEG_X,
            Face::NegY => DVec3::NEG_Y,
            Face::NegZ => DVec3::NEG_Z,
        }
    }

    /// Tangent vector: direction of increasing `u` on this face.
    #[must_use]
    pub fn tangent(self) -> DVec3 {
        match self {
            Face::PosX => DVec3::Y,
            Face::PosY => DVec3::NEG_X,
            Face::PosZ => DVec3::NEG_X,
            Face::NegX => DVec3::NEG_Z,
            Face::NegY => DVec3::NEG_Z,
            Face::NegZ => DVec3::Y,
        }
    }

    /// Bitangent vector: direction of increasing `v` on this face.
    #[must_use]
    pub fn bitangent(self) -> DVec3 {
        match self {
            Face::PosX => DVec3::Z,
            Face::PosY => DVec3::Z,
            Face::PosZ => DVec3::NEG_Y,
            Face::NegX => DVec3::NEG_Y,
            Face::NegY => DVec3::X,
            Face::NegZ => DVec3::X,
        }
    }
}

impl TryFrom<u8> for Face {
    type Error = InvalidFace;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Face::PosX),
            1 => Ok(Face::PosY),
            2 => Ok(Face::PosZ),
            3 => Ok(Face::NegX),
            4 => Ok(Face::NegY),
            5 => Ok(Face::NegZ),
            other => Err(InvalidFace(other)),
        }
    }
}

impl From<Face> for u8 {
    fn from(face: Face) -> u8 {
        face.index()
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}
