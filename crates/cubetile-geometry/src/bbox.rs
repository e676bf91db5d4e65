//! Axis-aligned bounding boxes with an optional elevation range.

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::point::{Axis, VectorPoint};
use crate::vector::VectorGeometry;

/// `[left, bottom, right, top]` plus an optional `[low, high]` z range.
///
/// Serialises as a flat array of four or six numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<f64>", try_from = "Vec<f64>")]
pub struct BBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
    pub z: Option<(f64, f64)>,
}

impl BBox {
    #[must_use]
    pub const fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
            z: None,
        }
    }

    #[must_use]
    pub const fn with_z(mut self, low: f64, high: f64) -> Self {
        self.z = Some((low, high));
        self
    }

    /// Degenerate box around a single point.
    #[must_use]
    pub fn from_point<M>(p: &VectorPoint<M>) -> Self {
        Self {
            left: p.x,
            bottom: p.y,
            right: p.x,
            top: p.y,
            z: p.z.map(|z| (z, z)),
        }
    }

    /// Smallest box covering every point, or `None` for an empty iterator.
    pub fn from_points<'a, M: 'a>(
        points: impl IntoIterator<Item = &'a VectorPoint<M>>,
    ) -> Option<Self> {
        points.into_iter().fold(None, |acc, p| Some(extend_bbox(acc, p)))
    }

    /// Smallest box covering every vertex of `geometry`.
    #[must_use]
    pub fn from_geometry<M>(geometry: &VectorGeometry<M>) -> Option<Self> {
        let mut bbox = None;
        geometry.for_each_point(|p| bbox = Some(extend_bbox(bbox, p)));
        bbox
    }

    /// Grows this box to cover `p`.
    pub fn extend<M>(&mut self, p: &VectorPoint<M>) {
        *self = self.merge(&Self::from_point(p));
    }

    /// Union of two boxes. The z range is kept if either side has one,
    /// with a missing range treated as `[0, 0]`.
    #[must_use]
    pub fn merge(&self, other: &BBox) -> BBox {
        let z = match (self.z, other.z) {
            (None, None) => None,
            (a, b) => {
                let (a_lo, a_hi) = a.unwrap_or((0.0, 0.0));
                let (b_lo, b_hi) = b.unwrap_or((0.0, 0.0));
                Some((a_lo.min(b_lo), a_hi.max(b_hi)))
            }
        };
        BBox {
            left: self.left.min(other.left),
            bottom: self.bottom.min(other.bottom),
            right: self.right.max(other.right),
            top: self.top.max(other.top),
            z,
        }
    }

    /// Clamps the box to `[k1, k2]` along `axis`.
    #[must_use]
    pub fn clip(&self, axis: Axis, k1: f64, k2: f64) -> BBox {
        let mut out = *self;
        match axis {
            Axis::X => {
                out.left = self.left.max(k1);
                out.right = self.right.min(k2);
            }
            Axis::Y => {
                out.bottom = self.bottom.max(k1);
                out.top = self.top.min(k2);
            }
        }
        out
    }

    /// Intersection of the planar extents, or `None` when disjoint.
    #[must_use]
    pub fn overlap(&self, other: &BBox) -> Option<BBox> {
        if self.left > other.right
            || self.right < other.left
            || self.bottom > other.top
            || self.top < other.bottom
        {
            return None;
        }
        Some(BBox::new(
            self.left.max(other.left),
            self.bottom.max(other.bottom),
            self.right.min(other.right),
            self.top.min(other.top),
        ))
    }

    /// Inclusive point-in-box test on the planar extent.
    #[must_use]
    pub fn contains_point<M>(&self, p: &VectorPoint<M>) -> bool {
        p.x >= self.left && p.x <= self.right && p.y >= self.bottom && p.y <= self.top
    }
}

/// Extends an optional box by a point, starting a new one when absent.
pub fn extend_bbox<M>(bbox: Option<BBox>, p: &VectorPoint<M>) -> BBox {
    match bbox {
        Some(mut bbox) => {
            bbox.extend(p);
            bbox
        }
        None => BBox::from_point(p),
    }
}

impl From<BBox> for Vec<f64> {
    fn from(b: BBox) -> Self {
        match b.z {
            Some((lo, hi)) => vec![b.left, b.bottom, b.right, b.top, lo, hi],
            None => vec![b.left, b.bottom, b.right, b.top],
        }
    }
}

impl TryFrom<Vec<f64>> for BBox {
    type Error = GeometryError;

    fn try_from(v: Vec<f64>) -> Result<Self, Self::Error> {
        match v[..] {
            [left, bottom, right, top] => Ok(BBox::new(left, bottom, right, top)),
            [left, bottom, right, top, lo, hi] => {
                Ok(BBox::new(left, bottom, right, top).with_z(lo, hi))
            }
            _ => Err(GeometryError::BBoxLength(v.len())),
        }
    }
}
