use serde::{Deserialize, Serialize};

/// Free-form feature properties.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Per-point measurement payload. Shares the properties shape so it can be
/// carried straight through GeoJSON `mValues`.
pub type MValue = Properties;

/// Which planar axis a clip or split operates on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

/// A point in whichever planar frame its geometry currently lives in
/// (lon/lat degrees, face ST, unit Web Mercator or tile-local).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "M: Deserialize<'de>"))]
pub struct VectorPoint<M = MValue> {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub m: Option<M>,
    /// Squared significance assigned by the simplifier. Endpoints get `1`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<f64>,
}

impl<M> VectorPoint<M> {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            z: None,
            m: None,
            t: None,
        }
    }

    #[must_use]
    pub fn with_z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    #[must_use]
    pub fn with_m(mut self, m: M) -> Self {
        self.m = Some(m);
        self
    }

    #[must_use]
    pub fn with_t(mut self, t: f64) -> Self {
        self.t = Some(t);
        self
    }

    /// Coordinate along `axis`.
    #[inline]
    #[must_use]
    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Planar Euclidean distance, ignoring `z`.
    #[must_use]
    pub fn distance(&self, other: &VectorPoint<M>) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// True when both planar coordinates are identical.
    #[inline]
    #[must_use]
    pub fn same_xy(&self, other: &VectorPoint<M>) -> bool {
        self.x == other.x && self.y == other.y
    }
}
