//! Vector geometries: the planar, point-object form every stage of the
//! tiler works on.

use serde::{Deserialize, Serialize};

use crate::bbox::BBox;
use crate::point::{MValue, VectorPoint};

pub type VectorLineString<M = MValue> = Vec<VectorPoint<M>>;
pub type VectorMultiLineString<M = MValue> = Vec<VectorLineString<M>>;
pub type VectorPolygon<M = MValue> = Vec<VectorLineString<M>>;
pub type VectorMultiPolygon<M = MValue> = Vec<VectorPolygon<M>>;

/// One start offset per line (or ring).
pub type VectorMultiLineOffset = Vec<f64>;
/// One [`VectorMultiLineOffset`] per polygon.
pub type VectorMultiPolygonOffset = Vec<VectorMultiLineOffset>;

/// Fields shared by every geometry variant.
///
/// `offset` records the arc length at which each retained line starts, so a
/// dash pattern can continue across tile seams. Points use `O = ()`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorGeometryBody<C, O = ()> {
    #[serde(rename = "is3D", default)]
    pub is_3d: bool,
    pub coordinates: C,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<O>,
    /// Extent in lon/lat degrees, carried from the source geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
    /// Extent in the geometry's current planar frame.
    #[serde(rename = "vecBBox", default, skip_serializing_if = "Option::is_none")]
    pub vec_bbox: Option<BBox>,
}

impl<C, O> VectorGeometryBody<C, O> {
    #[must_use]
    pub fn new(coordinates: C) -> Self {
        Self {
            is_3d: false,
            coordinates,
            offset: None,
            bbox: None,
            vec_bbox: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VectorGeometry<M = MValue> {
    Point(VectorGeometryBody<VectorPoint<M>>),
    MultiPoint(VectorGeometryBody<Vec<VectorPoint<M>>>),
    LineString(VectorGeometryBody<VectorLineString<M>, f64>),
    MultiLineString(VectorGeometryBody<VectorMultiLineString<M>, VectorMultiLineOffset>),
    Polygon(VectorGeometryBody<VectorPolygon<M>, VectorMultiLineOffset>),
    MultiPolygon(VectorGeometryBody<VectorMultiPolygon<M>, VectorMultiPolygonOffset>),
}

impl<M> VectorGeometry<M> {
    /// Name of the variant, as written in the `type` field.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            VectorGeometry::Point(_) => "Point",
            VectorGeometry::MultiPoint(_) => "MultiPoint",
            VectorGeometry::LineString(_) => "LineString",
            VectorGeometry::MultiLineString(_) => "MultiLineString",
            VectorGeometry::Polygon(_) => "Polygon",
            VectorGeometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    #[must_use]
    pub fn is_3d(&self) -> bool {
        match self {
            VectorGeometry::Point(g) => g.is_3d,
            VectorGeometry::MultiPoint(g) => g.is_3d,
            VectorGeometry::LineString(g) => g.is_3d,
            VectorGeometry::MultiLineString(g) => g.is_3d,
            VectorGeometry::Polygon(g) => g.is_3d,
            VectorGeometry::MultiPolygon(g) => g.is_3d,
        }
    }

    /// True when there is nothing left to draw. A point is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            VectorGeometry::Point(_) => false,
            VectorGeometry::MultiPoint(g) => g.coordinates.is_empty(),
            VectorGeometry::LineString(g) => g.coordinates.is_empty(),
            VectorGeometry::MultiLineString(g) => g.coordinates.is_empty(),
            VectorGeometry::Polygon(g) => g.coordinates.is_empty(),
            VectorGeometry::MultiPolygon(g) => g.coordinates.is_empty(),
        }
    }

    #[must_use]
    pub fn vec_bbox(&self) -> Option<BBox> {
        match self {
            VectorGeometry::Point(g) => g.vec_bbox,
            VectorGeometry::MultiPoint(g) => g.vec_bbox,
            VectorGeometry::LineString(g) => g.vec_bbox,
            VectorGeometry::MultiLineString(g) => g.vec_bbox,
            VectorGeometry::Polygon(g) => g.vec_bbox,
            VectorGeometry::MultiPolygon(g) => g.vec_bbox,
        }
    }

    pub fn set_vec_bbox(&mut self, vec_bbox: Option<BBox>) {
        match self {
            VectorGeometry::Point(g) => g.vec_bbox = vec_bbox,
            VectorGeometry::MultiPoint(g) => g.vec_bbox = vec_bbox,
            VectorGeometry::LineString(g) => g.vec_bbox = vec_bbox,
            VectorGeometry::MultiLineString(g) => g.vec_bbox = vec_bbox,
            VectorGeometry::Polygon(g) => g.vec_bbox = vec_bbox,
            VectorGeometry::MultiPolygon(g) => g.vec_bbox = vec_bbox,
        }
    }

    pub(crate) fn set_header(&mut self, is_3d: bool, bbox: Option<BBox>) {
        macro_rules! set {
            ($g:expr) => {{
                $g.is_3d = is_3d;
                $g.bbox = bbox;
            }};
        }
        match self {
            VectorGeometry::Point(g) => set!(g),
            VectorGeometry::MultiPoint(g) => set!(g),
            VectorGeometry::LineString(g) => set!(g),
            VectorGeometry::MultiLineString(g) => set!(g),
            VectorGeometry::Polygon(g) => set!(g),
            VectorGeometry::MultiPolygon(g) => set!(g),
        }
    }

    /// Visits every vertex in storage order.
    pub fn for_each_point(&self, mut f: impl FnMut(&VectorPoint<M>)) {
        match self {
            VectorGeometry::Point(g) => f(&g.coordinates),
            VectorGeometry::MultiPoint(g) => g.coordinates.iter().for_each(f),
            VectorGeometry::LineString(g) => g.coordinates.iter().for_each(f),
            VectorGeometry::MultiLineString(g) | VectorGeometry::Polygon(g) => {
                g.coordinates.iter().flatten().for_each(f);
            }
            VectorGeometry::MultiPolygon(g) => {
                g.coordinates.iter().flatten().flatten().for_each(f);
            }
        }
    }

    /// Visits every vertex mutably in storage order.
    pub fn for_each_point_mut(&mut self, mut f: impl FnMut(&mut VectorPoint<M>)) {
        match self {
            VectorGeometry::Point(g) => f(&mut g.coordinates),
            VectorGeometry::MultiPoint(g) => g.coordinates.iter_mut().for_each(f),
            VectorGeometry::LineString(g) => g.coordinates.iter_mut().for_each(f),
            VectorGeometry::MultiLineString(g) | VectorGeometry::Polygon(g) => {
                g.coordinates.iter_mut().flatten().for_each(f);
            }
            VectorGeometry::MultiPolygon(g) => {
                g.coordinates.iter_mut().flatten().flatten().for_each(f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square() -> VectorGeometry {
        VectorGeometry::Polygon(VectorGeometryBody::new(vec![vec![
            VectorPoint::new(0.0, 0.0),
            VectorPoint::new(1.0, 0.0),
            VectorPoint::new(1.0, 1.0),
            VectorPoint::new(0.0, 0.0),
        ]]))
    }

    #[test]
    fn test_tagged_wire_format() {
        let mut geometry = square();
        geometry.set_vec_bbox(Some(BBox::new(0.0, 0.0, 1.0, 1.0)));
        let value = serde_json::to_value(&geometry).unwrap();
        assert_eq!(value["type"], "Polygon");
        assert_eq!(value["is3D"], false);
        assert_eq!(value["vecBBox"], json!([0.0, 0.0, 1.0, 1.0]));
        assert!(value.get("offset").is_none(), "absent offset must not be written");

        let back: VectorGeometry = serde_json::from_value(value).unwrap();
        assert_eq!(back, geometry);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let value = json!({ "type": "Circle", "is3D": false, "coordinates": [] });
        assert!(serde_json::from_value::<VectorGeometry>(value).is_err());
    }

    #[test]
    fn test_is_empty() {
        let point: VectorGeometry =
            VectorGeometry::Point(VectorGeometryBody::new(VectorPoint::new(0.0, 0.0)));
        assert!(!point.is_empty());
        let line: VectorGeometry = VectorGeometry::LineString(VectorGeometryBody::new(vec![]));
        assert!(line.is_empty());
        assert!(!square().is_empty());
    }

    #[test]
    fn test_for_each_point_mut_visits_all() {
        let mut geometry = square();
        let mut count = 0;
        geometry.for_each_point_mut(|p| {
            p.x += 10.0;
            count += 1;
        });
        assert_eq!(count, 4);
        let bbox = BBox::from_geometry(&geometry).expect("has points");
        assert_eq!(bbox, BBox::new(10.0, 0.0, 11.0, 1.0));
        assert_eq!(geometry.type_name(), "Polygon");
    }
}
