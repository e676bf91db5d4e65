//! GeoJSON geometries, extended with per-vertex `mValues` and explicit
//! `*3D` variants.

use serde::{Deserialize, Serialize};

use crate::bbox::BBox;
use crate::point::MValue;

/// `[lon, lat]`.
pub type Point = [f64; 2];
/// `[lon, lat, z]`.
pub type Point3D = [f64; 3];

/// Access to the components of a GeoJSON position.
pub trait Position {
    fn x(&self) -> f64;
    fn y(&self) -> f64;
    fn z(&self) -> Option<f64>;
}

impl Position for Point {
    fn x(&self) -> f64 {
        self[0]
    }
    fn y(&self) -> f64 {
        self[1]
    }
    fn z(&self) -> Option<f64> {
        None
    }
}

impl Position for Point3D {
    fn x(&self) -> f64 {
        self[0]
    }
    fn y(&self) -> f64 {
        self[1]
    }
    fn z(&self) -> Option<f64> {
        Some(self[2])
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "C: Deserialize<'de>, V: Deserialize<'de>"))]
pub struct GeometryBody<C, V> {
    pub coordinates: C,
    /// Measurement values mirroring the shape of `coordinates`.
    #[serde(rename = "mValues", default, skip_serializing_if = "Option::is_none")]
    pub m_values: Option<V>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
}

impl<C, V> GeometryBody<C, V> {
    #[must_use]
    pub fn new(coordinates: C) -> Self {
        Self {
            coordinates,
            m_values: None,
            bbox: None,
        }
    }
}

type Line<P> = Vec<P>;
type Lines<P> = Vec<Vec<P>>;
type Polygons<P> = Vec<Vec<Vec<P>>>;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry<M = MValue> {
    Point(GeometryBody<Point, M>),
    MultiPoint(GeometryBody<Line<Point>, Line<M>>),
    LineString(GeometryBody<Line<Point>, Line<M>>),
    MultiLineString(GeometryBody<Lines<Point>, Lines<M>>),
    Polygon(GeometryBody<Lines<Point>, Lines<M>>),
    MultiPolygon(GeometryBody<Polygons<Point>, Polygons<M>>),
    Point3D(GeometryBody<Point3D, M>),
    MultiPoint3D(GeometryBody<Line<Point3D>, Line<M>>),
    LineString3D(GeometryBody<Line<Point3D>, Line<M>>),
    MultiLineString3D(GeometryBody<Lines<Point3D>, Lines<M>>),
    Polygon3D(GeometryBody<Lines<Point3D>, Lines<M>>),
    MultiPolygon3D(GeometryBody<Polygons<Point3D>, Polygons<M>>),
}

impl<M> Geometry<M> {
    #[must_use]
    pub fn is_3d(&self) -> bool {
        matches!(
            self,
            Geometry::Point3D(_)
                | Geometry::MultiPoint3D(_)
                | Geometry::LineString3D(_)
                | Geometry::MultiLineString3D(_)
                | Geometry::Polygon3D(_)
                | Geometry::MultiPolygon3D(_)
        )
    }

    #[must_use]
    pub fn bbox(&self) -> Option<BBox> {
        match self {
            Geometry::Point(g) => g.bbox,
            Geometry::MultiPoint(g) | Geometry::LineString(g) => g.bbox,
            Geometry::MultiLineString(g) | Geometry::Polygon(g) => g.bbox,
            Geometry::MultiPolygon(g) => g.bbox,
            Geometry::Point3D(g) => g.bbox,
            Geometry::MultiPoint3D(g) | Geometry::LineString3D(g) => g.bbox,
            Geometry::MultiLineString3D(g) | Geometry::Polygon3D(g) => g.bbox,
            Geometry::MultiPolygon3D(g) => g.bbox,
        }
    }
}
