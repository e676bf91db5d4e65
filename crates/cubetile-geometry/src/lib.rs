//! Vector geometry for the cube-sphere tiler.
//!
//! GeoJSON input is converted into [`VectorGeometry`] (points carrying
//! optional elevation, m-values and simplification significance), projected
//! either onto the six S2 faces or into unit-scale Web Mercator, and then
//! clipped and simplified per tile.

pub mod bbox;
pub mod clip;
pub mod convert;
mod error;
pub mod feature;
pub mod geojson;
mod point;
pub mod simplify;
pub mod vector;

pub use bbox::BBox;
pub use clip::{ClippedLine, clip_features, clip_line, clip_point};
pub use convert::{Projection, convert, to_ll, to_s2, to_unit_scale, to_vector, to_wm};
pub use error::GeometryError;
pub use feature::{
    Feature, FeatureCollection, JsonCollection, S2Feature, S2FeatureCollection, VectorFeature,
    VectorFeatures, WmFeature,
};
pub use geojson::Geometry;
pub use point::{Axis, MValue, Properties, VectorPoint};
pub use simplify::{build_sq_dists, simplify};
pub use vector::{
    VectorGeometry, VectorGeometryBody, VectorLineString, VectorMultiLineOffset,
    VectorMultiLineString, VectorMultiPolygon, VectorMultiPolygonOffset, VectorPolygon,
};
