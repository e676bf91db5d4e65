//! Projection conversion.
//!
//! Input arrives either as lon/lat features or as features already placed
//! on a cube face. Depending on the requested [`Projection`] everything is
//! brought into one of two planar frames: face ST (one feature per face it
//! touches) or unit-scale Web Mercator.

use std::f64::consts::PI;

use cubetile_cubesphere::{
    Face, LonLat, point_from_lonlat, point_from_st, point_to_lonlat, point_to_st,
};
use serde::{Deserialize, Serialize};

use crate::bbox::{BBox, extend_bbox};
use crate::clip::{ClippedLine, DEFAULT_BUFFER, clip_line};
use crate::error::GeometryError;
use crate::feature::{Feature, JsonCollection, S2Feature, VectorFeature, VectorFeatures, WmFeature};
use crate::geojson::{Geometry, Position};
use crate::point::VectorPoint;
use crate::vector::{VectorGeometry, VectorGeometryBody, VectorLineString, VectorPolygon};

/// Target frame for tiling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Projection {
    /// Cube-sphere faces.
    #[default]
    S2,
    /// Web Mercator.
    WG,
}

/// Converts any input collection into features in `projection`.
///
/// Lon/lat features are split per face for [`Projection::S2`]; face
/// features are unprojected for [`Projection::WG`]. With `to_unit_scale`
/// Web Mercator output is rescaled into `[0, 1]`.
pub fn convert<M: Clone>(
    projection: Projection,
    data: JsonCollection<M>,
    build_bbox: bool,
    to_unit_scale: bool,
) -> Result<Vec<VectorFeatures<M>>, GeometryError> {
    let mut res = Vec::new();
    match data {
        JsonCollection::Feature(feature) => {
            let feature = to_vector(feature, build_bbox)?;
            res.extend(convert_vector_feature(projection, feature, to_unit_scale));
        }
        JsonCollection::VectorFeature(feature) => {
            res.extend(convert_vector_feature(projection, feature, to_unit_scale));
        }
        JsonCollection::FeatureCollection(collection) => {
            for feature in collection.features {
                let feature = match feature {
                    WmFeature::Feature(feature) => to_vector(feature, build_bbox)?,
                    WmFeature::VectorFeature(feature) => feature,
                };
                res.extend(convert_vector_feature(projection, feature, to_unit_scale));
            }
        }
        JsonCollection::S2Feature(feature) => {
            res.push(convert_s2_feature(projection, feature, to_unit_scale));
        }
        JsonCollection::S2FeatureCollection(collection) => {
            res.extend(
                collection
                    .features
                    .into_iter()
                    .map(|feature| convert_s2_feature(projection, feature, to_unit_scale)),
            );
        }
    }
    tracing::debug!(?projection, features = res.len(), "converted input");
    Ok(res)
}

fn convert_vector_feature<M: Clone>(
    projection: Projection,
    mut feature: VectorFeature<M>,
    unit_scale: bool,
) -> Vec<VectorFeatures<M>> {
    match projection {
        Projection::WG => {
            if unit_scale {
                to_unit_scale(&mut feature);
            }
            vec![VectorFeatures::VectorFeature(feature)]
        }
        Projection::S2 => to_s2(feature).into_iter().map(VectorFeatures::S2Feature).collect(),
    }
}

fn convert_s2_feature<M>(
    projection: Projection,
    feature: S2Feature<M>,
    unit_scale: bool,
) -> VectorFeatures<M> {
    match projection {
        Projection::WG => {
            let mut feature = to_wm(feature);
            if unit_scale {
                to_unit_scale(&mut feature);
            }
            VectorFeatures::VectorFeature(feature)
        }
        Projection::S2 => VectorFeatures::S2Feature(feature),
    }
}

// ---------------------------------------------------------------------------
// GeoJSON -> vector
// ---------------------------------------------------------------------------

/// Converts a GeoJSON feature into vector form, still in lon/lat.
///
/// `*3D` geometry types set `is3D`, `mValues` are attached to their points,
/// and with `build_bbox` a lon/lat bounding box is computed unless the
/// geometry already carries one.
pub fn to_vector<M>(
    feature: Feature<M>,
    build_bbox: bool,
) -> Result<VectorFeature<M>, GeometryError> {
    let Feature {
        id,
        properties,
        geometry,
        metadata,
    } = feature;
    Ok(VectorFeature {
        id,
        properties,
        geometry: convert_geometry(geometry, build_bbox)?,
        metadata,
    })
}

struct BBoxBuilder {
    enabled: bool,
    bbox: Option<BBox>,
}

impl BBoxBuilder {
    fn point<P: Position, M>(&mut self, position: &P, m: Option<M>) -> VectorPoint<M> {
        let point = VectorPoint {
            x: position.x(),
            y: position.y(),
            z: position.z(),
            m,
            t: None,
        };
        if self.enabled {
            self.bbox = Some(extend_bbox(self.bbox, &point));
        }
        point
    }

    fn line<P: Position, M>(
        &mut self,
        coords: Vec<P>,
        m_values: Option<Vec<M>>,
    ) -> Result<VectorLineString<M>, GeometryError> {
        Ok(pair_m_values(coords, m_values)?
            .into_iter()
            .map(|(p, m)| self.point(&p, m))
            .collect())
    }

    fn lines<P: Position, M>(
        &mut self,
        coords: Vec<Vec<P>>,
        m_values: Option<Vec<Vec<M>>>,
    ) -> Result<Vec<VectorLineString<M>>, GeometryError> {
        pair_m_values(coords, m_values)?
            .into_iter()
            .map(|(line, m)| self.line(line, m))
            .collect()
    }

    fn polygons<P: Position, M>(
        &mut self,
        coords: Vec<Vec<Vec<P>>>,
        m_values: Option<Vec<Vec<Vec<M>>>>,
    ) -> Result<Vec<VectorPolygon<M>>, GeometryError> {
        pair_m_values(coords, m_values)?
            .into_iter()
            .map(|(polygon, m)| self.lines(polygon, m))
            .collect()
    }
}

/// Pairs each coordinate with its m-value, insisting the shapes agree.
fn pair_m_values<T, M>(
    coords: Vec<T>,
    m_values: Option<Vec<M>>,
) -> Result<Vec<(T, Option<M>)>, GeometryError> {
    match m_values {
        None => Ok(coords.into_iter().map(|c| (c, None)).collect()),
        Some(m_values) if m_values.len() == coords.len() => {
            Ok(coords.into_iter().zip(m_values.into_iter().map(Some)).collect())
        }
        Some(m_values) => Err(GeometryError::MValueMismatch {
            expected: coords.len(),
            found: m_values.len(),
        }),
    }
}

fn convert_geometry<M>(
    geometry: Geometry<M>,
    build_bbox: bool,
) -> Result<VectorGeometry<M>, GeometryError> {
    let is_3d = geometry.is_3d();
    let source_bbox = geometry.bbox();
    let mut b = BBoxBuilder {
        enabled: build_bbox && source_bbox.is_none(),
        bbox: None,
    };

    macro_rules! body {
        ($variant:ident, $coords:expr) => {
            VectorGeometry::$variant(VectorGeometryBody::new($coords))
        };
    }
    let mut vector = match geometry {
        Geometry::Point(g) => body!(Point, b.point(&g.coordinates, g.m_values)),
        Geometry::Point3D(g) => body!(Point, b.point(&g.coordinates, g.m_values)),
        Geometry::MultiPoint(g) => body!(MultiPoint, b.line(g.coordinates, g.m_values)?),
        Geometry::MultiPoint3D(g) => body!(MultiPoint, b.line(g.coordinates, g.m_values)?),
        Geometry::LineString(g) => body!(LineString, b.line(g.coordinates, g.m_values)?),
        Geometry::LineString3D(g) => body!(LineString, b.line(g.coordinates, g.m_values)?),
        Geometry::MultiLineString(g) => body!(MultiLineString, b.lines(g.coordinates, g.m_values)?),
        Geometry::MultiLineString3D(g) => {
            body!(MultiLineString, b.lines(g.coordinates, g.m_values)?)
        }
        Geometry::Polygon(g) => body!(Polygon, b.lines(g.coordinates, g.m_values)?),
        Geometry::Polygon3D(g) => body!(Polygon, b.lines(g.coordinates, g.m_values)?),
        Geometry::MultiPolygon(g) => body!(MultiPolygon, b.polygons(g.coordinates, g.m_values)?),
        Geometry::MultiPolygon3D(g) => {
            body!(MultiPolygon, b.polygons(g.coordinates, g.m_values)?)
        }
    };

    vector.set_header(is_3d, if b.enabled { b.bbox } else { source_bbox });
    Ok(vector)
}

// ---------------------------------------------------------------------------
// Lon/lat -> S2
// ---------------------------------------------------------------------------

/// Splits a lon/lat vector feature into one feature per cube face it
/// touches, with geometry in that face's ST frame.
///
/// Lines and rings are carried across face edges through a per-face
/// adjacency transform and clipped to the face with a small buffer.
#[must_use]
pub fn to_s2<M: Clone>(feature: VectorFeature<M>) -> Vec<S2Feature<M>> {
    let VectorFeature {
        id,
        properties,
        geometry,
        metadata,
    } = feature;
    convert_vector_geometry(geometry)
        .into_iter()
        .map(|(face, geometry)| S2Feature {
            id,
            face,
            properties: properties.clone(),
            geometry,
            metadata: metadata.clone(),
        })
        .collect()
}

fn convert_vector_geometry<M: Clone>(
    geometry: VectorGeometry<M>,
) -> Vec<(Face, VectorGeometry<M>)> {
    match geometry {
        VectorGeometry::Point(g) => vec![s2_point(g.coordinates, g.is_3d, g.bbox)],
        VectorGeometry::MultiPoint(g) => g
            .coordinates
            .into_iter()
            .map(|p| s2_point(p, g.is_3d, g.bbox))
            .collect(),
        VectorGeometry::LineString(g) => s2_lines(&g.coordinates, g.is_3d, g.bbox),
        VectorGeometry::MultiLineString(g) => g
            .coordinates
            .iter()
            .flat_map(|line| s2_lines(line, g.is_3d, g.bbox))
            .collect(),
        VectorGeometry::Polygon(g) => s2_polygon(&g.coordinates, g.is_3d, g.bbox),
        VectorGeometry::MultiPolygon(g) => g
            .coordinates
            .iter()
            .flat_map(|polygon| s2_polygon(polygon, g.is_3d, g.bbox))
            .collect(),
    }
}

fn s2_point<M>(p: VectorPoint<M>, is_3d: bool, bbox: Option<BBox>) -> (Face, VectorGeometry<M>) {
    let (face, s, t) = point_to_st(point_from_lonlat(LonLat::new(p.x, p.y)));
    let point = VectorPoint {
        x: s,
        y: t,
        z: p.z,
        m: p.m,
        t: None,
    };
    let vec_bbox = Some(BBox::from_point(&point));
    let body = VectorGeometryBody {
        is_3d,
        coordinates: point,
        offset: None,
        bbox,
        vec_bbox,
    };
    (face, VectorGeometry::Point(body))
}

fn s2_lines<M: Clone>(
    line: &[VectorPoint<M>],
    is_3d: bool,
    bbox: Option<BBox>,
) -> Vec<(Face, VectorGeometry<M>)> {
    convert_line_string(line, false)
        .into_iter()
        .map(|(face, piece)| {
            let body = VectorGeometryBody {
                is_3d,
                coordinates: piece.line,
                offset: Some(piece.offset),
                bbox,
                vec_bbox: piece.vec_bbox,
            };
            (face, VectorGeometry::LineString(body))
        })
        .collect()
}

/// One polygon per face the outer ring reaches. Holes are attached to every
/// outer piece on their face.
fn s2_polygon<M: Clone>(
    polygon: &[VectorLineString<M>],
    is_3d: bool,
    bbox: Option<BBox>,
) -> Vec<(Face, VectorGeometry<M>)> {
    let Some((outer, inner)) = polygon.split_first() else {
        return Vec::new();
    };
    let outer_pieces = convert_line_string(outer, true);
    let inner_pieces: Vec<_> = inner
        .iter()
        .flat_map(|ring| convert_line_string(ring, true))
        .collect();

    outer_pieces
        .into_iter()
        .map(|(face, piece)| {
            let mut rings = vec![piece.line];
            let mut offsets = vec![piece.offset];
            let mut vec_bbox = piece.vec_bbox;
            for (inner_face, hole) in &inner_pieces {
                if *inner_face == face {
                    rings.push(hole.line.clone());
                    offsets.push(hole.offset);
                    vec_bbox = match (vec_bbox, hole.vec_bbox) {
                        (Some(a), Some(b)) => Some(a.merge(&b)),
                        (a, b) => a.or(b),
                    };
                }
            }
            let body = VectorGeometryBody {
                is_3d,
                coordinates: rings,
                offset: Some(offsets),
                bbox,
                vec_bbox,
            };
            (face, VectorGeometry::Polygon(body))
        })
        .collect()
}

/// Projects every vertex to ST, then for each face the line visits, maps
/// the whole line into that face's frame and clips it to the buffered face.
fn convert_line_string<M: Clone>(
    line: &[VectorPoint<M>],
    is_polygon: bool,
) -> Vec<(Face, ClippedLine<M>)> {
    let mut faces: Vec<Face> = Vec::new();
    let st: Vec<(Face, f64, f64)> = line
        .iter()
        .map(|p| {
            let st = point_to_st(point_from_lonlat(LonLat::new(p.x, p.y)));
            if !faces.contains(&st.0) {
                faces.push(st.0);
            }
            st
        })
        .collect();

    let unit = BBox::new(0.0, 0.0, 1.0, 1.0);
    let mut res = Vec::new();
    for face in faces {
        let projected: Vec<_> = line
            .iter()
            .zip(&st)
            .map(|(p, &(cur, s, t))| {
                let (x, y) = st_to_face(face, cur, s, t);
                VectorPoint {
                    x,
                    y,
                    z: p.z,
                    m: p.m.clone(),
                    t: None,
                }
            })
            .collect();
        for piece in clip_line(&projected, unit, is_polygon, 0.0, DEFAULT_BUFFER) {
            res.push((face, piece));
        }
    }
    res
}

/// `[rotation, dx, dy]` taking an ST point on face `current` into the frame
/// of face `target`, indexed `[target][current]`. Opposite faces are not
/// mirrored, so lines are expected to reach at most one face past the
/// target.
const FACE_RULE_SET: [[(i16, i8, i8); 6]; 6] = [
    [(0, 0, 0), (0, 1, 0), (90, 0, 1), (-90, 2, 0), (-90, -1, 0), (0, 0, -1)],
    [(0, -1, 0), (0, 0, 0), (0, 0, 1), (-90, 1, 0), (-90, 2, 0), (90, 0, -1)],
    [(-90, -1, 0), (0, 0, -1), (0, 0, 0), (0, 1, 0), (90, 0, 1), (-90, 2, 0)],
    [(-90, 2, 0), (90, 0, -1), (0, -1, 0), (0, 0, 0), (0, 0, 1), (-90, 1, 0)],
    [(90, 0, 1), (-90, 2, 0), (-90, -1, 0), (0, 0, -1), (0, 0, 0), (0, 1, 0)],
    [(0, 0, 1), (-90, 1, 0), (-90, 2, 0), (90, 0, -1), (0, -1, 0), (0, 0, 0)],
];

fn st_to_face(target: Face, current: Face, s: f64, t: f64) -> (f64, f64) {
    if target == current {
        return (s, t);
    }
    let (rot, dx, dy) = FACE_RULE_SET[usize::from(target.index())][usize::from(current.index())];
    let (s, t) = match rot {
        90 => (t, 1.0 - s),
        -90 => (1.0 - t, s),
        _ => (s, t),
    };
    (s + f64::from(dx), t + f64::from(dy))
}

// ---------------------------------------------------------------------------
// S2 -> lon/lat
// ---------------------------------------------------------------------------

/// Moves a face feature back to lon/lat. The face-frame `vecBBox` no longer
/// applies and is cleared.
#[must_use]
pub fn to_wm<M>(feature: S2Feature<M>) -> VectorFeature<M> {
    let S2Feature {
        id,
        face,
        properties,
        mut geometry,
        metadata,
    } = feature;
    geometry.for_each_point_mut(|p| {
        let ll = point_to_lonlat(point_from_st(face, p.x, p.y));
        p.x = ll.lon;
        p.y = ll.lat;
    });
    geometry.set_vec_bbox(None);
    VectorFeature {
        id,
        properties,
        geometry,
        metadata,
    }
}

// ---------------------------------------------------------------------------
// Web Mercator unit scale
// ---------------------------------------------------------------------------

/// Projects a lon/lat feature into unit-scale Web Mercator in place and
/// recomputes its `vecBBox`.
pub fn to_unit_scale<M>(feature: &mut VectorFeature<M>) {
    let mut vec_bbox = None;
    feature.geometry.for_each_point_mut(|p| {
        p.x = project_x(p.x);
        p.y = project_y(p.y);
        vec_bbox = Some(extend_bbox(vec_bbox, p));
    });
    feature.geometry.set_vec_bbox(vec_bbox);
}

/// Inverse of [`to_unit_scale`], in place.
pub fn to_ll<M>(feature: &mut VectorFeature<M>) {
    feature.geometry.for_each_point_mut(|p| {
        p.x = unproject_x(p.x);
        p.y = unproject_y(p.y);
    });
}

/// Longitude to unit x.
#[must_use]
pub fn project_x(lon: f64) -> f64 {
    lon / 360.0 + 0.5
}

/// Latitude to unit y (y grows southwards), clamped to `[0, 1]`.
#[must_use]
pub fn project_y(lat: f64) -> f64 {
    let sin = lat.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    y.clamp(0.0, 1.0)
}

#[must_use]
pub fn unproject_x(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

#[must_use]
pub fn unproject_y(y: f64) -> f64 {
    (PI * 2.0 * (0.5 - y)).sinh().atan().to_degrees()
}
