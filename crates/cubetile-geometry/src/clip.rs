//! Axis-aligned clipping of vector geometry.
//!
//! Points are kept on a half-open range so a point on a shared tile edge
//! lands in exactly one child. Lines and rings are clipped against the
//! buffered closed range so neighbouring tiles overlap at the seam. Lines
//! are cut into pieces where they leave the range; rings are kept whole and
//! re-closed. Every piece records the arc length at which it starts.

use crate::bbox::BBox;
use crate::feature::VectorFeatures;
use crate::point::{Axis, VectorPoint};
use crate::vector::{
    VectorGeometry, VectorGeometryBody, VectorLineString, VectorMultiLineOffset,
    VectorMultiLineString,
};

/// Buffer of a full-size tile: 64 units on a 1024 extent.
pub const DEFAULT_BUFFER: f64 = 0.0625;

/// One contiguous piece of a clipped line or ring.
#[derive(Clone, Debug, PartialEq)]
pub struct ClippedLine<M> {
    pub line: VectorLineString<M>,
    /// Arc length of the source line at which this piece starts.
    pub offset: f64,
    pub vec_bbox: Option<BBox>,
}

/// Clips every feature to `[k1, k2]` on `axis`, where the bounds are in tile
/// units at `scale` (`1 << zoom`) and `base_buffer` is in the same units as
/// a full tile. Returns `None` when nothing survives.
pub fn clip_features<M: Clone>(
    features: &[VectorFeatures<M>],
    scale: f64,
    k1: f64,
    k2: f64,
    axis: Axis,
    base_buffer: f64,
) -> Option<Vec<VectorFeatures<M>>> {
    let k1 = k1 / scale;
    let k2 = k2 / scale;
    let buffer = base_buffer / scale;
    let k1b = k1 - buffer;
    let k2b = k2 + buffer;

    let clipped: Vec<_> = features
        .iter()
        .filter_map(|feature| {
            let mut geometry = clip_geometry(feature.geometry(), axis, k1, k2, k1b, k2b)?;
            let vec_bbox = geometry.vec_bbox().unwrap_or_default().clip(axis, k1b, k2b);
            geometry.set_vec_bbox(Some(vec_bbox));
            Some(feature.with_geometry(geometry))
        })
        .collect();

    (!clipped.is_empty()).then_some(clipped)
}

fn clip_geometry<M: Clone>(
    geometry: &VectorGeometry<M>,
    axis: Axis,
    k1: f64,
    k2: f64,
    k1b: f64,
    k2b: f64,
) -> Option<VectorGeometry<M>> {
    match geometry {
        VectorGeometry::Point(g) => clip_point(g, axis, k1, k2).map(VectorGeometry::Point),
        VectorGeometry::MultiPoint(g) => clip_multi_point(g, axis, k1, k2),
        VectorGeometry::LineString(g) => clip_line_string(g, axis, k1b, k2b),
        VectorGeometry::MultiLineString(g) => {
            clip_rings(g, axis, k1b, k2b, false).map(VectorGeometry::MultiLineString)
        }
        VectorGeometry::Polygon(g) => {
            clip_rings(g, axis, k1b, k2b, true).map(VectorGeometry::Polygon)
        }
        VectorGeometry::MultiPolygon(g) => clip_multi_polygon(g, axis, k1b, k2b),
    }
}

/// Keeps a point geometry when `k1 <= value < k2` on `axis`.
pub fn clip_point<M: Clone>(
    geometry: &VectorGeometryBody<VectorPoint<M>>,
    axis: Axis,
    k1: f64,
    k2: f64,
) -> Option<VectorGeometryBody<VectorPoint<M>>> {
    let value = geometry.coordinates.axis(axis);
    (value >= k1 && value < k2).then(|| geometry.clone())
}

fn clip_multi_point<M: Clone>(
    geometry: &VectorGeometryBody<Vec<VectorPoint<M>>>,
    axis: Axis,
    k1: f64,
    k2: f64,
) -> Option<VectorGeometry<M>> {
    let points: Vec<_> = geometry
        .coordinates
        .iter()
        .filter(|p| {
            let value = p.axis(axis);
            value >= k1 && value < k2
        })
        .cloned()
        .collect();
    if points.is_empty() {
        return None;
    }
    let vec_bbox = BBox::from_points(&points);
    Some(VectorGeometry::MultiPoint(VectorGeometryBody {
        is_3d: geometry.is_3d,
        coordinates: points,
        offset: None,
        bbox: geometry.bbox,
        vec_bbox,
    }))
}

/// A clipped line string may split into several pieces, so it comes back
/// as a multi line string.
fn clip_line_string<M: Clone>(
    geometry: &VectorGeometryBody<VectorLineString<M>, f64>,
    axis: Axis,
    k1: f64,
    k2: f64,
) -> Option<VectorGeometry<M>> {
    let pieces = clip_line_axis(
        &geometry.coordinates,
        geometry.offset.unwrap_or(0.0),
        k1,
        k2,
        axis,
        false,
    );
    if pieces.is_empty() {
        return None;
    }
    let (coordinates, offsets) = unzip_pieces(pieces);
    Some(VectorGeometry::MultiLineString(VectorGeometryBody {
        is_3d: geometry.is_3d,
        coordinates,
        offset: Some(offsets),
        bbox: geometry.bbox,
        vec_bbox: geometry.vec_bbox,
    }))
}

/// Shared by multi line strings and polygons. A polygon whose outer ring
/// clips away is dropped, holes and all.
fn clip_rings<M: Clone>(
    geometry: &VectorGeometryBody<VectorMultiLineString<M>, VectorMultiLineOffset>,
    axis: Axis,
    k1: f64,
    k2: f64,
    is_polygon: bool,
) -> Option<VectorGeometryBody<VectorMultiLineString<M>, VectorMultiLineOffset>> {
    let mut lines = Vec::new();
    let mut offsets = Vec::new();
    for (i, line) in geometry.coordinates.iter().enumerate() {
        let start = geometry
            .offset
            .as_ref()
            .and_then(|o| o.get(i).copied())
            .unwrap_or(0.0);
        let pieces = clip_line_axis(line, start, k1, k2, axis, is_polygon);
        if is_polygon && i == 0 && pieces.is_empty() {
            return None;
        }
        for piece in pieces {
            offsets.push(piece.offset);
            lines.push(piece.line);
        }
    }
    if lines.is_empty() {
        return None;
    }
    Some(VectorGeometryBody {
        is_3d: geometry.is_3d,
        coordinates: lines,
        offset: Some(offsets),
        bbox: geometry.bbox,
        vec_bbox: geometry.vec_bbox,
    })
}

fn clip_multi_polygon<M: Clone>(
    geometry: &VectorGeometryBody<Vec<VectorMultiLineString<M>>, Vec<VectorMultiLineOffset>>,
    axis: Axis,
    k1: f64,
    k2: f64,
) -> Option<VectorGeometry<M>> {
    let mut polygons = Vec::new();
    let mut offsets = Vec::new();
    for (p, polygon) in geometry.coordinates.iter().enumerate() {
        let body = VectorGeometryBody {
            is_3d: geometry.is_3d,
            coordinates: polygon.clone(),
            offset: geometry.offset.as_ref().and_then(|o| o.get(p).cloned()),
            bbox: geometry.bbox,
            vec_bbox: None,
        };
        if let Some(clipped) = clip_rings(&body, axis, k1, k2, true) {
            polygons.push(clipped.coordinates);
            offsets.push(clipped.offset.unwrap_or_default());
        }
    }
    if polygons.is_empty() {
        return None;
    }
    Some(VectorGeometry::MultiPolygon(VectorGeometryBody {
        is_3d: geometry.is_3d,
        coordinates: polygons,
        offset: Some(offsets),
        bbox: geometry.bbox,
        vec_bbox: geometry.vec_bbox,
    }))
}

/// Clips a line in a `[0, 1]` frame to `bbox` grown by `buffer` on every
/// side, first horizontally then vertically. Each returned piece carries
/// its own vector bounding box.
pub fn clip_line<M: Clone>(
    line: &[VectorPoint<M>],
    bbox: BBox,
    is_polygon: bool,
    offset: f64,
    buffer: f64,
) -> Vec<ClippedLine<M>> {
    clip_line_axis(
        line,
        offset,
        bbox.left - buffer,
        bbox.right + buffer,
        Axis::X,
        is_polygon,
    )
    .into_iter()
    .flat_map(|piece| {
        clip_line_axis(
            &piece.line,
            piece.offset,
            bbox.bottom - buffer,
            bbox.top + buffer,
            Axis::Y,
            is_polygon,
        )
    })
    .map(|mut piece| {
        piece.vec_bbox = BBox::from_points(&piece.line);
        piece
    })
    .collect()
}

/// Walks consecutive vertex pairs against `[k1, k2]` on `axis`, splicing
/// in exact crossings. `start_offset` is the arc length already covered
/// before the first vertex.
fn clip_line_axis<M: Clone>(
    line: &[VectorPoint<M>],
    start_offset: f64,
    k1: f64,
    k2: f64,
    axis: Axis,
    is_polygon: bool,
) -> Vec<ClippedLine<M>> {
    let mut pieces = Vec::new();
    let Some(last_point) = line.last() else {
        return pieces;
    };

    let mut slice: VectorLineString<M> = Vec::new();
    let mut cur_offset = start_offset;
    let mut acc_offset = start_offset;
    let mut prev = &line[0];
    let mut first_enter = false;

    for pair in line.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let av = a.axis(axis);
        let bv = b.axis(axis);
        let mut exited = false;

        // enter or continue
        if av < k1 {
            if bv > k1 {
                let p = intersect(axis, a, b, k1, b.z, b.m.clone());
                enter(&mut slice, p, &mut first_enter, &mut cur_offset, acc_offset, prev);
            }
        } else if av > k2 {
            if bv < k2 {
                let p = intersect(axis, a, b, k2, b.z, b.m.clone());
                enter(&mut slice, p, &mut first_enter, &mut cur_offset, acc_offset, prev);
            }
        } else {
            slice.push(a.clone());
        }

        // exit
        if bv < k1 && av >= k1 {
            let m = b.m.clone().or_else(|| a.m.clone());
            slice.push(intersect(axis, a, b, k1, b.z, m));
            exited = true;
        }
        if bv > k2 && av <= k2 {
            let m = b.m.clone().or_else(|| a.m.clone());
            slice.push(intersect(axis, a, b, k2, a.z, m));
            exited = true;
        }

        acc_offset += prev.distance(b);
        prev = b;

        if !is_polygon && exited {
            pieces.push(ClippedLine {
                line: std::mem::take(&mut slice),
                offset: cur_offset,
                vec_bbox: None,
            });
            first_enter = false;
        }
    }

    let v = last_point.axis(axis);
    if v >= k1 && v <= k2 {
        slice.push(last_point.clone());
    }

    if is_polygon && slice.len() > 1 {
        let first = &slice[0];
        if !first.same_xy(&slice[slice.len() - 1]) {
            slice.push(first.clone());
        }
    }

    if !slice.is_empty() {
        pieces.push(ClippedLine {
            line: slice,
            offset: cur_offset,
            vec_bbox: None,
        });
    }
    pieces
}

/// Pushes an entry crossing. The first entry of each piece moves the
/// piece's start offset to the crossing.
fn enter<M>(
    slice: &mut VectorLineString<M>,
    p: VectorPoint<M>,
    first_enter: &mut bool,
    cur_offset: &mut f64,
    acc_offset: f64,
    prev: &VectorPoint<M>,
) {
    if !*first_enter {
        *cur_offset = acc_offset + prev.distance(&p);
        *first_enter = true;
    }
    slice.push(p);
}

/// Crossing of segment `a→b` with the line `axis = k`. Crossings are always
/// retained by the simplifier, so they carry `t = 1`.
fn intersect<M>(
    axis: Axis,
    a: &VectorPoint<M>,
    b: &VectorPoint<M>,
    k: f64,
    z: Option<f64>,
    m: Option<M>,
) -> VectorPoint<M> {
    let (x, y) = match axis {
        Axis::X => {
            let t = (k - a.x) / (b.x - a.x);
            (k, a.y + (b.y - a.y) * t)
        }
        Axis::Y => {
            let t = (k - a.y) / (b.y - a.y);
            (a.x + (b.x - a.x) * t, k)
        }
    };
    VectorPoint {
        x,
        y,
        z,
        m,
        t: Some(1.0),
    }
}

fn unzip_pieces<M>(
    pieces: Vec<ClippedLine<M>>,
) -> (VectorMultiLineString<M>, VectorMultiLineOffset) {
    pieces.into_iter().map(|p| (p.line, p.offset)).unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{S2Feature, VectorFeature};
    use crate::point::{MValue, Properties};
    use cubetile_cubesphere::Face;
    use serde_json::json;

    fn m(a: i64) -> MValue {
        let mut m = MValue::new();
        m.insert("a".into(), json!(a));
        m
    }

    fn diagonal() -> Vec<VectorPoint> {
        vec![
            VectorPoint::new(0.0, 0.0).with_z(0.0),
            VectorPoint::new(5.0, 5.0).with_z(4.0).with_m(m(1)),
            VectorPoint::new(10.0, 10.0).with_z(-2.0).with_m(m(2)),
            VectorPoint::new(15.0, 15.0).with_z(3.0).with_m(m(3)),
        ]
    }

    fn s2_feature(geometry: VectorGeometry) -> VectorFeatures {
        VectorFeatures::S2Feature(S2Feature {
            id: None,
            face: Face::PosX,
            properties: Properties::new(),
            geometry,
            metadata: None,
        })
    }

    #[test]
    fn test_clip_line_simple() {
        let res = clip_line(&diagonal(), BBox::new(0.0, 0.0, 10.5, 10.5), false, 0.0, 0.0);
        assert_eq!(res.len(), 1);
        let piece = &res[0];
        assert_eq!(
            piece.line,
            vec![
                VectorPoint::new(0.0, 0.0).with_z(0.0),
                VectorPoint::new(5.0, 5.0).with_z(4.0).with_m(m(1)),
                VectorPoint::new(10.0, 10.0).with_z(-2.0).with_m(m(2)),
                VectorPoint::new(10.5, 10.5).with_z(-2.0).with_m(m(3)).with_t(1.0),
            ]
        );
        assert_eq!(piece.offset, 0.0);
        assert_eq!(piece.vec_bbox, Some(BBox::new(0.0, 0.0, 10.5, 10.5).with_z(-2.0, 4.0)));
    }

    #[test]
    fn test_clip_polygon_ring_is_closed() {
        let res = clip_line(&diagonal(), BBox::new(0.0, 0.0, 10.5, 10.5), true, 0.0, 0.0);
        assert_eq!(res.len(), 1);
        let ring = &res[0].line;
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[4], VectorPoint::new(0.0, 0.0).with_z(0.0));
        assert_eq!(ring[3].x, 10.5);
    }

    #[test]
    fn test_clip_line_starting_outside() {
        let res = clip_line(&diagonal(), BBox::new(2.5, 2.5, 10.5, 10.5), false, 0.0, 0.5);
        assert_eq!(res.len(), 1);
        let piece = &res[0];
        assert_eq!(
            piece.line.first(),
            Some(&VectorPoint::new(2.0, 2.0).with_z(4.0).with_m(m(1)).with_t(1.0))
        );
        assert_eq!(
            piece.line.last(),
            Some(&VectorPoint::new(11.0, 11.0).with_z(-2.0).with_m(m(3)).with_t(1.0))
        );
        assert_eq!(piece.offset, 2.8284271247461903);
    }

    #[test]
    fn test_clip_line_split_into_two_pieces() {
        let line: Vec<VectorPoint> = [
            (-2.0, 4.0),
            (2.0, 4.0),
            (8.0, 4.0),
            (12.0, 4.0),
            (12.0, 8.0),
            (8.0, 8.0),
            (2.0, 8.0),
            (-2.0, 8.0),
        ]
        .into_iter()
        .map(|(x, y)| VectorPoint::new(x, y))
        .collect();
        let res = clip_line(&line, BBox::new(0.0, 0.0, 10.0, 10.0), false, 0.0, 0.0);
        assert_eq!(res.len(), 2, "line leaves and re-enters the box once");

        assert_eq!(
            res[0].line,
            vec![
                VectorPoint::new(0.0, 4.0).with_t(1.0),
                VectorPoint::new(2.0, 4.0),
                VectorPoint::new(8.0, 4.0),
                VectorPoint::new(10.0, 4.0).with_t(1.0),
            ]
        );
        assert_eq!(res[0].offset, 2.0);
        assert_eq!(
            res[1].line,
            vec![
                VectorPoint::new(10.0, 8.0).with_t(1.0),
                VectorPoint::new(8.0, 8.0),
                VectorPoint::new(2.0, 8.0),
                VectorPoint::new(0.0, 8.0).with_t(1.0),
            ]
        );
        assert_eq!(res[1].offset, 20.0);
    }

    #[test]
    fn test_line_inside_unit_square_is_unchanged() {
        let line = vec![
            VectorPoint::<MValue>::new(0.1, 0.2),
            VectorPoint::new(0.5, 0.9),
            VectorPoint::new(0.8, 0.3),
        ];
        let res = clip_line(&line, BBox::new(0.0, 0.0, 1.0, 1.0), false, 0.0, 0.0);
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].line, line);
    }

    #[test]
    fn test_points_use_half_open_range() {
        let on_edge = VectorGeometryBody::new(VectorPoint::<MValue>::new(0.5, 0.25));
        assert!(clip_point(&on_edge, Axis::X, 0.0, 0.5).is_none());
        assert!(clip_point(&on_edge, Axis::X, 0.5, 1.0).is_some());
    }

    #[test]
    fn test_clip_features_drops_outside() {
        let features = vec![
            s2_feature(VectorGeometry::Point(VectorGeometryBody::new(VectorPoint::new(
                0.25, 0.25,
            )))),
            s2_feature(VectorGeometry::MultiPoint(VectorGeometryBody::new(vec![
                VectorPoint::new(0.75, 0.25),
                VectorPoint::new(0.1, 0.9),
            ]))),
        ];
        let left = clip_features(&features, 1.0, 0.0, 0.5, Axis::X, DEFAULT_BUFFER).unwrap();
        assert_eq!(left.len(), 2);
        let VectorGeometry::MultiPoint(mp) = left[1].geometry() else {
            panic!("expected MultiPoint");
        };
        assert_eq!(mp.coordinates, vec![VectorPoint::new(0.1, 0.9)]);

        let top = clip_features(&features, 1.0, 0.9, 1.0, Axis::Y, 0.0).unwrap();
        assert_eq!(top.len(), 1, "only the multi point reaches y = 0.9");
        assert!(clip_features(&features, 1.0, 0.95, 1.0, Axis::Y, 0.0).is_none());
    }

    #[test]
    fn test_clip_features_line_becomes_multi_line() {
        let mut body = VectorGeometryBody::new(vec![
            VectorPoint::new(0.1, 0.5),
            VectorPoint::new(0.9, 0.5),
        ]);
        body.offset = Some(0.0);
        body.vec_bbox = Some(BBox::new(0.1, 0.5, 0.9, 0.5));
        let features = vec![s2_feature(VectorGeometry::LineString(body))];
        let left = clip_features(&features, 1.0, 0.0, 0.5, Axis::X, 0.0).unwrap();
        let VectorGeometry::MultiLineString(g) = left[0].geometry() else {
            panic!("a clipped line string is returned as a multi line string");
        };
        assert_eq!(
            g.coordinates,
            vec![vec![VectorPoint::new(0.1, 0.5), VectorPoint::new(0.5, 0.5).with_t(1.0)]]
        );
        assert_eq!(g.offset, Some(vec![0.0]));
        assert_eq!(g.vec_bbox, Some(BBox::new(0.1, 0.5, 0.5, 0.5)));
    }

    #[test]
    fn test_polygon_with_clipped_outer_ring_is_dropped() {
        let square = |x0: f64, x1: f64| {
            vec![
                VectorPoint::new(x0, 0.1),
                VectorPoint::new(x1, 0.1),
                VectorPoint::new(x1, 0.2),
                VectorPoint::new(x0, 0.2),
                VectorPoint::new(x0, 0.1),
            ]
        };
        let polygon = VectorGeometry::Polygon(VectorGeometryBody::new(vec![square(0.7, 0.9)]));
        let holed = VectorGeometry::Polygon(VectorGeometryBody::new(vec![
            square(0.7, 0.9),
            square(0.1, 0.2),
        ]));
        let features = vec![s2_feature(polygon), s2_feature(holed)];
        assert!(clip_features(&features, 1.0, 0.0, 0.5, Axis::X, 0.0).is_none());
    }

    #[test]
    fn test_multi_polygon_keeps_surviving_members() {
        let square = |x0: f64, x1: f64| {
            vec![vec![
                VectorPoint::<MValue>::new(x0, 0.1),
                VectorPoint::new(x1, 0.1),
                VectorPoint::new(x1, 0.2),
                VectorPoint::new(x0, 0.2),
                VectorPoint::new(x0, 0.1),
            ]]
        };
        let geometry = VectorGeometry::MultiPolygon(VectorGeometryBody::new(vec![
            square(0.1, 0.2),
            square(0.7, 0.9),
        ]));
        let feature = VectorFeatures::VectorFeature(VectorFeature {
            id: Some(1),
            properties: Properties::new(),
            geometry,
            metadata: None,
        });
        let left = clip_features(&[feature], 1.0, 0.0, 0.5, Axis::X, 0.0).unwrap();
        let VectorGeometry::MultiPolygon(g) = left[0].geometry() else {
            panic!("expected MultiPolygon");
        };
        assert_eq!(g.coordinates.len(), 1);
        assert_eq!(g.coordinates[0], square(0.1, 0.2));
        assert_eq!(g.offset, Some(vec![vec![0.0]]));
    }
}
