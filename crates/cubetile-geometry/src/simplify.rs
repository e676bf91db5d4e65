//! Zoom-independent Douglas-Peucker simplification.
//!
//! [`build_sq_dists`] runs once per feature and stores on each vertex the
//! squared distance at which it was picked as a pivot (`t`). [`simplify`]
//! then filters by a per-zoom threshold, so every zoom level sees a subset
//! of the same vertices.

use crate::point::VectorPoint;
use crate::vector::{VectorGeometry, VectorLineString};

/// Tags every vertex of the lines and rings in `geometry` with its
/// significance. `tolerance` is in unit-scale coordinates at zoom 0.
pub fn build_sq_dists<M>(geometry: &mut VectorGeometry<M>, tolerance: f64, maxzoom: u8) {
    let tol = (tolerance / zoom_scale(maxzoom)).powi(2);
    match geometry {
        VectorGeometry::Point(_) | VectorGeometry::MultiPoint(_) => {}
        VectorGeometry::LineString(g) => build_sq_dist(&mut g.coordinates, tol),
        VectorGeometry::MultiLineString(g) | VectorGeometry::Polygon(g) => {
            for line in &mut g.coordinates {
                build_sq_dist(line, tol);
            }
        }
        VectorGeometry::MultiPolygon(g) => {
            for line in g.coordinates.iter_mut().flatten() {
                build_sq_dist(line, tol);
            }
        }
    }
}

fn build_sq_dist<M>(coords: &mut [VectorPoint<M>], sq_tolerance: f64) {
    let Some(last) = coords.len().checked_sub(1) else {
        return;
    };
    coords[0].t = Some(1.0);
    build_sq_dist_range(coords, 0, last, sq_tolerance);
    coords[last].t = Some(1.0);
}

fn build_sq_dist_range<M>(
    coords: &mut [VectorPoint<M>],
    first: usize,
    last: usize,
    sq_tolerance: f64,
) {
    let mut max_sq_dist = sq_tolerance;
    // Ties go to the vertex nearest the middle of the span, which keeps the
    // recursion shallow on collinear runs.
    let mid = (last - first) >> 1;
    let mut min_pos_to_mid = last - first;
    let mut index = None;

    let (ax, ay) = (coords[first].x, coords[first].y);
    let (bx, by) = (coords[last].x, coords[last].y);

    for (i, p) in coords.iter().enumerate().take(last).skip(first) {
        let d = sq_seg_dist(p.x, p.y, ax, ay, bx, by);
        if d > max_sq_dist {
            index = Some(i);
            max_sq_dist = d;
        } else if d == max_sq_dist {
            let pos_to_mid = i.abs_diff(mid);
            if pos_to_mid < min_pos_to_mid {
                index = Some(i);
                min_pos_to_mid = pos_to_mid;
            }
        }
    }

    if let Some(index) = index.filter(|_| max_sq_dist > sq_tolerance) {
        if index - first > 1 {
            build_sq_dist_range(coords, first, index, sq_tolerance);
        }
        coords[index].t = Some(max_sq_dist);
        if last - index > 1 {
            build_sq_dist_range(coords, index, last, sq_tolerance);
        }
    }
}

/// Squared distance from `(px, py)` to the segment `(ax, ay)-(bx, by)`.
fn sq_seg_dist(px: f64, py: f64, mut ax: f64, mut ay: f64, bx: f64, by: f64) -> f64 {
    let dx = bx - ax;
    let dy = by - ay;
    if dx != 0.0 || dy != 0.0 {
        let m = ((px - ax) * dx + (py - ay) * dy) / (dx * dx + dy * dy);
        if m > 1.0 {
            ax = bx;
            ay = by;
        } else if m > 0.0 {
            ax += dx * m;
            ay += dy * m;
        }
    }
    let dx = px - ax;
    let dy = py - ay;
    dx * dx + dy * dy
}

/// Drops the vertices that are insignificant at `zoom`.
///
/// Lines that fall below two vertices and rings that fall below four are
/// removed; a polygon whose outer ring goes is removed entirely, leaving
/// the geometry empty. Surviving rings are rewound so outer rings run
/// clockwise and holes counter-clockwise. At or past `maxzoom` nothing is
/// filtered and the geometry is left as is.
pub fn simplify<M: Clone>(
    geometry: &mut VectorGeometry<M>,
    tolerance: f64,
    zoom: u8,
    maxzoom: u8,
) {
    let zoom_tol = if zoom >= maxzoom {
        0.0
    } else {
        tolerance / zoom_scale(zoom)
    };
    if zoom_tol == 0.0 {
        return;
    }
    match geometry {
        VectorGeometry::Point(_) | VectorGeometry::MultiPoint(_) => {}
        VectorGeometry::LineString(g) => {
            g.coordinates = simplify_line(&g.coordinates, zoom_tol, false, false);
        }
        VectorGeometry::MultiLineString(g) => {
            g.coordinates = g
                .coordinates
                .iter()
                .map(|line| simplify_line(line, zoom_tol, false, false))
                .filter(|line| !line.is_empty())
                .collect();
        }
        VectorGeometry::Polygon(g) => {
            g.coordinates = simplify_polygon(&g.coordinates, zoom_tol);
        }
        VectorGeometry::MultiPolygon(g) => {
            g.coordinates = g
                .coordinates
                .iter()
                .map(|polygon| simplify_polygon(polygon, zoom_tol))
                .filter(|polygon| !polygon.is_empty())
                .collect();
        }
    }
}

fn simplify_polygon<M: Clone>(
    polygon: &[VectorLineString<M>],
    tolerance: f64,
) -> Vec<VectorLineString<M>> {
    let rings: Vec<_> = polygon
        .iter()
        .enumerate()
        .map(|(i, ring)| simplify_line(ring, tolerance, true, i == 0))
        .collect();
    if rings.first().is_none_or(|outer| outer.is_empty()) {
        return Vec::new();
    }
    rings.into_iter().filter(|ring| !ring.is_empty()).collect()
}

fn simplify_line<M: Clone>(
    line: &[VectorPoint<M>],
    tolerance: f64,
    is_polygon: bool,
    is_outer: bool,
) -> VectorLineString<M> {
    let sq_tolerance = tolerance * tolerance;
    let mut ring: VectorLineString<M> = line
        .iter()
        .filter(|p| p.t.unwrap_or(0.0) > sq_tolerance)
        .cloned()
        .collect();
    if is_polygon {
        rewind(&mut ring, is_outer);
    }

    let min_len = if is_polygon { 4 } else { 2 };
    if ring.len() < min_len {
        return Vec::new();
    }
    ring
}

/// Reverses `ring` in place unless it already winds the requested way.
/// Winding is judged in a y-down frame, so "clockwise" here is clockwise on
/// screen. Rings shorter than four vertices are left alone.
pub fn rewind<M>(ring: &mut [VectorPoint<M>], clockwise: bool) {
    let len = ring.len();
    if len < 4 {
        return;
    }
    let mut area = 0.0;
    let mut j = len - 1;
    for i in 0..len {
        area += (ring[i].x - ring[j].x) * (ring[i].y + ring[j].y);
        j = i;
    }
    if (area > 0.0) == clockwise {
        ring.reverse();
    }
}

fn zoom_scale(zoom: u8) -> f64 {
    2f64.powi(i32::from(zoom))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;
    use crate::vector::VectorGeometryBody;

    const TOLERANCE: f64 = 3.0 / 4_096.0;
    const MAXZOOM: u8 = 16;

    fn pts(coords: &[(f64, f64)]) -> Vec<VectorPoint> {
        coords.iter().map(|&(x, y)| VectorPoint::new(x, y)).collect()
    }

    fn open_square() -> Vec<VectorPoint> {
        pts(&[(0.25, 0.25), (0.75, 0.25), (0.75, 0.75), (0.25, 0.75)])
    }

    fn inner_ring() -> Vec<VectorPoint> {
        pts(&[(0.5, 0.5), (0.5, 0.25), (0.75, 0.25), (0.75, 0.5), (0.5, 0.5)])
    }

    fn ts(line: &[VectorPoint]) -> Vec<Option<f64>> {
        line.iter().map(|p| p.t).collect()
    }

    #[test]
    fn test_build_sq_dists_line() {
        let mut body = VectorGeometryBody::new(open_square());
        body.vec_bbox = Some(BBox::new(0.25, 0.25, 0.75, 0.75));
        let mut geometry = VectorGeometry::LineString(body);
        build_sq_dists(&mut geometry, TOLERANCE, MAXZOOM);
        let VectorGeometry::LineString(g) = &geometry else {
            unreachable!()
        };
        assert_eq!(ts(&g.coordinates), vec![Some(1.0), Some(0.125), Some(0.25), Some(1.0)]);

        let before = geometry.clone();
        simplify(&mut geometry, TOLERANCE, 0, MAXZOOM);
        assert_eq!(geometry, before, "every tagged vertex survives zoom 0");
    }

    #[test]
    fn test_build_sq_dists_ring_picks_pivot_nearest_middle() {
        let mut geometry = VectorGeometry::MultiLineString(VectorGeometryBody::new(vec![
            open_square(),
            inner_ring(),
        ]));
        build_sq_dists(&mut geometry, TOLERANCE, MAXZOOM);
        let VectorGeometry::MultiLineString(g) = &geometry else {
            unreachable!()
        };
        assert_eq!(
            ts(&g.coordinates[1]),
            vec![Some(1.0), Some(0.03125), Some(0.125), Some(0.03125), Some(1.0)]
        );
    }

    #[test]
    fn test_simplify_polygon_rewinds_holes() {
        let mut geometry =
            VectorGeometry::Polygon(VectorGeometryBody::new(vec![open_square(), inner_ring()]));
        build_sq_dists(&mut geometry, TOLERANCE, MAXZOOM);
        simplify(&mut geometry, TOLERANCE, 0, MAXZOOM);
        let VectorGeometry::Polygon(g) = &geometry else {
            unreachable!()
        };
        let outer: Vec<_> = g.coordinates[0].iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(outer, vec![(0.25, 0.25), (0.75, 0.25), (0.75, 0.75), (0.25, 0.75)]);
        let hole: Vec<_> = g.coordinates[1].iter().map(|p| (p.x, p.y, p.t)).collect();
        assert_eq!(
            hole,
            vec![
                (0.5, 0.5, Some(1.0)),
                (0.75, 0.5, Some(0.03125)),
                (0.75, 0.25, Some(0.125)),
                (0.5, 0.25, Some(0.03125)),
                (0.5, 0.5, Some(1.0)),
            ],
            "the hole must be reversed to run opposite to the outer ring"
        );
    }

    #[test]
    fn test_simplify_multi_polygon_matches_polygon() {
        let mut polygon =
            VectorGeometry::Polygon(VectorGeometryBody::new(vec![open_square(), inner_ring()]));
        let mut multi = VectorGeometry::MultiPolygon(VectorGeometryBody::new(vec![vec![
            open_square(),
            inner_ring(),
        ]]));
        for g in [&mut polygon, &mut multi] {
            build_sq_dists(g, TOLERANCE, MAXZOOM);
            simplify(g, TOLERANCE, 0, MAXZOOM);
        }
        let (VectorGeometry::Polygon(p), VectorGeometry::MultiPolygon(mp)) = (&polygon, &multi)
        else {
            unreachable!()
        };
        assert_eq!(mp.coordinates, vec![p.coordinates.clone()]);
    }

    #[test]
    fn test_zero_tolerance_is_identity() {
        let mut geometry =
            VectorGeometry::Polygon(VectorGeometryBody::new(vec![open_square(), inner_ring()]));
        let before = geometry.clone();
        simplify(&mut geometry, 0.0, 3, MAXZOOM);
        assert_eq!(geometry, before);
        simplify(&mut geometry, TOLERANCE, MAXZOOM, MAXZOOM);
        assert_eq!(geometry, before, "zoom at maxzoom keeps everything");
    }

    #[test]
    fn test_collapsed_outer_ring_empties_polygon() {
        let mut geometry =
            VectorGeometry::Polygon(VectorGeometryBody::new(vec![open_square(), inner_ring()]));
        build_sq_dists(&mut geometry, TOLERANCE, MAXZOOM);
        // Only the endpoints (t = 1) clear a tolerance of 0.5 at zoom 0.
        simplify(&mut geometry, 0.5, 0, MAXZOOM);
        assert!(geometry.is_empty());
    }

    #[test]
    fn test_short_line_is_removed() {
        let mut geometry = VectorGeometry::MultiLineString(VectorGeometryBody::new(vec![
            pts(&[(0.0, 0.0), (0.5, 0.0)]),
            pts(&[(0.0, 0.5), (0.5, 0.5)]),
        ]));
        build_sq_dists(&mut geometry, TOLERANCE, MAXZOOM);
        if let VectorGeometry::MultiLineString(g) = &mut geometry {
            g.coordinates[1][1].t = None;
        }
        simplify(&mut geometry, TOLERANCE, 2, MAXZOOM);
        let VectorGeometry::MultiLineString(g) = &geometry else {
            unreachable!()
        };
        assert_eq!(g.coordinates.len(), 1, "a line left with one vertex is dropped");
    }

    #[test]
    fn test_rewind_orients_outer_clockwise() {
        let mut ring = pts(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]);
        let original = ring.clone();
        rewind(&mut ring, true);
        assert_eq!(ring[1], original[3], "counter-clockwise outer ring must be reversed");
        let once = ring.clone();
        rewind(&mut ring, true);
        assert_eq!(ring, once, "rewinding twice is a no-op");

        let mut tiny = pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]);
        rewind(&mut tiny, false);
        assert_eq!(tiny[1].x, 1.0);
    }

    #[test]
    fn test_sq_seg_dist() {
        assert_eq!(sq_seg_dist(0.0, 1.0, -1.0, 0.0, 1.0, 0.0), 1.0);
        assert_eq!(sq_seg_dist(3.0, 0.0, -1.0, 0.0, 1.0, 0.0), 4.0);
        assert_eq!(sq_seg_dist(1.0, 1.0, 0.0, 0.0, 0.0, 0.0), 2.0);
    }
}
