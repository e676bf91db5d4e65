//! Splitting a tile into its four children.

use cubetile_cubesphere::CellId;
use cubetile_geometry::{Axis, MValue, clip_features};

use crate::tile::Tile;

/// A child produced by [`split_tile`].
#[derive(Clone, Debug, PartialEq)]
pub struct TileChild<M = MValue> {
    pub id: CellId,
    pub tile: Tile<M>,
}

/// Clips every layer of `tile` into its four children, returned
/// bottom-left, bottom-right, top-left, top-right. `buffer` is a fraction
/// of the parent tile and only widens the window for lines and polygons.
///
/// The parent is left untouched, so it must be split before it is
/// transformed.
#[must_use]
pub fn split_tile<M: Clone>(tile: &Tile<M>, buffer: f64) -> [TileChild<M>; 4] {
    let (face, zoom, i, j) = (tile.face, tile.zoom, tile.i, tile.j);
    let ids = CellId::children_ij(face, zoom, i, j);
    let mut children = ids.map(|id| TileChild {
        id,
        tile: Tile::new(id),
    });

    let scale = f64::from(1u32 << zoom);
    let (i, j) = (f64::from(i), f64::from(j));

    for (name, layer) in &tile.layers {
        let features = &layer.features;
        let halves = [
            clip_features(features, scale, i, i + 0.5, Axis::X, buffer),
            clip_features(features, scale, i + 0.5, i + 1.0, Axis::X, buffer),
        ];
        for (column, half) in halves.iter().enumerate() {
            let Some(half) = half else {
                continue;
            };
            let bottom = clip_features(half, scale, j, j + 0.5, Axis::Y, buffer);
            let top = clip_features(half, scale, j + 0.5, j + 1.0, Axis::Y, buffer);
            // bottom row is 0..2, top row 2..4
            for (row, quadrant) in [bottom, top].into_iter().enumerate() {
                for feature in quadrant.into_iter().flatten() {
                    children[row * 2 + column].tile.add_feature(feature, Some(name.as_str()));
                }
            }
        }
    }

    tracing::debug!(
        parent = %tile.id,
        zoom,
        features = children.iter().map(|c| c.tile.feature_count()).sum::<usize>(),
        "split tile"
    );
    children
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{DEFAULT_LAYER, Layer};
    use cubetile_cubesphere::Face;
    use cubetile_geometry::{
        Properties, S2Feature, VectorFeatures, VectorGeometry, VectorGeometryBody, VectorPoint,
    };

    fn s2(geometry: VectorGeometry) -> VectorFeatures {
        VectorFeatures::S2Feature(S2Feature {
            id: None,
            face: Face::PosX,
            properties: Properties::new(),
            geometry,
            metadata: None,
        })
    }

    fn point(x: f64, y: f64) -> VectorFeatures {
        s2(VectorGeometry::Point(VectorGeometryBody::new(VectorPoint::new(x, y))))
    }

    fn root() -> Tile {
        Tile::new(CellId::from_face(Face::PosX))
    }

    #[test]
    fn test_child_ids_and_order() {
        let children = split_tile(&root(), 0.0625);
        let ids: Vec<u64> = children.iter().map(|c| c.id.0).collect();
        assert_eq!(
            ids,
            vec![
                288230376151711744,
                2017612633061982208,
                864691128455135232,
                1441151880758558720,
            ]
        );
        let ij: Vec<_> = children.iter().map(|c| (c.tile.i, c.tile.j)).collect();
        assert_eq!(ij, vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert!(children.iter().all(|c| c.tile.is_empty()));
    }

    #[test]
    fn test_points_land_in_one_quadrant() {
        let mut tile = root();
        tile.add_feature(point(0.25, 0.25), None);
        tile.add_feature(point(0.75, 0.75), Some("poi"));
        tile.add_feature(point(0.5, 0.5), None);

        let [bl, br, tl, tr] = split_tile(&tile, 0.0625);
        assert_eq!(bl.tile.feature_count(), 1);
        assert_eq!(br.tile.feature_count(), 0);
        assert_eq!(tl.tile.feature_count(), 0);
        assert_eq!(
            tr.tile.feature_count(),
            2,
            "the shared corner belongs to the upper right child only"
        );
        assert_eq!(tr.tile.layer("poi").map(|l| l.len()), Some(1), "layer names carry over");
    }

    #[test]
    fn test_line_crossing_the_middle_is_buffered() {
        let line = vec![VectorPoint::new(0.1, 0.1), VectorPoint::new(0.9, 0.1)];
        let mut tile = root();
        tile.add_feature(s2(VectorGeometry::LineString(VectorGeometryBody::new(line))), None);
        let before = tile.clone();

        let [bl, br, tl, tr] = split_tile(&tile, 0.0625);
        assert_eq!(tile, before, "splitting must not touch the parent");
        assert!(tl.tile.is_empty() && tr.tile.is_empty());

        let xs = |child: &TileChild| -> Vec<f64> {
            let layer = child.tile.layer(DEFAULT_LAYER).expect("default layer");
            let VectorGeometry::MultiLineString(g) = layer.features[0].geometry() else {
                panic!("clipped lines come back as MultiLineString");
            };
            g.coordinates[0].iter().map(|p| p.x).collect()
        };
        // the buffer is measured in parent tiles
        assert_eq!(xs(&bl), vec![0.1, 0.5625]);
        assert_eq!(xs(&br), vec![0.4375, 0.9]);
    }

    #[test]
    fn test_split_below_the_root() {
        let mut tile = root();
        tile.add_feature(point(0.6, 0.1), None);
        let [_, br, _, _] = split_tile(&tile, 0.0625);

        let [bl, br2, tl, tr] = split_tile(&br.tile, 0.0625);
        assert_eq!((br2.tile.zoom, br2.tile.i, br2.tile.j), (2, 3, 0));
        assert_eq!(bl.tile.feature_count(), 1, "0.6 falls in the left half of i = 1");
        assert!(br2.tile.is_empty() && tl.tile.is_empty() && tr.tile.is_empty());
        assert!(br.id.contains(bl.id));
    }

    #[test]
    fn test_split_partitions_points_and_clips_polygon() {
        let buffer = 0.0625;
        let mut tile = root();
        let points = [
            (0.25, 0.25),
            (0.75, 0.25),
            (0.25, 0.75),
            (0.75, 0.75),
            (0.5, 0.5),
            (0.5, 0.1),
            (0.1, 0.5),
        ];
        for (x, y) in points {
            tile.add_feature(point(x, y), Some("poi"));
        }
        let ring = [(0.2, 0.2), (0.8, 0.2), (0.8, 0.8), (0.2, 0.8), (0.2, 0.2)]
            .map(|(x, y)| VectorPoint::new(x, y))
            .to_vec();
        let square = VectorGeometry::Polygon(VectorGeometryBody::new(vec![ring]));
        tile.add_feature(s2(square), Some("area"));

        let children = split_tile(&tile, buffer);
        let counts: Vec<usize> = children
            .iter()
            .map(|c| c.tile.layer("poi").map_or(0, Layer::len))
            .collect();
        assert_eq!(counts.iter().sum::<usize>(), points.len(), "every point lands exactly once");
        // edge points fall to the right and upper side
        assert_eq!(counts, vec![1, 2, 2, 2]);

        for (k, child) in children.iter().enumerate() {
            let (column, row) = ((k % 2) as f64, (k / 2) as f64);
            let layer = child.tile.layer("area").expect("the square reaches every child");
            assert_eq!(layer.len(), 1);
            let VectorGeometry::Polygon(g) = layer.features[0].geometry() else {
                panic!("clipped polygons stay Polygon");
            };
            assert!(!g.coordinates[0].is_empty());
            layer.features[0].geometry().for_each_point(|p| {
                assert!(
                    p.x >= column / 2.0 - buffer && p.x <= (column + 1.0) / 2.0 + buffer,
                    "x {} escapes child {k}",
                    p.x
                );
                assert!(
                    p.y >= row / 2.0 - buffer && p.y <= (row + 1.0) / 2.0 + buffer,
                    "y {} escapes child {k}",
                    p.y
                );
            });
        }
    }
}
