//! Request-driven tile building.

use std::sync::{Mutex, MutexGuard, PoisonError};

use cubetile_config::TilingConfig;
use cubetile_cubesphere::{CellId, Face};
use cubetile_geometry::{JsonCollection, MValue, Projection, build_sq_dists, convert};
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;

use crate::error::TileError;
use crate::split::split_tile;
use crate::tile::Tile;

/// Tolerances are configured in 1/4096ths of a tile.
const TOLERANCE_EXTENT: f64 = 4096.0;

type TileCache<M> = FxHashMap<CellId, Tile<M>>;

/// Holds the converted input indexed by face and cuts tiles from it on
/// request.
///
/// Face roots are split down to `index_maxzoom` up front. Every split keeps
/// all four children in a cache, so a request only splits below the deepest
/// tile already cached on its path. Cached tiles stay in the face frame; the
/// tile handed out is a transformed copy.
#[derive(Debug)]
pub struct TileBuilder<M = MValue> {
    projection: Projection,
    minzoom: u8,
    maxzoom: u8,
    index_maxzoom: u8,
    tolerance: f64,
    buffer: f64,
    faces: Vec<Face>,
    tiles: Mutex<TileCache<M>>,
}

impl<M: DeserializeOwned + Clone> TileBuilder<M> {
    /// Parses `json` as any supported collection and builds from it.
    pub fn from_json_str(json: &str, config: &TilingConfig) -> Result<Self, TileError> {
        let data = JsonCollection::from_json_str(json)?;
        Self::new(data, config)
    }
}

impl<M: Clone> TileBuilder<M> {
    /// Validates `config`, converts `data`, indexes it by face and splits
    /// each face down to the index zoom.
    ///
    /// Without an explicit projection, `Feature` and `FeatureCollection`
    /// input is tiled in Web Mercator and everything else on the cube
    /// sphere.
    pub fn new(data: JsonCollection<M>, config: &TilingConfig) -> Result<Self, TileError> {
        config.validate()?;

        let projection = config.projection.unwrap_or(if data.is_wm() {
            Projection::WG
        } else {
            Projection::S2
        });
        let tolerance = config.tolerance / TOLERANCE_EXTENT;

        let features = convert(projection, data, config.build_bbox, true)?;
        let feature_count = features.len();

        let mut tiles: TileCache<M> = FxHashMap::default();
        for mut feature in features {
            build_sq_dists(feature.geometry_mut(), tolerance, config.maxzoom);
            let id = CellId::from_face(feature.face());
            tiles
                .entry(id)
                .or_insert_with(|| Tile::new(id))
                .add_feature(feature, None);
        }
        let mut faces: Vec<Face> = tiles.keys().map(|id| id.face()).collect();
        faces.sort();

        let builder = Self {
            projection,
            minzoom: config.minzoom,
            maxzoom: config.maxzoom,
            index_maxzoom: config.index_maxzoom.min(config.maxzoom),
            tolerance,
            buffer: config.buffer,
            faces,
            tiles: Mutex::new(FxHashMap::default()),
        };
        for face in &builder.faces {
            builder.split_from(&mut tiles, CellId::from_face(*face), None);
        }
        let cached = tiles.len();
        *builder.cache() = tiles;

        tracing::info!(
            ?projection,
            features = feature_count,
            faces = builder.faces.len(),
            cached,
            minzoom = config.minzoom,
            maxzoom = config.maxzoom,
            "tile builder ready"
        );
        Ok(builder)
    }

    #[must_use]
    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Faces holding at least one feature, in face order.
    #[must_use]
    pub fn faces(&self) -> Vec<Face> {
        self.faces.clone()
    }

    /// Number of untransformed tiles held in the cache, face roots included.
    #[must_use]
    pub fn cached_tiles(&self) -> usize {
        self.cache().len()
    }

    /// Builds the tile for `id`, simplified and in tile-local coordinates.
    ///
    /// Returns `None` when the zoom is outside the configured range, the
    /// face holds no data, or nothing reaches the tile.
    #[must_use]
    pub fn get_tile(&self, id: CellId) -> Option<Tile<M>> {
        let zoom = id.level();
        if zoom < self.minzoom || zoom > self.maxzoom {
            tracing::warn!(%id, zoom, "tile request outside the zoom range");
            return None;
        }

        let mut tiles = self.cache();
        let mut start = id;
        while !tiles.contains_key(&start) {
            if start.is_face() {
                return None;
            }
            start = start.parent(None);
        }
        if start != id {
            self.split_from(&mut tiles, start, Some(id));
        }
        let mut tile = tiles.get(&id)?.clone();
        drop(tiles);

        tile.transform(self.tolerance, self.maxzoom);
        if tile.is_empty() { None } else { Some(tile) }
    }

    /// Splits from `start` and caches every child. Without a `target` the
    /// whole subtree is split down to the index zoom; with one, only the
    /// path toward it. Empty tiles and tiles at `maxzoom` are never split.
    fn split_from(&self, tiles: &mut TileCache<M>, start: CellId, target: Option<CellId>) {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(tile) = tiles.get(&id) else {
                continue;
            };
            if tile.is_empty() || tile.zoom >= self.maxzoom {
                continue;
            }
            let done = match target {
                None => tile.zoom >= self.index_maxzoom,
                Some(target) => tile.zoom >= target.level() || !id.contains(target),
            };
            if done {
                continue;
            }
            for child in split_tile(tile, self.buffer) {
                stack.push(child.id);
                tiles.insert(child.id, child.tile);
            }
        }
    }

    fn cache(&self) -> MutexGuard<'_, TileCache<M>> {
        // a panic mid-split leaves only whole tiles behind
        self.tiles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::DEFAULT_LAYER;
    use cubetile_config::ConfigError;
    use cubetile_geometry::{GeometryError, VectorGeometry};

    const POINT_AT_ORIGIN: &str = r#"{
        "type": "Feature",
        "properties": { "name": "null island" },
        "geometry": { "type": "Point", "coordinates": [0, 0] }
    }"#;

    fn builder(json: &str, config: &TilingConfig) -> TileBuilder {
        TileBuilder::from_json_str(json, config).unwrap()
    }

    fn only_point(tile: &Tile) -> (f64, f64) {
        let layer = tile.layer(DEFAULT_LAYER).expect("default layer");
        assert_eq!(layer.len(), 1);
        let VectorGeometry::Point(g) = layer.features[0].geometry() else {
            panic!("expected Point");
        };
        (g.coordinates.x, g.coordinates.y)
    }

    #[test]
    fn test_geojson_defaults_to_web_mercator() {
        let b = builder(POINT_AT_ORIGIN, &TilingConfig::default());
        assert_eq!(b.projection(), Projection::WG);
        assert_eq!(b.faces(), vec![Face::PosX]);

        let tile = b.get_tile(CellId::from_face(Face::PosX)).expect("root tile");
        assert_eq!(only_point(&tile), (0.5, 0.5));
        assert!(tile.is_transformed());
    }

    #[test]
    fn test_get_tile_descends_to_the_child() {
        let b = builder(POINT_AT_ORIGIN, &TilingConfig::default());
        let [bl, _, _, tr] = CellId::children_ij(Face::PosX, 0, 0, 0);

        let tile = b.get_tile(tr).expect("the origin sits in the upper right child");
        assert_eq!(tile.id(), tr);
        assert_eq!(only_point(&tile), (0.0, 0.0));
        assert!(b.get_tile(bl).is_none(), "nothing reaches the lower left child");

        let deep = CellId::children_ij(Face::PosX, 4, 8, 8)[0];
        let tile = b.get_tile(deep).expect("zoom 5 tile at the origin");
        assert_eq!(tile.zoom, 5);
        assert_eq!(only_point(&tile), (0.0, 0.0));
    }

    #[test]
    fn test_requests_do_not_share_state() {
        let b = builder(POINT_AT_ORIGIN, &TilingConfig::default());
        let tr = CellId::children_ij(Face::PosX, 0, 0, 0)[3];
        let first = b.get_tile(tr);
        let _ = b.get_tile(CellId::from_face(Face::PosX));
        assert_eq!(b.get_tile(tr), first, "handing out a tile must not transform the cache");
    }

    #[test]
    fn test_second_request_reuses_cached_tiles() {
        let b = builder(POINT_AT_ORIGIN, &TilingConfig::default());
        // the root plus four children for each of the zoom 0..3 splits
        assert_eq!(b.cached_tiles(), 17, "faces are indexed down to zoom 4");

        let deep = CellId::children_ij(Face::PosX, 5, 16, 16)[0];
        let first = b.get_tile(deep).expect("zoom 6 tile at the origin");
        assert_eq!(b.cached_tiles(), 25, "two more splits below the index");

        let second = b.get_tile(deep);
        assert_eq!(b.cached_tiles(), 25, "the second request splits nothing");
        assert_eq!(second, Some(first));
    }

    #[test]
    fn test_index_stops_at_maxzoom() {
        let config = TilingConfig {
            maxzoom: 2,
            index_maxzoom: 4,
            ..TilingConfig::default()
        };
        let b = builder(POINT_AT_ORIGIN, &config);
        assert_eq!(b.cached_tiles(), 9, "only the zoom 0 and 1 tiles are split");

        let config = TilingConfig {
            index_maxzoom: 0,
            ..TilingConfig::default()
        };
        let b = builder(POINT_AT_ORIGIN, &config);
        assert_eq!(b.cached_tiles(), 1, "only the face root before any request");
        let tr = CellId::children_ij(Face::PosX, 0, 0, 0)[3];
        assert!(b.get_tile(tr).is_some());
        assert_eq!(b.cached_tiles(), 5);
    }

    #[test]
    fn test_zoom_range_and_empty_faces() {
        let config = TilingConfig {
            minzoom: 1,
            maxzoom: 4,
            ..TilingConfig::default()
        };
        let b = builder(POINT_AT_ORIGIN, &config);
        assert!(b.get_tile(CellId::from_face(Face::PosX)).is_none(), "below minzoom");
        let too_deep = CellId::children_ij(Face::PosX, 4, 8, 8)[0];
        assert!(b.get_tile(too_deep).is_none(), "above maxzoom");
        let other_face = CellId::children_ij(Face::PosY, 0, 0, 0)[0];
        assert!(b.get_tile(other_face).is_none(), "face without data");
    }

    #[test]
    fn test_s2_input_keeps_its_face() {
        let json = r#"{
            "type": "S2Feature",
            "face": 2,
            "properties": {},
            "metadata": { "layer": "cities" },
            "geometry": { "type": "Point", "is3D": false, "coordinates": { "x": 0.25, "y": 0.75 } }
        }"#;
        let b = builder(json, &TilingConfig::default());
        assert_eq!(b.projection(), Projection::S2);
        assert_eq!(b.faces(), vec![Face::PosZ]);

        let tl = CellId::children_ij(Face::PosZ, 0, 0, 0)[2];
        let tile = b.get_tile(tl).expect("top left tile");
        assert_eq!(tile.layer("cities").map(|l| l.len()), Some(1));
    }

    #[test]
    fn test_explicit_projection_splits_geojson_by_face() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": {}, "geometry": { "type": "Point", "coordinates": [0, 0] } },
                { "type": "Feature", "properties": {}, "geometry": { "type": "Point", "coordinates": [0, 90] } }
            ]
        }"#;
        let config = TilingConfig {
            projection: Some(Projection::S2),
            ..TilingConfig::default()
        };
        let b = builder(json, &config);
        assert_eq!(b.faces(), vec![Face::PosX, Face::PosZ]);
        assert!(b.get_tile(CellId::from_face(Face::PosZ)).is_some());
    }

    #[test]
    fn test_simplified_polygon_survives() {
        let json = r#"{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[-40, -40], [40, -40], [40, 40], [-40, 40], [-40, -40]]]
            }
        }"#;
        let b = builder(json, &TilingConfig::default());
        let root = b.get_tile(CellId::from_face(Face::PosX)).expect("root tile");
        let VectorGeometry::Polygon(g) = root.layers[DEFAULT_LAYER].features[0].geometry() else {
            panic!("expected Polygon");
        };
        assert_eq!(g.coordinates[0].len(), 5, "a square keeps its corners");

        let bl = CellId::children_ij(Face::PosX, 0, 0, 0)[0];
        assert!(b.get_tile(bl).is_some(), "each quadrant holds a corner of the square");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TilingConfig {
            minzoom: 6,
            maxzoom: 5,
            ..TilingConfig::default()
        };
        let err = TileBuilder::<MValue>::from_json_str(POINT_AT_ORIGIN, &config).unwrap_err();
        assert!(
            matches!(err, TileError::Config(ConfigError::Invalid(_))),
            "got {err:?}"
        );
    }

    #[test]
    fn test_unknown_input_type_is_rejected() {
        let json = r#"{ "type": "GeometryCollection", "geometries": [] }"#;
        let err = TileBuilder::<MValue>::from_json_str(json, &TilingConfig::default()).unwrap_err();
        assert!(
            matches!(err, TileError::Geometry(GeometryError::Json(_))),
            "got {err:?}"
        );
    }
}
