//! Tiles and their named feature layers.

use cubetile_cubesphere::{CellId, Face};
use cubetile_geometry::{MValue, VectorFeatures, VectorGeometry, simplify};
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;

/// Layer used when a feature names none.
pub const DEFAULT_LAYER: &str = "default";

/// A named list of features sharing one tile.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Layer<M = MValue> {
    pub name: String,
    /// Coordinate extent of the layer. Tile-local coordinates span `[0, extent]`.
    pub extent: u32,
    pub features: Vec<VectorFeatures<M>>,
}

impl<M> Layer<M> {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extent: 1,
            features: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// One cell of the subdivision holding the features that reach it.
///
/// Until [`transform`](Tile::transform) runs, geometry stays in the face (or
/// unit Web Mercator) frame so the tile can still be split. Afterwards it is
/// simplified for this zoom and expressed relative to the tile.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Tile<M = MValue> {
    pub id: CellId,
    pub face: Face,
    pub zoom: u8,
    pub i: u32,
    pub j: u32,
    pub layers: FxHashMap<String, Layer<M>>,
    #[serde(skip)]
    transformed: bool,
}

impl<M> Tile<M> {
    #[must_use]
    pub fn new(id: CellId) -> Self {
        let (face, zoom, i, j) = id.to_face_ij();
        Self {
            id,
            face,
            zoom,
            i,
            j,
            layers: FxHashMap::default(),
            transformed: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> CellId {
        self.id
    }

    #[must_use]
    pub fn is_transformed(&self) -> bool {
        self.transformed
    }

    /// True when no layer holds a feature.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.values().all(Layer::is_empty)
    }

    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&Layer<M>> {
        self.layers.get(name)
    }

    /// Total features over all layers.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.layers.values().map(Layer::len).sum()
    }

    /// Stores `feature` in the layer named by its `metadata.layer`, else in
    /// `layer`, else in [`DEFAULT_LAYER`].
    pub fn add_feature(&mut self, feature: VectorFeatures<M>, layer: Option<&str>) {
        let name = feature
            .metadata()
            .and_then(|m| m.get("layer"))
            .and_then(Value::as_str)
            .or(layer)
            .unwrap_or(DEFAULT_LAYER)
            .to_string();
        self.layers
            .entry(name)
            .or_insert_with_key(|name| Layer::new(name.clone()))
            .features
            .push(feature);
    }
}

impl<M: Clone> Tile<M> {
    /// Simplifies every feature for this zoom and moves it into tile-local
    /// coordinates (`x * 2^zoom - i`). Lines and polygons left with no
    /// coordinates are dropped. Only the first call has an effect; split the
    /// tile before calling this.
    pub fn transform(&mut self, tolerance: f64, maxzoom: u8) {
        if self.transformed {
            return;
        }
        let (zoom, i, j) = (self.zoom, self.i, self.j);
        for layer in self.layers.values_mut() {
            for feature in &mut layer.features {
                let geometry = feature.geometry_mut();
                if tolerance > 0.0 {
                    simplify(geometry, tolerance, zoom, maxzoom);
                }
                transform_geometry(geometry, zoom, i, j);
            }
            layer.features.retain(|f| !f.geometry().is_empty());
        }
        self.transformed = true;
    }
}

fn transform_geometry<M>(geometry: &mut VectorGeometry<M>, zoom: u8, i: u32, j: u32) {
    let scale = f64::from(1u32 << zoom);
    let (ti, tj) = (f64::from(i), f64::from(j));
    geometry.for_each_point_mut(|p| {
        p.x = p.x * scale - ti;
        p.y = p.y * scale - tj;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubetile_geometry::{
        Properties, S2Feature, VectorFeature, VectorGeometryBody, VectorPoint,
    };
    use serde_json::json;

    fn point_feature(x: f64, y: f64, metadata: Option<Value>) -> VectorFeatures {
        VectorFeatures::VectorFeature(VectorFeature {
            id: None,
            properties: Properties::new(),
            geometry: VectorGeometry::Point(VectorGeometryBody::new(VectorPoint::new(x, y))),
            metadata,
        })
    }

    fn line_feature(points: &[(f64, f64)]) -> VectorFeatures {
        // endpoints as marked by `build_sq_dists`
        let line = points
            .iter()
            .map(|&(x, y)| VectorPoint::new(x, y).with_t(1.0))
            .collect();
        VectorFeatures::S2Feature(S2Feature {
            id: Some(1),
            face: Face::PosX,
            properties: Properties::new(),
            geometry: VectorGeometry::LineString(VectorGeometryBody::new(line)),
            metadata: None,
        })
    }

    #[test]
    fn test_new_reads_face_ij() {
        let id = CellId::children_ij(Face::NegY, 0, 0, 0)[3];
        let tile: Tile = Tile::new(id);
        assert_eq!(tile.id(), id);
        assert_eq!((tile.face, tile.zoom, tile.i, tile.j), (Face::NegY, 1, 1, 1));
        assert!(tile.is_empty());
        assert!(!tile.is_transformed());
    }

    #[test]
    fn test_add_feature_layer_names() {
        let mut tile: Tile = Tile::new(CellId::from_face(Face::PosX));
        tile.add_feature(point_feature(0.1, 0.1, None), None);
        tile.add_feature(point_feature(0.2, 0.2, None), Some("roads"));
        tile.add_feature(
            point_feature(0.3, 0.3, Some(json!({ "layer": "water" }))),
            Some("roads"),
        );
        tile.add_feature(point_feature(0.4, 0.4, Some(json!({ "layer": 5 }))), None);

        assert_eq!(tile.layer(DEFAULT_LAYER).map(Layer::len), Some(2));
        assert_eq!(tile.layer("roads").map(Layer::len), Some(1));
        assert_eq!(
            tile.layer("water").map(Layer::len),
            Some(1),
            "metadata.layer wins over the given name"
        );
        assert_eq!(tile.feature_count(), 4);
        assert!(!tile.is_empty());
    }

    #[test]
    fn test_transform_to_tile_coordinates() {
        let id = CellId::children_ij(Face::PosX, 0, 0, 0)[1];
        let mut tile: Tile = Tile::new(id);
        assert_eq!((tile.i, tile.j), (1, 0));
        tile.add_feature(point_feature(0.75, 0.25, None), None);
        tile.transform(0.0, 16);

        let feature = &tile.layers[DEFAULT_LAYER].features[0];
        let VectorGeometry::Point(g) = feature.geometry() else {
            panic!("expected Point");
        };
        assert_eq!((g.coordinates.x, g.coordinates.y), (0.5, 0.5));
        assert!(tile.is_transformed());

        tile.transform(0.0, 16);
        let VectorGeometry::Point(g) = tile.layers[DEFAULT_LAYER].features[0].geometry() else {
            panic!("expected Point");
        };
        assert_eq!(g.coordinates.x, 0.5, "a second transform is a no-op");
    }

    #[test]
    fn test_transform_drops_emptied_features() {
        let mut tile: Tile = Tile::new(CellId::from_face(Face::PosX));
        tile.add_feature(line_feature(&[]), None);
        tile.add_feature(line_feature(&[(0.1, 0.1), (0.9, 0.9)]), None);
        tile.add_feature(point_feature(0.5, 0.5, None), None);
        tile.transform(3.0 / 4096.0, 16);

        let layer = &tile.layers[DEFAULT_LAYER];
        assert_eq!(layer.len(), 2, "the empty line goes, the point and live line stay");
        assert!(layer.features.iter().all(|f| !f.geometry().is_empty()));
    }
}
