//! Feature wrappers around geometries and the top-level collections the
//! tiler accepts as input.

use cubetile_cubesphere::Face;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bbox::BBox;
use crate::error::GeometryError;
use crate::geojson::Geometry;
use crate::point::{MValue, Properties};
use crate::vector::VectorGeometry;

/// A GeoJSON feature in lon/lat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Feature<M = MValue> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub properties: Properties,
    pub geometry: Geometry<M>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// A feature whose geometry is already in vector form, in lon/lat or
/// unit-scale Web Mercator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorFeature<M = MValue> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub properties: Properties,
    pub geometry: VectorGeometry<M>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// A feature living on a single cube face, with geometry in face ST.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct S2Feature<M = MValue> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub face: Face,
    #[serde(default)]
    pub properties: Properties,
    pub geometry: VectorGeometry<M>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Members of a [`FeatureCollection`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WmFeature<M = MValue> {
    Feature(Feature<M>),
    VectorFeature(VectorFeature<M>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection<M = MValue> {
    pub features: Vec<WmFeature<M>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct S2FeatureCollection<M = MValue> {
    pub features: Vec<S2Feature<M>>,
    /// Faces that carry at least one feature.
    #[serde(default)]
    pub faces: Vec<Face>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
}

/// Any input the tiler can ingest, discriminated by its `type` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JsonCollection<M = MValue> {
    FeatureCollection(FeatureCollection<M>),
    Feature(Feature<M>),
    VectorFeature(VectorFeature<M>),
    S2FeatureCollection(S2FeatureCollection<M>),
    S2Feature(S2Feature<M>),
}

impl<M: DeserializeOwned> JsonCollection<M> {
    /// Parses a collection from JSON text. An unknown `type` at any level
    /// is an error rather than a silently dropped feature.
    pub fn from_json_str(json: &str) -> Result<Self, GeometryError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<M> JsonCollection<M> {
    /// True for the lon/lat inputs that default to the Web Mercator
    /// projection.
    #[must_use]
    pub fn is_wm(&self) -> bool {
        matches!(self, JsonCollection::Feature(_) | JsonCollection::FeatureCollection(_))
    }
}

/// A feature ready for tiling: either planar Web Mercator or on one face.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VectorFeatures<M = MValue> {
    VectorFeature(VectorFeature<M>),
    S2Feature(S2Feature<M>),
}

impl<M> VectorFeatures<M> {
    /// The face this feature belongs to. Planar features are indexed under
    /// face 0.
    #[must_use]
    pub fn face(&self) -> Face {
        match self {
            VectorFeatures::VectorFeature(_) => Face::PosX,
            VectorFeatures::S2Feature(f) => f.face,
        }
    }

    #[must_use]
    pub fn geometry(&self) -> &VectorGeometry<M> {
        match self {
            VectorFeatures::VectorFeature(f) => &f.geometry,
            VectorFeatures::S2Feature(f) => &f.geometry,
        }
    }

    pub fn geometry_mut(&mut self) -> &mut VectorGeometry<M> {
        match self {
            VectorFeatures::VectorFeature(f) => &mut f.geometry,
            VectorFeatures::S2Feature(f) => &mut f.geometry,
        }
    }

    #[must_use]
    pub fn metadata(&self) -> Option<&Value> {
        match self {
            VectorFeatures::VectorFeature(f) => f.metadata.as_ref(),
            VectorFeatures::S2Feature(f) => f.metadata.as_ref(),
        }
    }

    #[must_use]
    pub fn properties(&self) -> &Properties {
        match self {
            VectorFeatures::VectorFeature(f) => &f.properties,
            VectorFeatures::S2Feature(f) => &f.properties,
        }
    }

    /// The same feature carrying `geometry` instead.
    #[must_use]
    pub fn with_geometry(&self, geometry: VectorGeometry<M>) -> Self {
        match self {
            VectorFeatures::VectorFeature(f) => VectorFeatures::VectorFeature(VectorFeature {
                id: f.id,
                properties: f.properties.clone(),
                geometry,
                metadata: f.metadata.clone(),
            }),
            VectorFeatures::S2Feature(f) => VectorFeatures::S2Feature(S2Feature {
                id: f.id,
                face: f.face,
                properties: f.properties.clone(),
                geometry,
                metadata: f.metadata.clone(),
            }),
        }
    }
}
