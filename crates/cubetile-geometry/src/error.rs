use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    /// Malformed JSON or an unrecognised `type` discriminant.
    #[error("failed to decode geometry: {0}")]
    Json(#[from] serde_json::Error),
    #[error("m-value count {found} does not match coordinate count {expected}")]
    MValueMismatch { expected: usize, found: usize },
    #[error("bounding box must have 4 or 6 values, got {0}")]
    BBoxLength(usize),
}
