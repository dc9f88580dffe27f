use thiserror::Error;

/// Errors raised by the area-computation pipeline and the dataset store.
///
/// Validation errors (`InvalidMode`, `InvalidPolicy`, `MissingField`,
/// `FieldType`) are fatal and raised before any mutation. Data-quality
/// problems on individual samples are not errors; they are collected as
/// [`SkipReason`](crate::pipeline::types::SkipReason) entries in the run
/// summary so one malformed sample cannot fail a whole batch.
#[derive(Debug, Error)]
pub enum AreaError {
    #[error("unknown computation mode '{0}', expected 'bbox_area' or 'surface_area'")]
    InvalidMode(String),

    #[error("unknown measure policy '{0}', expected 'first_contour', 'sum_contours' or 'all_polylines'")]
    InvalidPolicy(String),

    #[error("field '{0}' does not exist on the dataset")]
    MissingField(String),

    #[error("field '{field}' does not hold {expected}")]
    FieldType { field: String, expected: &'static str },

    #[error("polygon has {vertices} vertices, at least 3 required")]
    DegenerateGeometry { vertices: usize },

    #[error("value count mismatch: expected {expected}, got {actual}")]
    Misaligned { expected: usize, actual: usize },

    #[error("no writable attribute '{0}' on detections")]
    UnknownAttribute(String),

    #[error("detection '{0}' has no segmentation mask")]
    MissingMask(String),

    #[error("mask runs cover {actual} pixels, expected {expected}")]
    MalformedMask { expected: usize, actual: usize },

    #[error("dataset has no backing file, use save_to")]
    NoBackingFile,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse dataset document: {0}")]
    Json(#[from] serde_json::Error),
}
