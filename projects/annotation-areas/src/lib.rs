//! Geometric area metrics for annotated image datasets.
//!
//! Computes bounding-box areas and polygon (segmentation) surface areas
//! for every annotation in a dataset field, storing both a normalized
//! value (fraction of the image area) and an absolute value (pixel²)
//! back onto each annotation. Segmentation masks are vectorized into
//! polylines first when needed.

pub mod annotations;
pub mod dataset;
pub mod error;
pub mod pipeline;
pub mod report;

pub use dataset::Dataset;
pub use error::AreaError;
pub use pipeline::orchestrator::compute_areas;
pub use pipeline::types::{AreaMode, ComputeOptions, MeasurePolicy, RunSummary};
