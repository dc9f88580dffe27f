use std::fmt;

use serde::Serialize;

use crate::annotations::Point;
use crate::error::AreaError;

/// Which metric to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaMode {
    BboxArea,
    SurfaceArea,
}

impl AreaMode {
    /// Parse one of the two literal mode strings, case-sensitively.
    pub fn parse(s: &str) -> Result<Self, AreaError> {
        match s {
            "bbox_area" => Ok(AreaMode::BboxArea),
            "surface_area" => Ok(AreaMode::SurfaceArea),
            _ => Err(AreaError::InvalidMode(s.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AreaMode::BboxArea => "bbox_area",
            AreaMode::SurfaceArea => "surface_area",
        }
    }
}

/// Which contours contribute to a polyline's surface area.
///
/// `FirstContour` reproduces the historical behavior exactly: only the
/// first contour of the first polyline per sample is measured, and the
/// rest of the sample's geometry is ignored. The other policies exist
/// because that behavior silently drops multi-instance and multi-contour
/// geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeasurePolicy {
    /// First contour of the first polyline per sample.
    #[default]
    FirstContour,
    /// Sum of all contours of the first polyline per sample.
    SumContours,
    /// Every polyline gets attributes from the sum of its own contours.
    AllPolylines,
}

impl MeasurePolicy {
    pub fn parse(s: &str) -> Result<Self, AreaError> {
        match s {
            "first_contour" => Ok(MeasurePolicy::FirstContour),
            "sum_contours" => Ok(MeasurePolicy::SumContours),
            "all_polylines" => Ok(MeasurePolicy::AllPolylines),
            _ => Err(AreaError::InvalidPolicy(s.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MeasurePolicy::FirstContour => "first_contour",
            MeasurePolicy::SumContours => "sum_contours",
            MeasurePolicy::AllPolylines => "all_polylines",
        }
    }
}

/// Tuning for a computation run.
#[derive(Debug, Clone)]
pub struct ComputeOptions {
    pub policy: MeasurePolicy,
    /// Worker threads for the surface-area pass. 1 runs inline; any value
    /// produces identical results.
    pub workers: usize,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        ComputeOptions {
            policy: MeasurePolicy::default(),
            workers: 1,
        }
    }
}

/// One unit of surface-area work: the contours of one polyline together
/// with the image dimensions needed to scale them.
#[derive(Debug, Clone)]
pub(crate) struct SurfaceTask {
    pub sample_index: usize,
    pub polyline_index: usize,
    pub contours: Vec<Vec<Point>>,
    pub width: u32,
    pub height: u32,
}

/// Result of one surface task, routed back to its sample by index.
#[derive(Debug, Clone)]
pub(crate) struct SurfaceOutcome {
    pub sample_index: usize,
    pub polyline_index: usize,
    pub result: Result<(f64, f64), SkipReason>,
}

/// Why a sample was skipped during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Image width/height absent or zero; absolute areas and
    /// normalization are impossible.
    MissingMetadata,
    /// The measured contour had fewer than 3 vertices.
    DegenerateGeometry { vertices: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingMetadata => write!(f, "missing image metadata"),
            SkipReason::DegenerateGeometry { vertices } => {
                write!(f, "degenerate contour with {vertices} vertices")
            }
        }
    }
}

/// A skipped sample and the reason it was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct SampleSkip {
    pub sample_id: String,
    pub reason: SkipReason,
}

/// One computed area, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct AreaRecord {
    pub sample_id: String,
    pub annotation_index: usize,
    pub relative: f64,
    pub absolute: f64,
}

/// What a computation run did: counts, skip reasons, written key paths,
/// and the computed areas themselves.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mode: String,
    pub field: String,
    pub samples_processed: usize,
    pub samples_empty: usize,
    pub skipped: Vec<SampleSkip>,
    pub fields_written: Vec<String>,
    pub areas: Vec<AreaRecord>,
}

impl RunSummary {
    pub(crate) fn new(mode: AreaMode, field: &str) -> Self {
        RunSummary {
            mode: mode.as_str().to_string(),
            field: field.to_string(),
            samples_processed: 0,
            samples_empty: 0,
            skipped: Vec::new(),
            fields_written: Vec::new(),
            areas: Vec::new(),
        }
    }
}
