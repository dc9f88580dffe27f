// Annotation record definitions
//
// This module contains the struct definitions for annotations that are
// persisted as part of a dataset's JSON document.

use serde::{Deserialize, Serialize};

use crate::error::AreaError;

/// A 2D point in normalized coordinates [0, 1]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Normalized bounding box, (x, y) is the top-left corner
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl BBox {
    /// Map box-relative fractions into image-normalized coordinates.
    pub fn project(&self, fx: f64, fy: f64) -> Point {
        Point {
            x: self.x + fx * self.w,
            y: self.y + fy * self.h,
        }
    }
}

/// Image dimensions in pixels, required for absolute-area math
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
}

/// Run-length encoded binary instance mask covering a detection's
/// bounding box. Row-major; runs alternate background/foreground
/// starting with background.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    pub width: u32,
    pub height: u32,
    pub counts: Vec<u32>,
}

impl Mask {
    /// Decode to a row-major bitmap of 0/255 bytes of length `width * height`.
    pub fn decode(&self) -> Result<Vec<u8>, AreaError> {
        let expected = (self.width as usize) * (self.height as usize);
        let total: usize = self.counts.iter().map(|&c| c as usize).sum();
        if total != expected {
            return Err(AreaError::MalformedMask {
                expected,
                actual: total,
            });
        }

        let mut bitmap = vec![0u8; expected];
        let mut idx = 0usize;
        let mut value = 0u8;
        for &count in &self.counts {
            let end = idx + count as usize;
            bitmap[idx..end].fill(value);
            idx = end;
            value = 255 - value;
        }
        Ok(bitmap)
    }

    /// Encode a row-major bitmap (zero = background) into run lengths.
    pub fn from_bitmap(width: u32, height: u32, bitmap: &[u8]) -> Self {
        let mut counts = Vec::new();
        let mut previous = 0u8;
        let mut run = 0u32;
        for &byte in bitmap {
            let value = u8::from(byte != 0);
            if value != previous {
                counts.push(run);
                run = 0;
                previous = value;
            }
            run += 1;
        }
        counts.push(run);
        Mask {
            width,
            height,
            counts,
        }
    }
}

/// One bounding-box annotation, optionally carrying an instance mask.
///
/// `relative_bbox_area` and `absolute_bbox_area` are absent until a
/// bbox-area computation writes them.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Detection {
    pub label: String,
    pub bounding_box: BBox,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<Mask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_bbox_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute_bbox_area: Option<f64>,
}

/// One polyline annotation: one or more vertex contours in normalized
/// coordinates. `closed` means the last vertex connects back to the first;
/// `filled` means the enclosed region is the region of interest.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Polyline {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub points: Vec<Vec<Point>>,
    pub closed: bool,
    pub filled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_surface_area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute_surface_area: Option<f64>,
}

/// Container for all detections of one sample under one field
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Detections {
    pub detections: Vec<Detection>,
}

/// Container for all polylines of one sample under one field
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Polylines {
    pub polylines: Vec<Polyline>,
}

/// The value of a named annotation field on a sample.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnotationField {
    Detections(Detections),
    Polylines(Polylines),
}

/// The schema kind of an annotation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Detections,
    Polylines,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Detections => "detections",
            FieldKind::Polylines => "polylines",
        }
    }
}

impl AnnotationField {
    pub fn kind(&self) -> FieldKind {
        match self {
            AnnotationField::Detections(_) => FieldKind::Detections,
            AnnotationField::Polylines(_) => FieldKind::Polylines,
        }
    }
}
