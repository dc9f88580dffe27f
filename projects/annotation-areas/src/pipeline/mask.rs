// Segmentation mask vectorization.
//
// Raster instance masks are turned into polyline annotations via border
// following. The contour primitive itself comes from imageproc; this module
// owns the decoding, the outer-contour selection, and the mapping of mask
// grid coordinates into image-normalized coordinates through the
// detection's bounding box.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

use crate::annotations::{Detection, Point, Polyline, Polylines};
use crate::dataset::Sample;
use crate::error::AreaError;

/// Capability of an annotation to vectorize itself into a polyline.
///
/// The converter depends only on this trait, not on any concrete mask
/// representation.
pub trait ToPolyline {
    fn to_polyline(&self) -> Result<Polyline, AreaError>;
}

impl ToPolyline for Detection {
    /// Trace the outer border of the instance mask and map its vertices
    /// into image-normalized coordinates.
    ///
    /// Only the first outer contour is kept; holes and further fragments
    /// are dropped. The resulting polyline is closed and filled.
    fn to_polyline(&self) -> Result<Polyline, AreaError> {
        let mask = self
            .mask
            .as_ref()
            .ok_or_else(|| AreaError::MissingMask(self.label.clone()))?;

        let bitmap = mask.decode()?;
        let image = GrayImage::from_raw(mask.width, mask.height, bitmap).ok_or(
            AreaError::MalformedMask {
                expected: (mask.width as usize) * (mask.height as usize),
                actual: 0,
            },
        )?;

        let contours = find_contours::<u32>(&image);
        let outer = contours
            .iter()
            .find(|c| matches!(c.border_type, BorderType::Outer))
            .or_else(|| contours.first());

        let points: Vec<Point> = match outer {
            Some(contour) => contour
                .points
                .iter()
                .map(|p| {
                    self.bounding_box.project(
                        f64::from(p.x) / f64::from(mask.width),
                        f64::from(p.y) / f64::from(mask.height),
                    )
                })
                .collect(),
            None => Vec::new(),
        };

        Ok(Polyline {
            label: Some(self.label.clone()),
            points: vec![points],
            closed: true,
            filled: true,
            relative_surface_area: None,
            absolute_surface_area: None,
        })
    }
}

/// Convert the masks of every detection under `field` into polylines.
///
/// Returns one container per sample in input order; samples without the
/// field or without detections get an empty container rather than being
/// dropped, so the result stays aligned with the sample order for the
/// write-back. Detections whose masks are absent or malformed are skipped
/// with a warning.
pub fn convert_masks_to_polylines(samples: &[Sample], field: &str) -> Vec<Polylines> {
    samples
        .iter()
        .map(|sample| {
            let mut polylines = Vec::new();
            if let Some(container) = sample.detections(field) {
                for detection in &container.detections {
                    match detection.to_polyline() {
                        Ok(polyline) => polylines.push(polyline),
                        Err(e) => {
                            tracing::warn!("sample {}: skipping detection: {}", sample.id, e);
                        }
                    }
                }
            }
            Polylines { polylines }
        })
        .collect()
}
