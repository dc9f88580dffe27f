use crate::annotations::{BBox, Point};
use crate::error::AreaError;

/// Scale normalized vertices into pixel coordinates.
pub fn scale_to_pixels(points: &[Point], width: u32, height: u32) -> Vec<Point> {
    let (w, h) = (f64::from(width), f64::from(height));
    points
        .iter()
        .map(|p| Point {
            x: p.x * w,
            y: p.y * h,
        })
        .collect()
}

/// Surface area in pixel² of a closed polygon ring given as normalized
/// vertices, via the shoelace formula.
///
/// Vertices are scaled by the image dimensions, then the cross terms of
/// consecutive vertex pairs are summed with index -1 wrapping to the last
/// vertex. The absolute value makes the result independent of winding
/// direction. Fewer than 3 vertices is a degenerate polygon and an error,
/// never a silent zero.
pub fn polygon_area(points: &[Point], width: u32, height: u32) -> Result<f64, AreaError> {
    if points.len() < 3 {
        return Err(AreaError::DegenerateGeometry {
            vertices: points.len(),
        });
    }

    let pts = scale_to_pixels(points, width, height);
    let n = pts.len();
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + n - 1) % n;
        sum += pts[i].x * pts[j].y - pts[j].x * pts[i].y;
    }
    Ok(0.5 * sum.abs())
}

/// Relative and absolute area of a normalized bounding box.
///
/// `relative = w * h`, `absolute = relative * width * height`. The box is
/// not range-checked here; a malformed box propagates a deterministic
/// result and validation belongs to the caller.
pub fn bbox_area(bbox: &BBox, width: u32, height: u32) -> (f64, f64) {
    let relative = bbox.w * bbox.h;
    let absolute = relative * f64::from(width) * f64::from(height);
    (relative, absolute)
}
