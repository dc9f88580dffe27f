use crossbeam::channel::{Receiver, Sender};

use crate::pipeline::geometry;
use crate::pipeline::types::{SkipReason, SurfaceOutcome, SurfaceTask};

/// Worker that measures surface tasks until the task channel closes.
///
/// Tasks carry everything they need and outcomes are routed back by
/// sample index, so any number of workers produces the same results.
pub(crate) fn surface_worker(rx: Receiver<SurfaceTask>, tx: Sender<SurfaceOutcome>) {
    for task in rx {
        if tx.send(measure(&task)).is_err() {
            break;
        }
    }
}

/// Measure one task: sum the shoelace areas of its contours and normalize
/// by the image area.
pub(crate) fn measure(task: &SurfaceTask) -> SurfaceOutcome {
    let result = measure_contours(task);
    SurfaceOutcome {
        sample_index: task.sample_index,
        polyline_index: task.polyline_index,
        result,
    }
}

fn measure_contours(task: &SurfaceTask) -> Result<(f64, f64), SkipReason> {
    if task.contours.is_empty() {
        return Err(SkipReason::DegenerateGeometry { vertices: 0 });
    }

    let mut absolute = 0.0;
    for contour in &task.contours {
        match geometry::polygon_area(contour, task.width, task.height) {
            Ok(area) => absolute += area,
            Err(_) => {
                return Err(SkipReason::DegenerateGeometry {
                    vertices: contour.len(),
                })
            }
        }
    }
    let relative = absolute / (f64::from(task.width) * f64::from(task.height));
    Ok((relative, absolute))
}
