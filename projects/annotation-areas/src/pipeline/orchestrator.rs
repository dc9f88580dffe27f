// Area computation orchestrator.
//
// Validates inputs, sequences mask conversion when needed, fans the
// per-sample surface measurements out over a worker pool, and writes the
// computed attributes back through the dataset store.

use std::collections::BTreeSet;
use std::thread;

use crossbeam::channel;
use indicatif::{ProgressBar, ProgressStyle};

use crate::annotations::FieldKind;
use crate::dataset::{polylines_field_name, Dataset, KeyPath};
use crate::error::AreaError;
use crate::pipeline::types::{
    AreaMode, AreaRecord, ComputeOptions, MeasurePolicy, RunSummary, SampleSkip, SkipReason,
    SurfaceOutcome, SurfaceTask,
};
use crate::pipeline::{geometry, mask, worker};

/// Compute area metrics for every annotation under `field` and write them
/// back onto the dataset.
///
/// `mode` must be the literal `"bbox_area"` or `"surface_area"`; anything
/// else is rejected before any mutation, as is a `field` that no sample
/// carries. `has_polylines` is only meaningful in surface mode: when false,
/// segmentation masks are vectorized into a new `{field}_polylines` field
/// first and the measurement runs on that field.
///
/// Samples with missing or zero image metadata and contours with fewer
/// than 3 vertices are skipped and recorded in the returned summary; they
/// never abort the batch. Persisting the mutated dataset (and notifying
/// whatever is watching it) is the caller's job.
pub fn compute_areas(
    dataset: &mut Dataset,
    field: &str,
    mode: &str,
    has_polylines: bool,
    options: &ComputeOptions,
) -> Result<RunSummary, AreaError> {
    let mode = AreaMode::parse(mode)?;
    tracing::info!(
        "computing {} for field '{}' over {} samples",
        mode.as_str(),
        field,
        dataset.samples.len()
    );

    let summary = match mode {
        AreaMode::BboxArea => compute_bbox_areas(dataset, field)?,
        AreaMode::SurfaceArea => compute_surface_areas(dataset, field, has_polylines, options)?,
    };

    tracing::info!(
        "{}: {} samples processed, {} empty, {} skipped",
        summary.mode,
        summary.samples_processed,
        summary.samples_empty,
        summary.skipped.len()
    );
    for skip in &summary.skipped {
        tracing::warn!("skipped sample {}: {}", skip.sample_id, skip.reason);
    }
    Ok(summary)
}

/// Bulk bbox-area derivation: one read pass computing every value, then
/// one write per attribute path, mirroring a vectorized set-field on the
/// storage layer.
fn compute_bbox_areas(dataset: &mut Dataset, field: &str) -> Result<RunSummary, AreaError> {
    dataset.expect_field_kind(field, FieldKind::Detections)?;

    let rel_path = KeyPath::detections_attr(field, "relative_bbox_area");
    let abs_path = KeyPath::detections_attr(field, "absolute_bbox_area");

    let mut summary = RunSummary::new(AreaMode::BboxArea, field);
    let mut relatives: Vec<Option<Vec<f64>>> = Vec::with_capacity(dataset.samples.len());
    let mut absolutes: Vec<Option<Vec<f64>>> = Vec::with_capacity(dataset.samples.len());

    for sample in &dataset.samples {
        let detections = sample
            .detections(field)
            .map(|d| d.detections.as_slice())
            .unwrap_or(&[]);
        if detections.is_empty() {
            summary.samples_empty += 1;
            relatives.push(None);
            absolutes.push(None);
            continue;
        }
        let Some((width, height)) = sample.dimensions() else {
            summary.skipped.push(SampleSkip {
                sample_id: sample.id.clone(),
                reason: SkipReason::MissingMetadata,
            });
            relatives.push(None);
            absolutes.push(None);
            continue;
        };

        let mut rel = Vec::with_capacity(detections.len());
        let mut abs = Vec::with_capacity(detections.len());
        for (index, detection) in detections.iter().enumerate() {
            let (relative, absolute) =
                geometry::bbox_area(&detection.bounding_box, width, height);
            summary.areas.push(AreaRecord {
                sample_id: sample.id.clone(),
                annotation_index: index,
                relative,
                absolute,
            });
            rel.push(relative);
            abs.push(absolute);
        }
        relatives.push(Some(rel));
        absolutes.push(Some(abs));
        summary.samples_processed += 1;
    }

    dataset.set_detection_numbers(&rel_path, &relatives)?;
    dataset.set_detection_numbers(&abs_path, &absolutes)?;
    summary.fields_written = vec![rel_path.to_string(), abs_path.to_string()];
    Ok(summary)
}

fn compute_surface_areas(
    dataset: &mut Dataset,
    field: &str,
    has_polylines: bool,
    options: &ComputeOptions,
) -> Result<RunSummary, AreaError> {
    let poly_field = if has_polylines {
        dataset.expect_field_kind(field, FieldKind::Polylines)?;
        field.to_string()
    } else {
        dataset.expect_field_kind(field, FieldKind::Detections)?;
        let containers = mask::convert_masks_to_polylines(&dataset.samples, field);
        let name = polylines_field_name(field);
        dataset.set_polylines_field(&name, containers)?;
        tracing::info!("vectorized masks of '{}' into new field '{}'", field, name);
        name
    };

    let mut summary = RunSummary::new(AreaMode::SurfaceArea, &poly_field);
    let mut tasks = Vec::new();
    for (sample_index, sample) in dataset.samples.iter().enumerate() {
        let polylines = match sample.polylines(&poly_field) {
            Some(container) if !container.polylines.is_empty() => &container.polylines,
            _ => {
                summary.samples_empty += 1;
                continue;
            }
        };
        let Some((width, height)) = sample.dimensions() else {
            summary.skipped.push(SampleSkip {
                sample_id: sample.id.clone(),
                reason: SkipReason::MissingMetadata,
            });
            continue;
        };

        match options.policy {
            MeasurePolicy::FirstContour => tasks.push(SurfaceTask {
                sample_index,
                polyline_index: 0,
                contours: polylines[0].points.iter().take(1).cloned().collect(),
                width,
                height,
            }),
            MeasurePolicy::SumContours => tasks.push(SurfaceTask {
                sample_index,
                polyline_index: 0,
                contours: polylines[0].points.clone(),
                width,
                height,
            }),
            MeasurePolicy::AllPolylines => {
                for (polyline_index, polyline) in polylines.iter().enumerate() {
                    tasks.push(SurfaceTask {
                        sample_index,
                        polyline_index,
                        contours: polyline.points.clone(),
                        width,
                        height,
                    });
                }
            }
        }
    }

    let mut outcomes = run_surface_tasks(tasks, options.workers);
    // Worker arrival order is nondeterministic; the summary is not.
    outcomes.sort_by_key(|o| (o.sample_index, o.polyline_index));

    let mut processed = BTreeSet::new();
    for outcome in outcomes {
        let sample = &mut dataset.samples[outcome.sample_index];
        match outcome.result {
            Ok((relative, absolute)) => {
                if let Some(container) = sample.polylines_mut(&poly_field) {
                    if let Some(polyline) = container.polylines.get_mut(outcome.polyline_index) {
                        polyline.relative_surface_area = Some(relative);
                        polyline.absolute_surface_area = Some(absolute);
                    }
                }
                summary.areas.push(AreaRecord {
                    sample_id: sample.id.clone(),
                    annotation_index: outcome.polyline_index,
                    relative,
                    absolute,
                });
                processed.insert(outcome.sample_index);
            }
            Err(reason) => summary.skipped.push(SampleSkip {
                sample_id: sample.id.clone(),
                reason,
            }),
        }
    }
    summary.samples_processed = processed.len();

    if !has_polylines {
        summary.fields_written.push(poly_field.clone());
    }
    summary.fields_written.extend([
        KeyPath::polylines_attr(&poly_field, "relative_surface_area").to_string(),
        KeyPath::polylines_attr(&poly_field, "absolute_surface_area").to_string(),
    ]);
    Ok(summary)
}

/// Run surface tasks inline or over a pool of worker threads. Outcomes
/// carry their sample index, so the caller's write-back does not depend
/// on completion order.
fn run_surface_tasks(tasks: Vec<SurfaceTask>, workers: usize) -> Vec<SurfaceOutcome> {
    let pb = progress_bar(tasks.len() as u64);

    let outcomes = if workers <= 1 {
        tasks
            .iter()
            .map(|task| {
                let outcome = worker::measure(task);
                pb.inc(1);
                outcome
            })
            .collect()
    } else {
        let (task_tx, task_rx) = channel::unbounded::<SurfaceTask>();
        let (result_tx, result_rx) = channel::unbounded::<SurfaceOutcome>();

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let rx = task_rx.clone();
            let tx = result_tx.clone();
            handles.push(thread::spawn(move || worker::surface_worker(rx, tx)));
        }
        drop(task_rx);
        drop(result_tx);

        for task in tasks {
            if task_tx.send(task).is_err() {
                break;
            }
        }
        drop(task_tx);

        let mut outcomes = Vec::new();
        for outcome in result_rx {
            outcomes.push(outcome);
            pb.inc(1);
        }
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("surface worker panicked");
            }
        }
        outcomes
    };

    pb.finish_and_clear();
    outcomes
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, {eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
