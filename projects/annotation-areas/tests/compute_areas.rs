//! End-to-end tests for the area computation pipeline: bbox areas, mask
//! vectorization, surface areas, and the write-back conventions on the
//! dataset document.

use std::collections::BTreeMap;

use annotation_areas::annotations::{
    AnnotationField, BBox, Detection, Detections, ImageMetadata, Mask, Point, Polyline, Polylines,
};
use annotation_areas::dataset::Sample;
use annotation_areas::pipeline::types::ComputeOptions;
use annotation_areas::{compute_areas, AreaError, Dataset};

fn detection(bbox: BBox, mask: Option<Mask>) -> Detection {
    Detection {
        label: "object".to_string(),
        bounding_box: bbox,
        confidence: Some(0.9),
        mask,
        relative_bbox_area: None,
        absolute_bbox_area: None,
    }
}

fn sample(id: &str, width: u32, height: u32, field: &str, value: AnnotationField) -> Sample {
    let mut fields = BTreeMap::new();
    fields.insert(field.to_string(), value);
    Sample {
        id: id.to_string(),
        filepath: format!("/data/{id}.jpg"),
        metadata: Some(ImageMetadata { width, height }),
        fields,
    }
}

fn points(coords: &[(f64, f64)]) -> Vec<Point> {
    coords.iter().map(|&(x, y)| Point { x, y }).collect()
}

// ---------------------------------------------------------------------------
// bbox_area mode
// ---------------------------------------------------------------------------

/// A detection box (0.1, 0.1, 0.5, 0.4) on a 200x100 image gets
/// relative 0.20 and absolute 4000; a sample without detections gets
/// nothing and causes no error.
#[test]
fn bbox_areas_for_the_two_sample_scenario() {
    let mut dataset = Dataset::new("scenario");
    dataset.samples.push(sample(
        "a",
        200,
        100,
        "ground_truth",
        AnnotationField::Detections(Detections {
            detections: vec![detection(
                BBox {
                    x: 0.1,
                    y: 0.1,
                    w: 0.5,
                    h: 0.4,
                },
                None,
            )],
        }),
    ));
    dataset.samples.push(sample(
        "b",
        200,
        100,
        "ground_truth",
        AnnotationField::Detections(Detections::default()),
    ));

    let summary = compute_areas(
        &mut dataset,
        "ground_truth",
        "bbox_area",
        false,
        &ComputeOptions::default(),
    )
    .unwrap();

    assert_eq!(summary.samples_processed, 1);
    assert_eq!(summary.samples_empty, 1);
    assert!(summary.skipped.is_empty());
    assert_eq!(
        summary.fields_written,
        vec![
            "ground_truth.detections.relative_bbox_area".to_string(),
            "ground_truth.detections.absolute_bbox_area".to_string(),
        ]
    );

    let det = &dataset.samples[0].detections("ground_truth").unwrap().detections[0];
    let relative = det.relative_bbox_area.unwrap();
    let absolute = det.absolute_bbox_area.unwrap();
    assert!((relative - 0.20).abs() < 1e-12);
    assert!((absolute - 4000.0).abs() < 1e-9);
    // invariant: absolute = relative * width * height
    assert!((absolute - relative * 200.0 * 100.0).abs() < 1e-9);
}

/// A sample without metadata is skipped and recorded; the rest of the
/// batch still completes.
#[test]
fn bbox_mode_skips_samples_without_metadata() {
    let bbox = BBox {
        x: 0.0,
        y: 0.0,
        w: 0.5,
        h: 0.5,
    };
    let mut dataset = Dataset::new("skips");
    let mut no_meta = sample(
        "no-meta",
        1,
        1,
        "ground_truth",
        AnnotationField::Detections(Detections {
            detections: vec![detection(bbox, None)],
        }),
    );
    no_meta.metadata = None;
    dataset.samples.push(no_meta);
    dataset.samples.push(sample(
        "ok",
        100,
        100,
        "ground_truth",
        AnnotationField::Detections(Detections {
            detections: vec![detection(bbox, None)],
        }),
    ));

    let summary = compute_areas(
        &mut dataset,
        "ground_truth",
        "bbox_area",
        false,
        &ComputeOptions::default(),
    )
    .unwrap();

    assert_eq!(summary.samples_processed, 1);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].sample_id, "no-meta");
    let untouched = &dataset.samples[0].detections("ground_truth").unwrap().detections[0];
    assert_eq!(untouched.relative_bbox_area, None);
    assert_eq!(untouched.absolute_bbox_area, None);
}

// ---------------------------------------------------------------------------
// surface_area mode, polylines already present
// ---------------------------------------------------------------------------

/// A triangle [(0,0), (1,0), (0,1)] on a 10x10 image has absolute area 50
/// and relative area 0.5.
#[test]
fn surface_area_of_a_triangle() {
    let mut dataset = Dataset::new("triangle");
    dataset.samples.push(sample(
        "a",
        10,
        10,
        "gt_polylines",
        AnnotationField::Polylines(Polylines {
            polylines: vec![Polyline {
                label: None,
                points: vec![points(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)])],
                closed: true,
                filled: true,
                relative_surface_area: None,
                absolute_surface_area: None,
            }],
        }),
    ));

    let summary = compute_areas(
        &mut dataset,
        "gt_polylines",
        "surface_area",
        true,
        &ComputeOptions::default(),
    )
    .unwrap();

    let polyline = &dataset.samples[0].polylines("gt_polylines").unwrap().polylines[0];
    let absolute = polyline.absolute_surface_area.unwrap();
    let relative = polyline.relative_surface_area.unwrap();
    assert!((absolute - 50.0).abs() < 1e-9);
    assert!((relative - 0.5).abs() < 1e-9);
    assert!((relative * 10.0 * 10.0 - absolute).abs() < 1e-9);
    assert_eq!(
        summary.fields_written,
        vec![
            "gt_polylines.polylines.relative_surface_area".to_string(),
            "gt_polylines.polylines.absolute_surface_area".to_string(),
        ]
    );
}

// ---------------------------------------------------------------------------
// surface_area mode with mask vectorization
// ---------------------------------------------------------------------------

/// Without polylines, the run first vectorizes masks into a new
/// `{field}_polylines` field: one container per sample in original order,
/// empty (not missing) for samples without detections.
#[test]
fn conversion_creates_an_aligned_polylines_field() {
    let bbox = BBox {
        x: 0.2,
        y: 0.2,
        w: 0.6,
        h: 0.6,
    };
    let full_mask = Mask::from_bitmap(8, 8, &[255u8; 64]);

    let mut dataset = Dataset::new("conversion");
    dataset.samples.push(sample(
        "a",
        100,
        100,
        "ground_truth",
        AnnotationField::Detections(Detections {
            detections: vec![detection(bbox, Some(full_mask.clone()))],
        }),
    ));
    dataset.samples.push(sample(
        "b",
        100,
        100,
        "ground_truth",
        AnnotationField::Detections(Detections::default()),
    ));
    dataset.samples.push(sample(
        "c",
        100,
        100,
        "ground_truth",
        AnnotationField::Detections(Detections {
            detections: vec![detection(bbox, Some(full_mask))],
        }),
    ));

    let summary = compute_areas(
        &mut dataset,
        "ground_truth",
        "surface_area",
        false,
        &ComputeOptions::default(),
    )
    .unwrap();

    // the derived field exists on every sample, aligned with sample order
    for (i, expected_len) in [(0usize, 1usize), (1, 0), (2, 1)] {
        let container = dataset.samples[i]
            .polylines("ground_truth_polylines")
            .expect("every sample gets a container");
        assert_eq!(container.polylines.len(), expected_len);
    }
    assert_eq!(summary.samples_processed, 2);
    assert_eq!(summary.samples_empty, 1);
    assert_eq!(summary.fields_written[0], "ground_truth_polylines");

    // measured polylines are closed, filled, and carry both areas
    let polyline = &dataset.samples[0]
        .polylines("ground_truth_polylines")
        .unwrap()
        .polylines[0];
    assert!(polyline.closed);
    assert!(polyline.filled);
    let absolute = polyline.absolute_surface_area.unwrap();
    let relative = polyline.relative_surface_area.unwrap();
    assert!(absolute > 0.0);
    assert!((relative * 100.0 * 100.0 - absolute).abs() < 1e-9);
    // the traced contour stays within the detection's box
    assert!(relative <= bbox.w * bbox.h + 1e-9);
}

/// The source detections field is not mutated by conversion.
#[test]
fn conversion_leaves_the_source_field_alone() {
    let bbox = BBox {
        x: 0.1,
        y: 0.1,
        w: 0.5,
        h: 0.5,
    };
    let mut dataset = Dataset::new("source-untouched");
    dataset.samples.push(sample(
        "a",
        50,
        50,
        "ground_truth",
        AnnotationField::Detections(Detections {
            detections: vec![detection(bbox, Some(Mask::from_bitmap(4, 4, &[255u8; 16])))],
        }),
    ));
    let source_before =
        serde_json::to_string(&dataset.samples[0].detections("ground_truth").unwrap()).unwrap();

    compute_areas(
        &mut dataset,
        "ground_truth",
        "surface_area",
        false,
        &ComputeOptions::default(),
    )
    .unwrap();

    let source_after =
        serde_json::to_string(&dataset.samples[0].detections("ground_truth").unwrap()).unwrap();
    assert_eq!(source_before, source_after);
}

// ---------------------------------------------------------------------------
// validation
// ---------------------------------------------------------------------------

/// An invalid mode string raises immediately and leaves the dataset
/// unmodified.
#[test]
fn invalid_mode_leaves_the_collection_unmodified() {
    let mut dataset = Dataset::new("validation");
    dataset.samples.push(sample(
        "a",
        10,
        10,
        "ground_truth",
        AnnotationField::Detections(Detections {
            detections: vec![detection(
                BBox {
                    x: 0.0,
                    y: 0.0,
                    w: 1.0,
                    h: 1.0,
                },
                None,
            )],
        }),
    ));
    let before = serde_json::to_string(&dataset).unwrap();

    let err = compute_areas(
        &mut dataset,
        "ground_truth",
        "area",
        false,
        &ComputeOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, AreaError::InvalidMode(_)));
    assert_eq!(serde_json::to_string(&dataset).unwrap(), before);
}

/// A field absent from the schema is fatal before any work begins.
#[test]
fn missing_field_is_fatal() {
    let mut dataset = Dataset::new("validation");
    dataset.samples.push(sample(
        "a",
        10,
        10,
        "ground_truth",
        AnnotationField::Detections(Detections::default()),
    ));

    let err = compute_areas(
        &mut dataset,
        "predictions",
        "bbox_area",
        false,
        &ComputeOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, AreaError::MissingField(_)));
}
