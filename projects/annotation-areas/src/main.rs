mod cli;

use anyhow::{Context, Result};
use cli::Args;

use annotation_areas::pipeline::types::{ComputeOptions, MeasurePolicy};
use annotation_areas::{compute_areas, report, Dataset};

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse_args();

    let mut dataset = Dataset::load(&args.dataset)
        .with_context(|| format!("failed to load dataset at {:?}", args.dataset))?;
    dataset.info();

    let options = ComputeOptions {
        policy: MeasurePolicy::parse(&args.policy)?,
        workers: args.workers.max(1),
    };
    let summary = compute_areas(
        &mut dataset,
        &args.field,
        &args.mode,
        args.has_polylines,
        &options,
    )?;

    dataset
        .save()
        .with_context(|| format!("failed to save dataset at {:?}", args.dataset))?;
    tracing::info!("saved dataset, updated fields: {}", summary.fields_written.join(", "));

    if let Some(path) = &args.report {
        report::write_report(path, &summary)
            .with_context(|| format!("failed to write report at {path:?}"))?;
        tracing::info!("wrote report to {:?}", path);
    }

    println!(
        "{}: {} samples processed, {} empty, {} skipped",
        summary.mode,
        summary.samples_processed,
        summary.samples_empty,
        summary.skipped.len()
    );

    Ok(())
}
