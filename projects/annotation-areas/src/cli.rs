use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the dataset JSON document
    #[arg(long, env = "ANNOTATION_AREAS_DATASET")]
    pub dataset: PathBuf,

    /// Annotation field to compute areas for
    #[arg(long)]
    pub field: String,

    /// Computation mode: bbox_area or surface_area
    #[arg(long)]
    pub mode: String,

    /// The field already holds polylines; skip mask vectorization
    #[arg(long)]
    pub has_polylines: bool,

    /// Contour measure policy: first_contour, sum_contours or all_polylines
    #[arg(long, default_value = "first_contour")]
    pub policy: String,

    /// Worker threads for the surface-area pass
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// Write a CSV report of per-annotation outcomes
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
