use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::AreaError;
use crate::pipeline::types::RunSummary;

/// Write a CSV report of a run: one row per computed area, one row per
/// skipped sample.
pub fn write_report(path: &Path, summary: &RunSummary) -> Result<(), AreaError> {
    let mut file = File::create(path)?;
    writeln!(
        file,
        "sample_id,annotation_index,relative_area,absolute_area,status"
    )?;
    for record in &summary.areas {
        writeln!(
            file,
            "{},{},{},{},ok",
            record.sample_id, record.annotation_index, record.relative, record.absolute
        )?;
    }
    for skip in &summary.skipped {
        writeln!(file, "{},,,,skipped: {}", skip.sample_id, skip.reason)?;
    }
    Ok(())
}
