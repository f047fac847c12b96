use crate::aggregator::VolumeReport;
#[cfg(feature = "json")]
use crate::error::{Result, VolumeError};
use std::fmt;
#[cfg(feature = "json")]
use std::path::Path;

/// Text formatter for label volumes
///
/// A single label prints as the bare volume in mm³; several labels print one
/// line each.
pub struct TextReport<'a> {
    report: &'a VolumeReport,
}

impl<'a> TextReport<'a> {
    pub fn new(report: &'a VolumeReport) -> Self {
        Self { report }
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.report.len() == 1 {
            if let Some((_, volume)) = self.report.iter().next() {
                return write!(f, "{:.3}", volume.volume_mm3);
            }
        }
        for (label, volume) in self.report {
            writeln!(f, "label: {}, volume: {:.3} mm³", label, volume.volume_mm3)?;
        }
        Ok(())
    }
}

/// Error object shared by the single and batch JSON outputs
#[cfg(feature = "json")]
pub fn json_error(err: &VolumeError) -> serde_json::Value {
    serde_json::json!({
        "kind": err.kind(),
        "message": err.to_string(),
    })
}

/// One batch job as a JSON object
///
/// Holds the series directory and either the `result` report or the `error`.
#[cfg(feature = "json")]
pub fn json_batch_entry(directory: &Path, result: &Result<VolumeReport>) -> serde_json::Value {
    let directory = directory.display().to_string();
    match result {
        Ok(report) => serde_json::json!({
            "directory": directory,
            "result": report,
        }),
        Err(err) => serde_json::json!({
            "directory": directory,
            "error": json_error(err),
        }),
    }
}
