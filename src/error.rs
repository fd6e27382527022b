use std::path::PathBuf;
use thiserror::Error;

use crate::prober::ProbeError;
use crate::types::ScanReport;

/// A range-list line that could not be turned into an [`crate::AddressRange`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {reason} ({content:?})")]
pub struct RangeParseError {
    pub line: usize,
    pub content: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ScanError {
    /// Rejected before any probe was sent.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The probing mechanism broke mid-scan. Partial results were flushed.
    #[error("probe mechanism unusable: {source}")]
    ProbeInvocation {
        #[source]
        source: ProbeError,
        report: Box<ScanReport>,
    },

    /// The scan ended but its results could not be persisted; they are
    /// still available in `report`.
    #[error("failed to save {} live hosts: {source}", .report.hosts.len())]
    SinkWrite {
        #[source]
        source: SinkError,
        report: Box<ScanReport>,
    },
}

impl ScanError {
    /// The report of the run, if it got far enough to produce one.
    pub fn report(&self) -> Option<&ScanReport> {
        match self {
            ScanError::Configuration(_) => None,
            ScanError::ProbeInvocation { report, .. } | ScanError::SinkWrite { report, .. } => {
                Some(report)
            }
        }
    }
}
