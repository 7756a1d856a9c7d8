//! Per-file result records, serialized as the batch report.

use serde::{Deserialize, Serialize};

use crate::classify::{Severity, VulnerabilityFinding};
use crate::domain::PiiCounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Completed,
    Error,
}

/// Outcome of processing one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResult {
    pub original_file_name: String,
    pub file_type: String,
    pub status: FileStatus,
    pub summary: String,
    pub pii_detected: PiiCounts,
    pub vulnerabilities: Vec<VulnerabilityFinding>,
    /// Absent when not even a verbatim copy could be written
    pub cleansed_file_path: Option<String>,
}

impl FileResult {
    pub fn is_error(&self) -> bool {
        self.status == FileStatus::Error
    }

    pub fn count_severity(&self, severity: Severity) -> usize {
        self.vulnerabilities
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One entry per dispatched file, in completion order
    pub results: Vec<FileResult>,
    /// Files never dispatched because the batch was cancelled
    pub skipped: Vec<String>,
}

impl BatchReport {
    pub fn errors(&self) -> usize {
        self.results.iter().filter(|r| r.is_error()).count()
    }
}
