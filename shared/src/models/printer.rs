//! Printer Model
//!
//! State reported by a connected printer. Field names follow the device's
//! camelCase vocabulary so API consumers see what the printer reports.

use serde::{Deserialize, Serialize};

/// Printer entity, as reported by the printer client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Printer {
    /// Unique hardware serial (matched case-sensitively)
    pub serial: String,
    /// Human-friendly name (matched case-insensitively)
    pub machine_name: String,
    pub machine_type: String,
    pub firmware_version: String,
    /// Present once the printer has sent its first status report
    pub metadata: Option<PrinterMetadata>,
}

impl Printer {
    /// Does `query` identify this printer?
    ///
    /// Serial must match exactly; machine name matches ignoring case.
    pub fn matches(&self, query: &str) -> bool {
        self.serial == query || self.machine_name.to_lowercase() == query.to_lowercase()
    }

    /// Active job, if the printer reported one
    pub fn current_job(&self) -> Option<&Job> {
        self.metadata.as_ref()?.current_process.as_ref()
    }
}

/// Live status block of a printer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterMetadata {
    /// Active job (absent when idle)
    pub current_process: Option<Job>,
    /// Number of extruders
    pub tool_count: u32,
}

/// A job running on a printer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: u32,
    /// Usually the submitted file name
    pub name: String,
    pub step: JobStep,
    /// 0-100
    pub progress: u8,
    /// Seconds
    pub elapsed_time: u64,
    /// Seconds, 0 when unknown
    pub time_estimation: u64,
    pub can_cancel: bool,
}

/// Job lifecycle step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStep {
    Printing,
    Suspended,
    Completed,
    Cancelled,
}
