use std::path::PathBuf;

use serde::Serialize;

use crate::crumble::SweepEntry;

/// Machine-readable report for a sweep run.
///
/// In `--json` mode we print this to stdout as pretty JSON.
#[derive(Debug, Serialize)]
pub struct SweepReport {
    /// Tool name, stable across versions.
    pub tool: &'static str,

    /// Current crate version.
    pub version: &'static str,

    /// Sweep file used for this run.
    pub spec: PathBuf,

    /// Function command line, as typed.
    pub command: String,

    /// Number of rows in the mutation table.
    pub rows: usize,

    /// Sweep output, in table order.
    pub entries: Vec<SweepEntry>,

    /// Optional high-level error message (for example a bad signature).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SweepReport {
    pub fn success(spec: PathBuf, command: String, rows: usize, entries: Vec<SweepEntry>) -> Self {
        Self {
            tool: "zest-crumble",
            version: env!("CARGO_PKG_VERSION"),
            spec,
            command,
            rows,
            entries,
            error: None,
        }
    }

    pub fn failure(spec: PathBuf, command: String, rows: usize, error: String) -> Self {
        Self {
            tool: "zest-crumble",
            version: env!("CARGO_PKG_VERSION"),
            spec,
            command,
            rows,
            entries: Vec::new(),
            error: Some(error),
        }
    }

    /// Message of the crumble error entry, if the output script was rejected.
    pub fn script_error(&self) -> Option<&str> {
        self.entries.iter().find_map(|e| match e {
            SweepEntry::Error { message } => Some(message.as_str()),
            SweepEntry::Result { .. } => None,
        })
    }
}
