//! Chain entries and the exported trace.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coveriteam_contracts::{
    error::{CoveriError, CoveriResult},
    execution::InvocationRecord,
};

/// One invocation record at a fixed position of the chain.
///
/// Changing any field, the embedded record included, invalidates
/// `this_hash` and the `prev_hash` of every later event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Position in the chain, starting at 0.
    pub sequence: u64,
    pub trace_id: String,
    pub record: InvocationRecord,
    pub prev_hash: String,
    pub this_hash: String,
}

/// A run the engine sealed, and how many events the chain held at that point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedRun {
    pub run_id: String,
    pub event_count: usize,
    pub sealed_at: DateTime<Utc>,
}

/// Snapshot of a trace, suitable for archiving next to the tool outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceLog {
    pub trace_id: String,
    pub events: Vec<TraceEvent>,
    pub runs: Vec<SealedRun>,
    pub exported_at: DateTime<Utc>,
    /// `this_hash` of the last event; empty for an empty trace.
    pub terminal_hash: String,
}

impl TraceLog {
    /// Write the trace as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> CoveriResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| CoveriError::TraceWriteFailed {
            reason: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| CoveriError::TraceWriteFailed {
            reason: format!("{}: {e}", path.display()),
        })
    }

    pub fn read_json(path: &Path) -> CoveriResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| CoveriError::Config {
            reason: format!("{}: {e}", path.display()),
        })?;
        serde_json::from_str(&text).map_err(|e| CoveriError::Config {
            reason: format!("{}: {e}", path.display()),
        })
    }
}
