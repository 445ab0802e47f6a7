//! Run identity and per-invocation records.
//!
//! `InvocationRecord` is what gets written to the invocation trace, one per
//! atomic actor invocation, successful or not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for one top-level pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub uuid::Uuid);

impl RunId {
    /// Create a new, unique run ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// How an atomic invocation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvocationOutcome {
    /// Results were extracted; lists `name=artifact` for every output.
    Succeeded { outputs: Vec<String> },
    /// The tool could not run or its results could not be extracted.
    Failed { reason: String },
}

/// An immutable record of one atomic actor invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationRecord {
    /// Name of the atomic actor.
    pub actor: String,
    pub tool_id: String,
    pub argv: Vec<String>,
    /// Exit code of the process; absent when it never started or was killed.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub runtime_ms: u64,
    pub outcome: InvocationOutcome,
    /// Wall-clock time the invocation started (UTC).
    pub started_at: DateTime<Utc>,
}
