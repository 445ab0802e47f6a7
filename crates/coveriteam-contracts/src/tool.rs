//! Tool descriptors and the data exchanged with the subprocess wrapper.
//!
//! A `ToolDescriptor` is pure configuration: how to start a tool, which
//! limits apply, where its results land and how its log maps onto a
//! verdict. `ToolRequest` and `ToolRun` are the two halves of one
//! invocation as seen by the execution wrapper.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::verdict::ResultClass;

/// Resource limits applied to one tool invocation. `None` means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Wall-clock limit; the process is killed when it is exceeded.
    #[serde(default)]
    pub wall_time_secs: Option<u64>,
    #[serde(default)]
    pub cpu_time_secs: Option<u64>,
    #[serde(default)]
    pub memory_mb: Option<u64>,
}

impl ResourceLimits {
    pub fn wall_time(&self) -> Option<Duration> {
        self.wall_time_secs.map(Duration::from_secs)
    }
}

/// One log-line rule mapping a tool's output onto a verdict.
///
/// Rules are tried in declaration order; the first whose `pattern` (a
/// regular expression) matches any log line decides the verdict.
///
/// Example in TOML:
/// ```toml
/// [[verdict_rules]]
/// id = "violation"
/// pattern = "^Verification result: FALSE"
/// class = "false"
/// result = "false(unreach-call)"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictRule {
    pub id: String,
    pub pattern: String,
    pub class: ResultClass,
    /// Raw result string; defaults to the lower-case class name.
    #[serde(default)]
    pub result: Option<String>,
}

/// Everything needed to run one external tool.
///
/// The top-level structure of a TOML tool descriptor file:
/// ```toml
/// id = "cpachecker"
/// name = "CPAchecker"
/// command = ["scripts/cpa.sh"]
/// options = ["-svcomp23"]
///
/// [limits]
/// wall_time_secs = 900
///
/// [result_files]
/// witness = "**/*.graphml"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Stable identifier used by the registry, log fields and trace records.
    pub id: String,
    /// Human-readable tool name.
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Executable followed by fixed leading arguments.
    pub command: Vec<String>,
    /// Tool options appended after `command`, before input-derived arguments.
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub limits: ResourceLimits,
    /// Output name → glob over the invocation's working directory.
    #[serde(default)]
    pub result_files: BTreeMap<String, String>,
    #[serde(default)]
    pub verdict_rules: Vec<VerdictRule>,
}

impl ToolDescriptor {
    /// The glob configured for `output`, if any.
    pub fn result_pattern(&self, output: &str) -> Option<&str> {
        self.result_files.get(output).map(String::as_str)
    }
}

/// What an atomic actor hands to the execution wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub tool_id: String,
    /// Full argument vector; `argv[0]` is the executable.
    pub argv: Vec<String>,
    pub limits: ResourceLimits,
}

/// What the execution wrapper returns after the tool terminated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRun {
    pub tool_id: String,
    /// `None` when the process was killed (e.g. on timeout).
    pub exit_code: Option<i32>,
    pub runtime: Duration,
    pub timed_out: bool,
    /// File holding the captured stdout and stderr.
    pub log_path: PathBuf,
    pub log_lines: Vec<String>,
    /// Working directory the tool ran in; result files are searched here.
    pub output_dir: PathBuf,
    /// Every regular file found under `output_dir` after termination.
    pub result_files: Vec<PathBuf>,
}
