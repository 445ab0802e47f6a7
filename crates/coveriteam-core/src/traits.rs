//! Core trait definitions for the CoVeriTeam runtime.
//!
//! - `Actor`       : the unit of composition (atomic or composite)
//! - `ToolBackend` : per-tool argument preparation and result extraction
//! - `ToolRunner`  : the subprocess execution wrapper
//! - `ResultParser`: maps a finished tool run onto a verdict
//! - `Archiver`    : packages a directory into a zip file
//! - `TraceWriter` : append-only sink for invocation records
//!
//! Only `Actor` is implemented inside this crate. The collaborator traits are
//! implemented by `coveriteam-tools` and `coveriteam-trace`, or by tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use coveriteam_contracts::{
    contract::{ArtifactContract, Bindings},
    error::CoveriResult,
    execution::InvocationRecord,
    tool::{ToolRequest, ToolRun},
    verdict::Verdict,
};

/// A typed unit of computation.
///
/// An actor declares the artifacts it consumes and produces. The execution
/// engine (see [`crate::executor::execute`]) guarantees that `act` only runs
/// when every declared input is bound with a compatible kind, and rejects
/// results whose names differ from the declared outputs.
pub trait Actor: Send + Sync {
    /// Name used in log fields, trace records and error messages.
    fn name(&self) -> &str;

    fn inputs(&self) -> &ArtifactContract;

    fn outputs(&self) -> &ArtifactContract;

    /// Run the actor.
    ///
    /// `inputs` may carry more bindings than declared; composites forward
    /// them to their children, atomic actors ignore them.
    fn act(&self, inputs: &Bindings) -> CoveriResult<Bindings>;
}

/// Shared handle to an actor. The same actor may sit in several positions of
/// a composition tree, e.g. on both branches of an `Ite`.
pub type ActorRef = Arc<dyn Actor>;

/// The tool-specific half of an atomic actor.
pub trait ToolBackend: Send + Sync {
    /// Arguments derived from the bound inputs, appended after the
    /// descriptor's command and options.
    fn prepare_args(&self, inputs: &Bindings) -> CoveriResult<Vec<String>>;

    /// Map the finished run (log lines, result files) onto the declared outputs.
    fn extract_result(&self, run: &ToolRun) -> CoveriResult<Bindings>;
}

/// The subprocess execution wrapper.
///
/// Owns resource limiting, log capture and the per-invocation directory
/// layout. Each call must use a fresh working directory so concurrent
/// invocations never see each other's result files.
pub trait ToolRunner: Send + Sync {
    fn run(&self, request: &ToolRequest) -> CoveriResult<ToolRun>;
}

/// Determines a verdict from a finished tool run.
pub trait ResultParser: Send + Sync {
    fn determine_result(&self, run: &ToolRun) -> Verdict;
}

/// Packages a directory into a zip archive.
pub trait Archiver: Send + Sync {
    /// Create `dest_zip` from the contents of `src_dir` and return its path.
    fn create_archive(&self, src_dir: &Path, dest_zip: &Path) -> CoveriResult<PathBuf>;
}

/// Append-only sink for invocation records.
pub trait TraceWriter: Send + Sync {
    /// Append one record. Records are never modified afterwards.
    fn write(&self, record: &InvocationRecord) -> CoveriResult<()>;

    /// Mark a run as complete.
    fn finalize(&self, run_id: &str) -> CoveriResult<()>;
}
