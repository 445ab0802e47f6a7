//! Wiring of the collaborators every reference actor needs.
//!
//! A `Workbench` owns the tool registry, the subprocess runner, the archiver
//! and the invocation trace, and hands out atomic actors that share them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use coveriteam_contracts::{
    artifact::{Artifact, ArtifactKind},
    contract::ArtifactContract,
    error::{CoveriError, CoveriResult},
    execution::RunId,
    tool::ToolDescriptor,
};
use coveriteam_core::{
    atomic::AtomicActor,
    executor::Engine,
    traits::{ActorRef, Archiver, ToolBackend, ToolRunner},
};
use coveriteam_tools::{ProcessRunner, ToolRegistry, ZipArchiver};
use coveriteam_trace::InMemoryTraceWriter;

use crate::backends::{TestGenerator, TestValidator, Validator, Verifier, WitnessToTest};

/// Tool descriptors and mock tool scripts shipped with this crate.
pub fn default_tools_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tools")
}

/// Example programs and property files shipped with this crate.
pub fn default_inputs_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("inputs")
}

pub struct Workbench {
    registry: ToolRegistry,
    runner: Arc<dyn ToolRunner>,
    archiver: Arc<dyn Archiver>,
    trace: Arc<InMemoryTraceWriter>,
    inputs_dir: PathBuf,
}

impl Workbench {
    /// Load every descriptor in `tools_dir`; tool runs are placed below
    /// `<work_dir>/runs`.
    pub fn new(tools_dir: &Path, inputs_dir: impl Into<PathBuf>, work_dir: &Path) -> CoveriResult<Self> {
        let registry = ToolRegistry::from_dir(tools_dir)?;
        let trace = Arc::new(InMemoryTraceWriter::new(format!("workbench-{}", RunId::new())));
        info!(
            tools = registry.len(),
            work_dir = %work_dir.display(),
            trace_id = %trace.trace_id(),
            "workbench ready"
        );
        Ok(Self {
            registry,
            runner: Arc::new(ProcessRunner::new(work_dir.join("runs"))),
            archiver: Arc::new(ZipArchiver::new()),
            trace,
            inputs_dir: inputs_dir.into(),
        })
    }

    /// The bundled mock tools and example inputs.
    pub fn bundled(work_dir: &Path) -> CoveriResult<Self> {
        Self::new(&default_tools_dir(), default_inputs_dir(), work_dir)
    }

    pub fn with_runner(mut self, runner: Arc<dyn ToolRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_archiver(mut self, archiver: Arc<dyn Archiver>) -> Self {
        self.archiver = archiver;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// The trace every actor of this workbench writes to.
    pub fn trace(&self) -> &Arc<InMemoryTraceWriter> {
        &self.trace
    }

    /// An engine that seals this workbench's trace after every run.
    pub fn engine(&self) -> Engine {
        Engine::with_trace(self.trace.clone())
    }

    /// A file from the inputs directory, tagged with `kind`.
    pub fn input(&self, kind: ArtifactKind, file_name: &str) -> CoveriResult<Artifact> {
        let path = self.inputs_dir.join(file_name);
        if !path.is_file() {
            return Err(CoveriError::Config {
                reason: format!("input file '{}' does not exist", path.display()),
            });
        }
        Artifact::from_path(kind, path)
    }

    fn atomic(
        &self,
        tool_id: &str,
        inputs: ArtifactContract,
        outputs: ArtifactContract,
        backend: impl FnOnce(&ToolDescriptor) -> CoveriResult<Arc<dyn ToolBackend>>,
    ) -> CoveriResult<ActorRef> {
        let descriptor = self.registry.get(tool_id)?.clone();
        let backend = backend(&descriptor)?;
        let actor = AtomicActor::new(tool_id, descriptor, inputs, outputs, backend, self.runner.clone())
            .with_trace(self.trace.clone());
        Ok(Arc::new(actor))
    }

    /// `program, spec → verdict, witness`
    pub fn verifier(&self, tool_id: &str) -> CoveriResult<ActorRef> {
        self.atomic(tool_id, Verifier::inputs(), Verifier::outputs(), |d| {
            Ok(Arc::new(Verifier::new(d.clone())?))
        })
    }

    /// `program, spec, witness → verdict`
    pub fn validator(&self, tool_id: &str) -> CoveriResult<ActorRef> {
        self.atomic(tool_id, Validator::inputs(), Validator::outputs(), |d| {
            Ok(Arc::new(Validator::new(d.clone())?))
        })
    }

    /// `program, spec, witness → test_suite`
    pub fn witness_to_test(&self, tool_id: &str) -> CoveriResult<ActorRef> {
        self.atomic(tool_id, WitnessToTest::inputs(), WitnessToTest::outputs(), |d| {
            Ok(Arc::new(WitnessToTest::new(d.clone())))
        })
    }

    /// `program, test_spec, covered_goals → test_suite`
    pub fn test_generator(&self, tool_id: &str) -> CoveriResult<ActorRef> {
        self.atomic(tool_id, TestGenerator::inputs(), TestGenerator::outputs(), |d| {
            Ok(Arc::new(TestGenerator::new(d.clone())))
        })
    }

    /// `program, test_spec, test_suite → new_goals`
    pub fn test_validator(&self, tool_id: &str) -> CoveriResult<ActorRef> {
        let archiver = self.archiver.clone();
        self.atomic(tool_id, TestValidator::inputs(), TestValidator::outputs(), |d| {
            Ok(Arc::new(TestValidator::new(d.clone(), archiver)))
        })
    }
}
