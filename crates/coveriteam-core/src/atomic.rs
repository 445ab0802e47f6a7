//! Atomic actors: one external tool invocation per `act`.
//!
//! The invocation lifecycle is fixed:
//!
//!   project inputs → prepare argv → run subprocess → extract results → trace
//!
//! What differs between tools lives in a [`ToolBackend`]; how the process is
//! started, limited and logged lives in a [`ToolRunner`]. Atomic actors are
//! not deterministic (timeouts, randomised search), so nothing is cached.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use coveriteam_contracts::{
    artifact::{Artifact, ArtifactKind},
    contract::{ArtifactContract, Bindings},
    error::{CoveriError, CoveriResult},
    execution::{InvocationOutcome, InvocationRecord},
    tool::{ToolDescriptor, ToolRequest, ToolRun},
};

use crate::traits::{Actor, ToolBackend, ToolRunner, TraceWriter};

/// An actor backed by an external tool.
pub struct AtomicActor {
    name: String,
    descriptor: ToolDescriptor,
    inputs: ArtifactContract,
    outputs: ArtifactContract,
    backend: Arc<dyn ToolBackend>,
    runner: Arc<dyn ToolRunner>,
    trace: Option<Arc<dyn TraceWriter>>,
}

impl AtomicActor {
    pub fn new(
        name: impl Into<String>,
        descriptor: ToolDescriptor,
        inputs: ArtifactContract,
        outputs: ArtifactContract,
        backend: Arc<dyn ToolBackend>,
        runner: Arc<dyn ToolRunner>,
    ) -> Self {
        Self {
            name: name.into(),
            descriptor,
            inputs,
            outputs,
            backend,
            runner,
            trace: None,
        }
    }

    /// Record every invocation of this actor in `trace`.
    pub fn with_trace(mut self, trace: Arc<dyn TraceWriter>) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn build_argv(&self, inputs: &Bindings) -> CoveriResult<Vec<String>> {
        let mut argv = self.descriptor.command.clone();
        argv.extend(self.descriptor.options.iter().cloned());
        argv.extend(self.backend.prepare_args(inputs)?);
        if argv.is_empty() {
            return Err(CoveriError::ToolInvocation {
                tool: self.descriptor.id.clone(),
                reason: "descriptor has an empty command".to_string(),
            });
        }
        Ok(argv)
    }

    fn record(&self, record: InvocationRecord) -> CoveriResult<()> {
        match &self.trace {
            Some(trace) => trace.write(&record),
            None => Ok(()),
        }
    }
}

impl Actor for AtomicActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &ArtifactContract {
        &self.inputs
    }

    fn outputs(&self) -> &ArtifactContract {
        &self.outputs
    }

    fn act(&self, inputs: &Bindings) -> CoveriResult<Bindings> {
        let scoped = inputs.project(&self.inputs);
        let argv = self.build_argv(&scoped)?;
        let started_at = Utc::now();

        let request = ToolRequest {
            tool_id: self.descriptor.id.clone(),
            argv: argv.clone(),
            limits: self.descriptor.limits.clone(),
        };

        debug!(actor = %self.name, tool_id = %request.tool_id, argc = argv.len(), "invoking tool");

        let run = match self.runner.run(&request) {
            Ok(run) => run,
            Err(e) => {
                warn!(actor = %self.name, tool_id = %request.tool_id, error = %e, "tool invocation failed");
                let record = InvocationRecord {
                    actor: self.name.clone(),
                    tool_id: request.tool_id,
                    argv,
                    exit_code: None,
                    timed_out: false,
                    runtime_ms: 0,
                    outcome: InvocationOutcome::Failed { reason: e.to_string() },
                    started_at,
                };
                if let Err(trace_err) = self.record(record) {
                    warn!(actor = %self.name, error = %trace_err, "could not trace failed invocation");
                }
                return Err(e);
            }
        };

        info!(
            actor = %self.name,
            tool_id = %run.tool_id,
            exit_code = ?run.exit_code,
            timed_out = run.timed_out,
            runtime_ms = run.runtime.as_millis() as u64,
            "tool finished"
        );

        let extracted = self.backend.extract_result(&run);
        let record = InvocationRecord {
            actor: self.name.clone(),
            tool_id: run.tool_id.clone(),
            argv,
            exit_code: run.exit_code,
            timed_out: run.timed_out,
            runtime_ms: run.runtime.as_millis() as u64,
            outcome: match &extracted {
                Ok(outputs) => InvocationOutcome::Succeeded {
                    outputs: outputs.iter().map(|(n, a)| format!("{n}={a}")).collect(),
                },
                Err(e) => InvocationOutcome::Failed { reason: e.to_string() },
            },
            started_at,
        };

        match extracted {
            Ok(outputs) => {
                self.record(record)?;
                Ok(outputs)
            }
            Err(e) => {
                warn!(actor = %self.name, error = %e, "result extraction failed");
                if let Err(trace_err) = self.record(record) {
                    warn!(actor = %self.name, error = %trace_err, "could not trace failed extraction");
                }
                Err(e)
            }
        }
    }
}

/// Helper for backends: bind the single result file matching the
/// descriptor's pattern for `output`, or an absent artifact when none exists
/// and the kind tolerates it.
pub fn bind_result_file(
    run: &ToolRun,
    descriptor: &ToolDescriptor,
    output: &str,
    kind: ArtifactKind,
) -> CoveriResult<Artifact> {
    let pattern = descriptor.result_pattern(output).ok_or_else(|| CoveriError::Config {
        reason: format!("tool '{}' declares no result pattern for '{output}'", descriptor.id),
    })?;
    match crate::glob::find_result(run, output, pattern)? {
        Some(path) => Artifact::from_path(kind, path),
        None if kind.tolerates_absence() => Ok(Artifact::absent(kind)),
        None => Err(CoveriError::ToolInvocation {
            tool: run.tool_id.clone(),
            reason: format!("no result file for '{output}' matches '{pattern}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use coveriteam_contracts::{
        artifact::{Artifact, ArtifactKind},
        contract::{ArtifactContract, Bindings},
        error::{CoveriError, CoveriResult},
        execution::{InvocationOutcome, InvocationRecord},
        tool::{ToolDescriptor, ToolRequest, ToolRun},
    };

    use super::{bind_result_file, AtomicActor};
    use crate::executor::execute;
    use crate::traits::{ToolBackend, ToolRunner, TraceWriter};

    fn descriptor() -> ToolDescriptor {
        let mut result_files = BTreeMap::new();
        result_files.insert("witness".to_string(), "**/*.graphml".to_string());
        ToolDescriptor {
            id: "mock-verifier".to_string(),
            name: "Mock Verifier".to_string(),
            version: None,
            command: vec!["verify.sh".to_string()],
            options: vec!["--fast".to_string()],
            limits: Default::default(),
            result_files,
            verdict_rules: vec![],
        }
    }

    /// Records the request and returns a run whose result files are fixed.
    struct MockRunner {
        files: Vec<&'static str>,
        requests: Arc<Mutex<Vec<ToolRequest>>>,
        fail: bool,
    }

    impl ToolRunner for MockRunner {
        fn run(&self, request: &ToolRequest) -> CoveriResult<ToolRun> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(CoveriError::ToolInvocation {
                    tool: request.tool_id.clone(),
                    reason: "No such file or directory".to_string(),
                });
            }
            let out = PathBuf::from("/runs/mock/output");
            Ok(ToolRun {
                tool_id: request.tool_id.clone(),
                exit_code: Some(0),
                runtime: Duration::from_millis(5),
                timed_out: false,
                log_path: PathBuf::from("/runs/mock/output.log"),
                log_lines: vec!["done".to_string()],
                output_dir: out.clone(),
                result_files: self.files.iter().map(|f| out.join(f)).collect(),
            })
        }
    }

    struct WitnessBackend {
        descriptor: ToolDescriptor,
    }

    impl ToolBackend for WitnessBackend {
        fn prepare_args(&self, inputs: &Bindings) -> CoveriResult<Vec<String>> {
            let program = inputs.require("verifier", "program")?;
            Ok(vec![program.path().unwrap().display().to_string()])
        }

        fn extract_result(&self, run: &ToolRun) -> CoveriResult<Bindings> {
            let witness = bind_result_file(run, &self.descriptor, "witness", ArtifactKind::Witness)?;
            Ok(Bindings::new().with("witness", witness))
        }
    }

    #[derive(Default)]
    struct MockTrace {
        records: Arc<Mutex<Vec<InvocationRecord>>>,
    }

    impl TraceWriter for MockTrace {
        fn write(&self, record: &InvocationRecord) -> CoveriResult<()> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        fn finalize(&self, _run_id: &str) -> CoveriResult<()> {
            Ok(())
        }
    }

    fn actor(files: Vec<&'static str>, fail: bool) -> (AtomicActor, Arc<Mutex<Vec<ToolRequest>>>, Arc<Mutex<Vec<InvocationRecord>>>) {
        let requests = Arc::new(Mutex::new(vec![]));
        let trace = MockTrace::default();
        let records = trace.records.clone();
        let actor = AtomicActor::new(
            "verifier",
            descriptor(),
            ArtifactContract::new().with("program", ArtifactKind::Program),
            ArtifactContract::new().with("witness", ArtifactKind::Witness),
            Arc::new(WitnessBackend { descriptor: descriptor() }),
            Arc::new(MockRunner {
                files,
                requests: requests.clone(),
                fail,
            }),
        )
        .with_trace(Arc::new(trace));
        (actor, requests, records)
    }

    fn inputs() -> Bindings {
        Bindings::new().with("program", Artifact::program("/work/loop.c"))
    }

    #[test]
    fn argv_is_command_then_options_then_prepared_args() {
        let (actor, requests, _) = actor(vec!["witness.graphml"], false);
        execute(&actor, &inputs()).unwrap();

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].argv, vec!["verify.sh", "--fast", "/work/loop.c"]);
        assert_eq!(requests[0].tool_id, "mock-verifier");
    }

    #[test]
    fn single_result_file_becomes_witness() {
        let (actor, _, records) = actor(vec!["Statistics.txt", "witness.graphml"], false);
        let outputs = execute(&actor, &inputs()).unwrap();

        let witness = outputs.get("witness").unwrap();
        assert_eq!(witness.path(), Some(PathBuf::from("/runs/mock/output/witness.graphml").as_path()));
        assert!(matches!(
            records.lock().unwrap()[0].outcome,
            InvocationOutcome::Succeeded { .. }
        ));
    }

    #[test]
    fn missing_witness_is_absent_not_an_error() {
        let (actor, _, _) = actor(vec![], false);
        let outputs = execute(&actor, &inputs()).unwrap();
        assert!(outputs.get("witness").unwrap().is_absent());
    }

    #[test]
    fn ambiguous_witness_fails_and_is_traced() {
        let (actor, _, records) = actor(vec!["a.graphml", "b.graphml"], false);
        let err = execute(&actor, &inputs()).unwrap_err();

        assert!(matches!(err, CoveriError::AmbiguousResult { candidates: 2, .. }));
        assert!(matches!(
            records.lock().unwrap()[0].outcome,
            InvocationOutcome::Failed { .. }
        ));
    }

    #[test]
    fn spawn_failure_propagates_and_is_traced() {
        let (actor, _, records) = actor(vec![], true);
        let err = execute(&actor, &inputs()).unwrap_err();

        assert!(matches!(err, CoveriError::ToolInvocation { .. }));
        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].exit_code, None);
    }

    #[test]
    fn each_call_invokes_the_tool_again() {
        let (actor, requests, _) = actor(vec!["witness.graphml"], false);
        execute(&actor, &inputs()).unwrap();
        execute(&actor, &inputs()).unwrap();
        assert_eq!(requests.lock().unwrap().len(), 2, "atomic results must not be cached");
    }
}
