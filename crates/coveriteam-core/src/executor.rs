//! The execution engine: contract enforcement around every actor call.
//!
//! Every combinator dispatches its children through [`execute`], so the
//! actor invariant holds at each level of a composition tree:
//!
//!   check inputs → `Actor::act` → check outputs
//!
//! Inputs must cover the declared contract (extra bindings are allowed and
//! forwarded); outputs must match it exactly. Errors are never wrapped: the
//! first failure anywhere in the tree is what the root caller receives.

use std::sync::Arc;

use tracing::{debug, info, warn};

use coveriteam_contracts::{
    contract::Bindings,
    error::{CoveriError, CoveriResult},
    execution::RunId,
};

use crate::traits::{Actor, TraceWriter};

/// Run `actor` on `inputs` with contract checks on both sides.
pub fn execute(actor: &dyn Actor, inputs: &Bindings) -> CoveriResult<Bindings> {
    check_inputs(actor, inputs)?;

    debug!(actor = %actor.name(), bound = inputs.len(), "actor starting");
    let outputs = actor.act(inputs)?;

    check_outputs(actor, &outputs)?;
    debug!(actor = %actor.name(), produced = outputs.len(), "actor finished");
    Ok(outputs)
}

fn check_inputs(actor: &dyn Actor, inputs: &Bindings) -> CoveriResult<()> {
    for (name, declared) in actor.inputs().iter() {
        let Some(artifact) = inputs.get(name) else {
            warn!(actor = %actor.name(), artifact = %name, "required input is not bound");
            return Err(CoveriError::contract(
                actor.name(),
                format!("input '{name}' ({declared}) is not bound"),
            ));
        };
        if !artifact.kind().is_a(declared) {
            warn!(actor = %actor.name(), artifact = %name, "input kind mismatch");
            return Err(CoveriError::contract(
                actor.name(),
                format!("input '{name}' expects {declared}, got {}", artifact.kind()),
            ));
        }
    }
    Ok(())
}

fn check_outputs(actor: &dyn Actor, outputs: &Bindings) -> CoveriResult<()> {
    let declared = actor.outputs();

    if let Some(extra) = outputs.names().find(|n| !declared.contains(n)) {
        return Err(CoveriError::contract(
            actor.name(),
            format!("produced undeclared output '{extra}'"),
        ));
    }
    if let Some(missing) = outputs.missing(declared).into_iter().next() {
        return Err(CoveriError::contract(
            actor.name(),
            format!("declared output '{missing}' was not produced"),
        ));
    }
    for (name, artifact) in outputs.iter() {
        if let Some(kind) = declared.get(name) {
            if !artifact.kind().is_a(kind) {
                return Err(CoveriError::contract(
                    actor.name(),
                    format!("output '{name}' expects {kind}, got {}", artifact.kind()),
                ));
            }
        }
    }
    Ok(())
}

/// The outcome of one top-level run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: RunId,
    pub outputs: Bindings,
}

/// Drives one composition tree from its root.
///
/// The engine never caches results: atomic actors are not deterministic, so
/// every call re-executes the whole tree.
#[derive(Default)]
pub struct Engine {
    trace: Option<Arc<dyn TraceWriter>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finalize `trace` at the end of every run.
    ///
    /// The atomic actors of the tree write their records to the same trace;
    /// the engine only seals it.
    pub fn with_trace(trace: Arc<dyn TraceWriter>) -> Self {
        Self { trace: Some(trace) }
    }

    /// Execute `root` with `inputs` and return its outputs.
    pub fn run(&self, root: &dyn Actor, inputs: &Bindings) -> CoveriResult<RunReport> {
        let run_id = RunId::new();
        info!(run_id = %run_id, actor = %root.name(), "pipeline run starting");

        let result = execute(root, inputs);

        match &result {
            Ok(outputs) => {
                info!(run_id = %run_id, produced = outputs.len(), "pipeline run finished");
            }
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "pipeline run failed");
            }
        }

        if let Some(trace) = &self.trace {
            let sealed = trace.finalize(&run_id.to_string());
            // A run failure takes precedence over a trace failure.
            if result.is_ok() {
                sealed?;
            } else if let Err(e) = sealed {
                warn!(run_id = %run_id, error = %e, "trace finalization failed");
            }
        }

        result.map(|outputs| RunReport { run_id, outputs })
    }
}
