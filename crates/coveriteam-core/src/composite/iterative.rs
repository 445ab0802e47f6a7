//! Fixpoint iteration.
//!
//! The body's termination output is joined into an accumulator after every
//! round and fed back under the same name. The loop's inputs are the body's
//! inputs without the termination artifact, which may be left unbound.

use tracing::{debug, info, warn};

use coveriteam_contracts::{
    artifact::{Artifact, ArtifactKind},
    contract::{ArtifactContract, Bindings},
    error::{CoveriError, CoveriResult},
};

use crate::executor::execute;
use crate::traits::{Actor, ActorRef};

/// Where a fixpoint loop stands after a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// The round added something to the accumulator.
    Running,
    /// The round added nothing; the loop is done.
    Converged,
}

impl LoopState {
    /// Compare the accumulator before and after a round.
    pub fn after_round(previous: &Artifact, joined: &Artifact) -> Self {
        if joined == previous {
            Self::Converged
        } else {
            Self::Running
        }
    }
}

/// Repeat `body` until the accumulated value of the termination artifact
/// stops growing.
///
/// Each round joins the body's `termination` output into the accumulator and
/// feeds the accumulator back under the same name. The loop terminates for
/// every body whose goal space is finite, since join only ever grows the
/// accumulator. With a monotone body that grows it for `n` rounds, the body
/// runs `n + 1` times.
pub struct Iterative {
    name: String,
    termination: String,
    kind: ArtifactKind,
    inputs: ArtifactContract,
    body: ActorRef,
    max_rounds: Option<usize>,
}

impl Iterative {
    /// `termination` must name a body output of a joinable kind.
    pub fn new(termination: impl Into<String>, body: ActorRef) -> CoveriResult<Self> {
        let termination = termination.into();
        let kind = body.outputs().get(&termination).ok_or_else(|| {
            CoveriError::composition(format!(
                "termination artifact '{termination}' is not an output of '{}'",
                body.name()
            ))
        })?;
        if !kind.is_joinable() {
            return Err(CoveriError::composition(format!(
                "termination artifact '{termination}' has kind {kind}, which cannot be joined"
            )));
        }
        let inputs = body.inputs().iter().filter(|(name, _)| *name != termination).collect();
        Ok(Self {
            name: format!("repeat {} until '{termination}' is stable", body.name()),
            termination,
            kind,
            inputs,
            body,
            max_rounds: None,
        })
    }

    /// Fail with [`CoveriError::IterationLimit`] instead of starting round
    /// `rounds + 1`.
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Actor for Iterative {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &ArtifactContract {
        &self.inputs
    }

    fn outputs(&self) -> &ArtifactContract {
        self.body.outputs()
    }

    fn act(&self, inputs: &Bindings) -> CoveriResult<Bindings> {
        let empty = Artifact::absent(self.kind);
        if let Some(bound) = inputs.get(&self.termination) {
            if bound.kind() != self.kind {
                return Err(CoveriError::contract(
                    &self.name,
                    format!("input '{}' expects {}, got {}", self.termination, self.kind, bound.kind()),
                ));
            }
        }
        let mut accumulator = inputs.get(&self.termination).unwrap_or(&empty).join(&empty)?;
        let mut current = inputs.clone();
        current.insert(self.termination.clone(), accumulator.clone());

        let mut round = 0usize;
        loop {
            if self.max_rounds.is_some_and(|max| round >= max) {
                warn!(actor = %self.name, rounds = round, "iteration limit reached");
                return Err(CoveriError::IterationLimit { rounds: round });
            }
            round += 1;

            let mut outputs = execute(self.body.as_ref(), &current)?;
            let produced = outputs.require(&self.name, &self.termination)?;
            let joined = accumulator.join(produced)?;

            debug!(
                actor = %self.name,
                round,
                accumulated = joined.goals().map_or(0, |g| g.len()),
                "iteration round finished"
            );

            match LoopState::after_round(&accumulator, &joined) {
                LoopState::Converged => {
                    info!(actor = %self.name, rounds = round, "fixpoint reached");
                    outputs.insert(self.termination.clone(), joined);
                    return Ok(outputs);
                }
                LoopState::Running => {
                    current = current.merged(&outputs);
                    current.insert(self.termination.clone(), joined.clone());
                    accumulator = joined;
                }
            }
        }
    }
}
