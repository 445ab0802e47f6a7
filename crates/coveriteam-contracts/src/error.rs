//! Runtime error types for the CoVeriTeam composition runtime.
//!
//! All fallible operations return `CoveriResult<T>`. Composite actors never
//! wrap or translate the errors of their children: whatever a leaf produced
//! is what the root caller receives.

use thiserror::Error;

/// The unified error type for the CoVeriTeam runtime.
#[derive(Debug, Error)]
pub enum CoveriError {
    /// Static wiring error detected while composing actors.
    ///
    /// Always raised by a constructor, before any subprocess is spawned.
    #[error("composition error: {reason}")]
    Composition { reason: String },

    /// A tool subprocess could not be started or terminated abnormally.
    #[error("tool '{tool}' invocation failed: {reason}")]
    ToolInvocation { tool: String, reason: String },

    /// More than one result file matched a single-valued output pattern.
    #[error("ambiguous result for output '{output}': {candidates} files match '{pattern}'")]
    AmbiguousResult {
        output: String,
        pattern: String,
        candidates: usize,
    },

    /// A condition referenced an unbound artifact or could not be evaluated.
    #[error("condition evaluation failed: {reason}")]
    Evaluation { reason: String },

    /// An actor was invoked with, or produced, bindings that break its contract.
    #[error("contract violation in actor '{actor}': {reason}")]
    ContractViolation { actor: String, reason: String },

    /// An iterative composition ran out of rounds before reaching a fixpoint.
    #[error("no fixpoint reached after {rounds} rounds")]
    IterationLimit { rounds: usize },

    /// A parallel branch panicked instead of returning.
    #[error("actor '{actor}' panicked during execution")]
    ActorPanicked { actor: String },

    /// A tool descriptor or other configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// The invocation trace could not record an entry.
    #[error("trace write failed: {reason}")]
    TraceWriteFailed { reason: String },
}

impl CoveriError {
    /// Shorthand for [`CoveriError::Composition`].
    pub fn composition(reason: impl Into<String>) -> Self {
        Self::Composition { reason: reason.into() }
    }

    /// Shorthand for [`CoveriError::Evaluation`].
    pub fn evaluation(reason: impl Into<String>) -> Self {
        Self::Evaluation { reason: reason.into() }
    }

    /// Shorthand for [`CoveriError::ContractViolation`].
    pub fn contract(actor: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ContractViolation {
            actor: actor.into(),
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the CoVeriTeam crates.
pub type CoveriResult<T> = Result<T, CoveriError>;
