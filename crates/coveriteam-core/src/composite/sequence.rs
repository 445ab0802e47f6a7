//! Sequential composition.
//!
//! The second actor's inputs are satisfied by the first actor's outputs
//! where the names match, and by the caller's bindings otherwise. A name
//! produced and consumed under incompatible kinds is a wiring error.

use std::sync::Arc;

use tracing::debug;

use coveriteam_contracts::{
    contract::{ArtifactContract, Bindings},
    error::{CoveriError, CoveriResult},
};

use crate::executor::execute;
use crate::traits::{Actor, ActorRef};

/// Run `first`, then `second` on the caller's bindings extended with
/// everything `first` produced.
pub struct Sequence {
    name: String,
    first: ActorRef,
    second: ActorRef,
}

impl Sequence {
    /// Fails with [`CoveriError::Composition`] when `first` produces a name
    /// that `second` consumes with an incompatible kind.
    pub fn new(first: ActorRef, second: ActorRef) -> CoveriResult<Self> {
        for (name, wanted) in second.inputs().iter() {
            if let Some(produced) = first.outputs().get(name) {
                if !produced.is_a(wanted) {
                    return Err(CoveriError::composition(format!(
                        "'{}' produces '{name}' as {produced}, but '{}' consumes it as {wanted}",
                        first.name(),
                        second.name()
                    )));
                }
            }
        }
        Ok(Self {
            name: format!("{} >> {}", first.name(), second.name()),
            first,
            second,
        })
    }

    /// Right-nested sequence of two or more actors: `a >> (b >> c)`.
    ///
    /// Every actor sees the caller's bindings plus the outputs of all actors
    /// before it.
    pub fn chain<I>(actors: I) -> CoveriResult<Self>
    where
        I: IntoIterator<Item = ActorRef>,
    {
        let mut actors: Vec<ActorRef> = actors.into_iter().collect();
        let (Some(last), Some(before_last)) = (actors.pop(), actors.pop()) else {
            return Err(CoveriError::composition("a sequence needs at least two actors"));
        };
        let mut seq = Self::new(before_last, last)?;
        while let Some(previous) = actors.pop() {
            seq = Self::new(previous, Arc::new(seq))?;
        }
        Ok(seq)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Actor for Sequence {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &ArtifactContract {
        self.first.inputs()
    }

    fn outputs(&self) -> &ArtifactContract {
        self.second.outputs()
    }

    fn act(&self, inputs: &Bindings) -> CoveriResult<Bindings> {
        let intermediate = execute(self.first.as_ref(), inputs)?;
        debug!(actor = %self.name, handed_over = intermediate.len(), "sequence step");
        execute(self.second.as_ref(), &inputs.merged(&intermediate))
    }
}
