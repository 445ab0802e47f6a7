//! Parallel composition.
//!
//! Both actors receive the same bindings. Their inputs are unioned and
//! their outputs must be disjoint.

use std::thread;

use tracing::{debug, warn};

use coveriteam_contracts::{
    contract::{ArtifactContract, Bindings},
    error::{CoveriError, CoveriResult},
};

use crate::executor::execute;
use crate::traits::{Actor, ActorRef};

/// Run two actors concurrently on the same bindings and merge their outputs.
///
/// Both branches always run to completion; there is no cancellation. When
/// both fail, the error of the first branch is returned.
pub struct Parallel {
    name: String,
    first: ActorRef,
    second: ActorRef,
    inputs: ArtifactContract,
    outputs: ArtifactContract,
}

impl Parallel {
    pub fn new(first: ActorRef, second: ActorRef) -> CoveriResult<Self> {
        let inputs = first.inputs().union(second.inputs())?;
        let outputs = first.outputs().disjoint_union(second.outputs())?;
        Ok(Self {
            name: format!("{} || {}", first.name(), second.name()),
            first,
            second,
            inputs,
            outputs,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Actor for Parallel {
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
        debug!(actor = %self.name, "forking branches");
        let (left, right) = thread::scope(|s| {
            let left = s.spawn(|| execute(self.first.as_ref(), inputs));
            let right = s.spawn(|| execute(self.second.as_ref(), inputs));
            (left.join(), right.join())
        });

        let left = self.unwind(self.first.as_ref(), left)?;
        let right = self.unwind(self.second.as_ref(), right)?;
        Ok(left.merged(&right))
    }
}

impl Parallel {
    fn unwind(
        &self,
        branch: &dyn Actor,
        joined: thread::Result<CoveriResult<Bindings>>,
    ) -> CoveriResult<Bindings> {
        match joined {
            Ok(result) => result,
            Err(_) => {
                warn!(actor = %self.name, branch = %branch.name(), "branch panicked");
                Err(CoveriError::ActorPanicked {
                    actor: branch.name().to_string(),
                })
            }
        }
    }
}
