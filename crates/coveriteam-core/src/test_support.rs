//! Spy and closure-backed actors shared by the unit tests of this crate.

use std::sync::{Arc, Mutex};

use coveriteam_contracts::{
    artifact::{Artifact, ArtifactKind},
    contract::{ArtifactContract, Bindings},
    error::CoveriResult,
};

use crate::traits::Actor;

type ActFn = Box<dyn Fn(&Bindings) -> CoveriResult<Bindings> + Send + Sync>;

/// An actor whose behaviour is a closure.
pub struct FnActor {
    name: String,
    inputs: ArtifactContract,
    outputs: ArtifactContract,
    act: ActFn,
}

impl FnActor {
    pub fn new(
        name: &str,
        inputs: ArtifactContract,
        outputs: ArtifactContract,
        act: impl Fn(&Bindings) -> CoveriResult<Bindings> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            inputs,
            outputs,
            act: Box::new(act),
        }
    }
}

impl Actor for FnActor {
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
        (self.act)(inputs)
    }
}

/// An actor that always produces the same single output and counts its calls.
pub struct SpyActor {
    name: String,
    inputs: ArtifactContract,
    outputs: ArtifactContract,
    output_name: String,
    output: Artifact,
    calls: Arc<Mutex<u32>>,
}

impl SpyActor {
    pub fn producing(name: &str, output_name: &str, output: Artifact) -> Self {
        Self {
            name: name.to_string(),
            inputs: ArtifactContract::new(),
            outputs: ArtifactContract::new().with(output_name, output.kind()),
            output_name: output_name.to_string(),
            output,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn consuming(mut self, name: &str, kind: ArtifactKind) -> Self {
        self.inputs = self.inputs.with(name, kind);
        self
    }

    pub fn calls(&self) -> Arc<Mutex<u32>> {
        self.calls.clone()
    }
}

impl Actor for SpyActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &ArtifactContract {
        &self.inputs
    }

    fn outputs(&self) -> &ArtifactContract {
        &self.outputs
    }

    fn act(&self, _inputs: &Bindings) -> CoveriResult<Bindings> {
        *self.calls.lock().unwrap() += 1;
        Ok(Bindings::new().with(self.output_name.clone(), self.output.clone()))
    }
}
