//! Actors that do not invoke tools: joining, copying, renaming, projecting
//! and re-tagging artifacts.

use std::collections::BTreeMap;

use coveriteam_contracts::{
    artifact::{Artifact, ArtifactKind},
    contract::{ArtifactContract, Bindings},
    error::{CoveriError, CoveriResult},
};

use crate::traits::Actor;

/// Folds `join` over several artifacts of one joinable kind.
pub struct Joiner {
    name: String,
    kind: ArtifactKind,
    output: String,
    inputs: ArtifactContract,
    outputs: ArtifactContract,
}

impl Joiner {
    pub fn new<I, S>(kind: ArtifactKind, inputs: I, output: impl Into<String>) -> CoveriResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !kind.is_joinable() {
            return Err(CoveriError::composition(format!("{kind} artifacts cannot be joined")));
        }
        let inputs: ArtifactContract = inputs.into_iter().map(|n| (n, kind)).collect();
        if inputs.is_empty() {
            return Err(CoveriError::composition("a joiner needs at least one input"));
        }
        let output = output.into();
        Ok(Self {
            name: format!("join into '{output}'"),
            kind,
            outputs: ArtifactContract::new().with(output.clone(), kind),
            output,
            inputs,
        })
    }
}

impl Actor for Joiner {
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
        let mut joined = Artifact::absent(self.kind);
        for name in self.inputs.names() {
            joined = joined.join(inputs.require(&self.name, name)?)?;
        }
        Ok(Bindings::new().with(self.output.clone(), joined))
    }
}

/// Forwards artifacts unchanged, optionally under new names.
pub struct CopyActor {
    name: String,
    renames: BTreeMap<String, String>,
    inputs: ArtifactContract,
    outputs: ArtifactContract,
}

impl CopyActor {
    pub fn new(contract: ArtifactContract) -> Self {
        let name = format!("copy({})", contract.names().collect::<Vec<_>>().join(", "));
        Self {
            name,
            renames: BTreeMap::new(),
            outputs: contract.clone(),
            inputs: contract,
        }
    }

    /// Expose `contract`'s artifacts under the names in `renames`. Names
    /// without an entry keep their name; two artifacts may not land on the
    /// same name.
    pub fn renaming(contract: ArtifactContract, renames: BTreeMap<String, String>) -> CoveriResult<Self> {
        let outputs = contract.renamed(&renames)?;
        let pairs: Vec<String> = renames.iter().map(|(from, to)| format!("{from}->{to}")).collect();
        Ok(Self {
            name: format!("rename({})", pairs.join(", ")),
            renames,
            inputs: contract,
            outputs,
        })
    }
}

impl Actor for CopyActor {
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
        let mut out = Bindings::new();
        for name in self.inputs.names() {
            let target = self.renames.get(name).map_or(name, String::as_str);
            out.insert(target, inputs.require(&self.name, name)?.clone());
        }
        Ok(out)
    }
}

/// Passes through (a subset of) another actor's outputs.
///
/// Used as the "skip" branch of a conditional: it has exactly the output
/// contract of the actor it stands in for, so both branches line up.
pub struct IdentityActor {
    name: String,
    contract: ArtifactContract,
}

impl IdentityActor {
    pub fn of(actor: &dyn Actor) -> Self {
        Self {
            name: format!("identity({})", actor.name()),
            contract: actor.outputs().clone(),
        }
    }

    pub fn project<'a, I>(actor: &dyn Actor, names: I) -> CoveriResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        Ok(Self {
            name: format!("identity({})", actor.name()),
            contract: actor.outputs().project(names)?,
        })
    }
}

impl Actor for IdentityActor {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &ArtifactContract {
        &self.contract
    }

    fn outputs(&self) -> &ArtifactContract {
        &self.contract
    }

    fn act(&self, inputs: &Bindings) -> CoveriResult<Bindings> {
        Ok(inputs.project(&self.contract))
    }
}

/// Re-tags a file artifact with another kind, keeping its path.
pub struct KindConverter {
    name: String,
    input: String,
    output: String,
    target: ArtifactKind,
    inputs: ArtifactContract,
    outputs: ArtifactContract,
}

impl KindConverter {
    fn new(from: ArtifactKind, to: ArtifactKind, input: String, output: String) -> Self {
        Self {
            name: format!("{from} to {to}"),
            inputs: ArtifactContract::new().with(input.clone(), from),
            outputs: ArtifactContract::new().with(output.clone(), to),
            input,
            output,
            target: to,
        }
    }

    pub fn test_spec_to_spec(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(
            ArtifactKind::TestSpecification,
            ArtifactKind::Specification,
            input.into(),
            output.into(),
        )
    }

    pub fn spec_to_test_spec(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self::new(
            ArtifactKind::Specification,
            ArtifactKind::TestSpecification,
            input.into(),
            output.into(),
        )
    }
}

impl Actor for KindConverter {
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
        let converted = inputs.require(&self.name, &self.input)?.retagged(self.target)?;
        Ok(Bindings::new().with(self.output.clone(), converted))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use coveriteam_contracts::{
        artifact::{Artifact, ArtifactKind},
        contract::{ArtifactContract, Bindings},
        error::CoveriError,
    };

    use super::{CopyActor, IdentityActor, Joiner, KindConverter};
    use crate::composite::{Parallel, Sequence};
    use crate::executor::execute;
    use crate::test_support::SpyActor;
    use crate::traits::{Actor, ActorRef};

    #[test]
    fn joiner_unions_goal_sets() {
        let joiner = Joiner::new(ArtifactKind::TestGoal, ["a", "b"], "all").unwrap();
        let inputs = Bindings::new()
            .with("a", Artifact::test_goals(["g1", "g2"]))
            .with("b", Artifact::test_goals(["g2", "g3"]));

        let out = execute(&joiner, &inputs).unwrap();

        assert_eq!(out.get("all"), Some(&Artifact::test_goals(["g1", "g2", "g3"])));
    }

    #[test]
    fn joiner_rejects_non_joinable_kinds_and_empty_inputs() {
        assert!(matches!(
            Joiner::new(ArtifactKind::Witness, ["a"], "out"),
            Err(CoveriError::Composition { .. })
        ));
        assert!(matches!(
            Joiner::new(ArtifactKind::TestGoal, Vec::<String>::new(), "out"),
            Err(CoveriError::Composition { .. })
        ));
    }

    #[test]
    fn identity_then_copy_forwards_the_artifact() {
        let x = SpyActor::producing("x", "out", Artifact::program("p.c"));
        let identity: ActorRef = Arc::new(IdentityActor::of(&x));
        let copy: ActorRef = Arc::new(CopyActor::new(
            ArtifactContract::new().with("out", ArtifactKind::Program),
        ));
        let seq = Sequence::new(identity, copy).unwrap();

        let out = execute(&seq, &Bindings::new().with("out", Artifact::program("p.c"))).unwrap();

        assert_eq!(out.get("out"), Some(&Artifact::program("p.c")));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn parallel_copies_keep_both_names() {
        let a: ActorRef = Arc::new(CopyActor::new(ArtifactContract::new().with("a", ArtifactKind::Program)));
        let b: ActorRef = Arc::new(CopyActor::new(ArtifactContract::new().with("b", ArtifactKind::Witness)));
        let par = Parallel::new(a, b).unwrap();
        let inputs = Bindings::new()
            .with("a", Artifact::program("a.c"))
            .with("b", Artifact::witness("b.graphml"));

        assert_eq!(execute(&par, &inputs).unwrap(), inputs);
    }

    #[test]
    fn rename_exposes_new_names() {
        let mut renames = BTreeMap::new();
        renames.insert("witness".to_string(), "candidate".to_string());
        let rename = CopyActor::renaming(
            ArtifactContract::new()
                .with("witness", ArtifactKind::Witness)
                .with("program", ArtifactKind::Program),
            renames,
        )
        .unwrap();

        assert_eq!(rename.outputs().names().collect::<Vec<_>>(), vec!["candidate", "program"]);
        let out = execute(
            &rename,
            &Bindings::new()
                .with("witness", Artifact::witness("w.graphml"))
                .with("program", Artifact::program("p.c")),
        )
        .unwrap();
        assert_eq!(out.get("candidate"), Some(&Artifact::witness("w.graphml")));
    }

    #[test]
    fn rename_onto_an_existing_name_is_rejected() {
        let mut renames = BTreeMap::new();
        renames.insert("witness".to_string(), "program".to_string());
        let contract = ArtifactContract::new()
            .with("witness", ArtifactKind::Witness)
            .with("program", ArtifactKind::Program);

        assert!(CopyActor::renaming(contract, renames).is_err());
    }

    #[test]
    fn identity_projection_keeps_selected_outputs() {
        let validator = SpyActor::producing("validator", "verdict", Artifact::program("unused.c"));
        let id = IdentityActor::project(&validator, ["verdict"]).unwrap();
        assert_eq!(id.inputs(), id.outputs());

        assert!(IdentityActor::project(&validator, ["witness"]).is_err());
    }

    #[test]
    fn kind_converters_keep_the_path() {
        let to_spec = KindConverter::test_spec_to_spec("test_spec", "spec");
        let out = execute(
            &to_spec,
            &Bindings::new().with("test_spec", Artifact::test_specification("coverage-branches.prp")),
        )
        .unwrap();
        assert_eq!(out.get("spec"), Some(&Artifact::specification("coverage-branches.prp")));

        let back = KindConverter::spec_to_test_spec("spec", "test_spec");
        let out = execute(&back, &out).unwrap();
        assert_eq!(
            out.get("test_spec"),
            Some(&Artifact::test_specification("coverage-branches.prp"))
        );
    }
}
