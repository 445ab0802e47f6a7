//! Conditional composition.
//!
//! The condition is evaluated over the bound inputs. Both branches must
//! declare the same outputs; the inputs are the union of both branches.

use tracing::debug;

use coveriteam_contracts::{
    contract::{ArtifactContract, Bindings},
    error::{CoveriError, CoveriResult},
};

use crate::condition::Condition;
use crate::executor::execute;
use crate::traits::{Actor, ActorRef};

/// If-then-else over artifact metadata. Exactly one branch executes.
pub struct Ite {
    name: String,
    condition: Condition,
    then_branch: ActorRef,
    else_branch: ActorRef,
    inputs: ArtifactContract,
}

impl Ite {
    /// Both branches must declare the same output contract. Passing the same
    /// actor for both branches is allowed.
    pub fn new(condition: Condition, then_branch: ActorRef, else_branch: ActorRef) -> CoveriResult<Self> {
        if then_branch.outputs() != else_branch.outputs() {
            return Err(CoveriError::composition(format!(
                "branches '{}' and '{}' declare different outputs",
                then_branch.name(),
                else_branch.name()
            )));
        }
        let inputs = then_branch.inputs().union(else_branch.inputs())?;
        condition.check_against(&inputs)?;

        Ok(Self {
            name: format!("if {condition} then {} else {}", then_branch.name(), else_branch.name()),
            condition,
            then_branch,
            else_branch,
            inputs,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }
}

impl Actor for Ite {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &ArtifactContract {
        &self.inputs
    }

    fn outputs(&self) -> &ArtifactContract {
        self.then_branch.outputs()
    }

    fn act(&self, inputs: &Bindings) -> CoveriResult<Bindings> {
        let holds = self.condition.evaluate(inputs)?;
        let branch = if holds { &self.then_branch } else { &self.else_branch };
        debug!(actor = %self.name, holds, branch = %branch.name(), "condition evaluated");
        execute(branch.as_ref(), inputs)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use coveriteam_contracts::{
        artifact::{Artifact, ArtifactKind},
        contract::Bindings,
        error::CoveriError,
        verdict::{ResultClass, Verdict},
    };

    use super::Ite;
    use crate::condition::Condition;
    use crate::executor::execute;
    use crate::test_support::SpyActor;
    use crate::traits::{Actor, ActorRef};

    fn verdict(class: ResultClass) -> Bindings {
        Bindings::new().with("verdict", Artifact::verdict(Verdict::of(class)))
    }

    #[test]
    fn only_the_selected_branch_runs() {
        let then_spy = SpyActor::producing("validate", "witness", Artifact::witness("v.graphml"));
        let else_spy = SpyActor::producing("skip", "witness", Artifact::witness("s.graphml"));
        let (then_calls, else_calls) = (then_spy.calls(), else_spy.calls());
        let ite = Ite::new(
            Condition::element_of("verdict", [ResultClass::True, ResultClass::False]),
            Arc::new(then_spy),
            Arc::new(else_spy),
        )
        .unwrap();

        let out = execute(&ite, &verdict(ResultClass::False)).unwrap();
        assert_eq!(out.get("witness"), Some(&Artifact::witness("v.graphml")));
        assert_eq!((*then_calls.lock().unwrap(), *else_calls.lock().unwrap()), (1, 0));

        let out = execute(&ite, &verdict(ResultClass::Unknown)).unwrap();
        assert_eq!(out.get("witness"), Some(&Artifact::witness("s.graphml")));
        assert_eq!((*then_calls.lock().unwrap(), *else_calls.lock().unwrap()), (1, 1));
    }

    #[test]
    fn same_actor_on_both_branches_is_valid() {
        let spy = SpyActor::producing("w2test", "suite", Artifact::test_suite("suite.zip"));
        let calls = spy.calls();
        let shared: ActorRef = Arc::new(spy);
        let ite = Ite::new(Condition::Const(true), shared.clone(), shared).unwrap();

        execute(&ite, &Bindings::new()).unwrap();
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[test]
    fn branches_with_different_outputs_are_rejected() {
        let a: ActorRef = Arc::new(SpyActor::producing("a", "witness", Artifact::witness("w")));
        let b: ActorRef = Arc::new(SpyActor::producing("b", "suite", Artifact::test_suite("t")));

        assert!(matches!(
            Ite::new(Condition::Const(true), a, b),
            Err(CoveriError::Composition { .. })
        ));
    }

    #[test]
    fn verdict_test_over_a_declared_program_is_rejected() {
        let a: ActorRef = Arc::new(
            SpyActor::producing("a", "witness", Artifact::witness("w")).consuming("verdict", ArtifactKind::Program),
        );
        let cond = Condition::element_of("verdict", [ResultClass::True]);

        assert!(matches!(
            Ite::new(cond, a.clone(), a),
            Err(CoveriError::Composition { .. })
        ));
    }

    #[test]
    fn unbound_condition_name_fails_evaluation() {
        let spy = SpyActor::producing("a", "witness", Artifact::witness("w"));
        let calls = spy.calls();
        let shared: ActorRef = Arc::new(spy);
        let ite = Ite::new(Condition::Name("verdict".into()), shared.clone(), shared).unwrap();

        let err = execute(&ite, &Bindings::new()).unwrap_err();

        assert!(matches!(err, CoveriError::Evaluation { .. }));
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn name_reflects_the_condition() {
        let a: ActorRef = Arc::new(SpyActor::producing("a", "witness", Artifact::witness("w")));
        let ite = Ite::new(Condition::Const(false), a.clone(), a).unwrap();
        assert_eq!(ite.name(), "if false then a else a");
    }
}
