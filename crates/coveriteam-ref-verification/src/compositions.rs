//! Reference compositions built from the workbench actors.
//!
//! ```text
//! validating verifier        verifier >> if verdict in {TRUE, FALSE} then validator else identity
//! verifier-based tester      test_spec→spec >> verifier >> witness2test
//! cooperative test gen.      repeat (generator >> test validator >> join goals) until covered_goals is stable
//! verifier portfolio         (verifier A >> rename) || (verifier B >> rename)
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use coveriteam_contracts::{
    artifact::ArtifactKind,
    error::CoveriResult,
    verdict::ResultClass,
};
use coveriteam_core::{
    composite::{Ite, Iterative, Parallel, Sequence},
    condition::Condition,
    traits::{Actor, ActorRef},
    utility::{CopyActor, IdentityActor, Joiner, KindConverter},
};

use crate::backends::{COVERED_GOALS, NEW_GOALS, SPEC, TEST_SPEC, VERDICT, WITNESS};

/// Run `verifier`; confirm a conclusive verdict with `validator`.
///
/// An `UNKNOWN` or `ERROR` verdict is passed on as is.
pub fn validating_verifier(verifier: ActorRef, validator: ActorRef) -> CoveriResult<Sequence> {
    let skip: ActorRef = Arc::new(IdentityActor::of(validator.as_ref()));
    let conclusive = Condition::element_of(VERDICT, [ResultClass::True, ResultClass::False]);
    let check: ActorRef = Arc::new(Ite::new(conclusive, validator, skip)?);
    Ok(Sequence::new(verifier, check)?.named("validating verifier"))
}

/// Generate a test suite by verifying a coverage property and turning the
/// violation witness into a test.
///
/// Consumes `program` and `test_spec`.
pub fn verifier_based_tester(verifier: ActorRef, witness_to_test: ActorRef) -> CoveriResult<Sequence> {
    let as_spec: ActorRef = Arc::new(KindConverter::test_spec_to_spec(TEST_SPEC, SPEC));
    Ok(Sequence::chain([as_spec, verifier, witness_to_test])?.named("verifier-based tester"))
}

/// Let `generator` write tests for uncovered goals and `test_validator`
/// measure them until no round covers anything new.
///
/// Consumes `program`, `test_spec` and the goals covered so far under
/// `covered_goals`.
pub fn cooperative_test_generation(generator: ActorRef, test_validator: ActorRef) -> CoveriResult<Iterative> {
    let join: ActorRef = Arc::new(Joiner::new(
        ArtifactKind::TestGoal,
        [COVERED_GOALS, NEW_GOALS],
        COVERED_GOALS,
    )?);
    let round: ActorRef = Arc::new(Sequence::chain([generator, test_validator, join])?);
    Ok(Iterative::new(COVERED_GOALS, round)?.named("cooperative test generation"))
}

/// Run two verifiers side by side on the same task.
///
/// The outputs of each verifier are suffixed with its name so that both
/// results survive: `verdict_<name>`, `witness_<name>`.
pub fn verifier_portfolio(a: ActorRef, b: ActorRef) -> CoveriResult<Parallel> {
    Ok(Parallel::new(tagged(a)?, tagged(b)?)?.named("verifier portfolio"))
}

/// Output name of `name` for the verifier called `verifier` in a portfolio.
pub fn portfolio_output(name: &str, verifier: &str) -> String {
    format!("{name}_{verifier}")
}

fn tagged(verifier: ActorRef) -> CoveriResult<ActorRef> {
    let renames: BTreeMap<String, String> = [VERDICT, WITNESS]
        .into_iter()
        .map(|name| (name.to_string(), portfolio_output(name, verifier.name())))
        .collect();
    let rename: ActorRef = Arc::new(CopyActor::renaming(verifier.outputs().clone(), renames)?);
    Ok(Arc::new(Sequence::new(verifier, rename)?))
}
