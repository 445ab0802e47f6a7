//! Scenario: cooperative test generation
//!
//! A test generator and a test-suite validator take turns: the generator
//! writes a test for some goal not covered yet, the validator measures which
//! goals the new tests reach, and the loop stops once a round covers nothing
//! new. No goal counts as covered at the start. `branches.c` has three
//! goals, so the generator runs four times.

use coveriteam_contracts::{
    artifact::ArtifactKind,
    contract::Bindings,
    error::CoveriResult,
};
use coveriteam_core::{executor::RunReport, traits::Actor};

use crate::backends::{COVERED_GOALS, PROGRAM, TEST_SPEC};
use crate::compositions::cooperative_test_generation;
use crate::workbench::Workbench;

use super::{print_trace_summary, TEST_GENERATOR, TEST_VALIDATOR};

pub const TEST_PROPERTY: &str = "coverage-branches.prp";

/// Upper bound on generator rounds; the bundled programs need far fewer.
const MAX_ROUNDS: usize = 16;

pub fn run(bench: &Workbench, program: &str) -> CoveriResult<RunReport> {
    let pipeline = cooperative_test_generation(
        bench.test_generator(TEST_GENERATOR)?,
        bench.test_validator(TEST_VALIDATOR)?,
    )?
    .with_max_rounds(MAX_ROUNDS);
    let inputs = Bindings::new()
        .with(PROGRAM, bench.input(ArtifactKind::Program, program)?)
        .with(TEST_SPEC, bench.input(ArtifactKind::TestSpecification, TEST_PROPERTY)?);

    println!("  Pipeline: {}", pipeline.name());
    println!("  Program:  {program}");
    bench.engine().run(&pipeline, &inputs)
}

pub fn run_scenario(bench: &Workbench) -> CoveriResult<()> {
    println!("=== Scenario 3: Cooperative test generation ===");
    println!();

    let recorded_before = bench.trace().len();
    let report = run(bench, "branches.c")?;
    let covered = report
        .outputs
        .get(COVERED_GOALS)
        .and_then(|g| g.goals())
        .unwrap_or_default();

    println!("  Run {}", report.run_id);
    println!("  Covered goals:          {}", covered.into_iter().collect::<Vec<_>>().join(", "));
    println!(
        "  Tool invocations:       {}",
        bench.trace().len() - recorded_before
    );
    println!();

    print_trace_summary(bench);
    println!();
    println!("  Scenario 3 complete.");
    println!();
    Ok(())
}
