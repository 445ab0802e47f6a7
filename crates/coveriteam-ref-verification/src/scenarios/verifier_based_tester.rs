//! Scenario: verifier-based tester
//!
//! A coverage goal is turned into a reachability property, the verifier
//! finds a path to it, and the violation witness is converted into a test.

use coveriteam_contracts::{
    artifact::ArtifactKind,
    contract::Bindings,
    error::CoveriResult,
};
use coveriteam_core::{executor::RunReport, traits::Actor};

use crate::backends::{PROGRAM, TEST_SPEC, TEST_SUITE};
use crate::compositions::verifier_based_tester;
use crate::workbench::Workbench;

use super::{print_outputs, print_trace_summary, VERIFIER, WITNESS_TO_TEST};

pub const TEST_PROPERTY: &str = "coverage-error-call.prp";

pub fn run(bench: &Workbench, program: &str) -> CoveriResult<RunReport> {
    let pipeline = verifier_based_tester(bench.verifier(VERIFIER)?, bench.witness_to_test(WITNESS_TO_TEST)?)?;
    let inputs = Bindings::new()
        .with(PROGRAM, bench.input(ArtifactKind::Program, program)?)
        .with(TEST_SPEC, bench.input(ArtifactKind::TestSpecification, TEST_PROPERTY)?);

    println!("  Pipeline: {}", pipeline.name());
    println!("  Program:  {program}");
    bench.engine().run(&pipeline, &inputs)
}

pub fn run_scenario(bench: &Workbench) -> CoveriResult<()> {
    println!("=== Scenario 2: Verifier-based tester ===");
    println!();

    let report = run(bench, "unsafe-sum.c")?;
    let generated = report.outputs.get(TEST_SUITE).is_some_and(|s| !s.is_absent());
    println!(
        "  Run {}: {}",
        report.run_id,
        if generated { "test suite generated" } else { "no test generated" }
    );
    print_outputs(&report.outputs);
    println!();

    print_trace_summary(bench);
    println!();
    println!("  Scenario 2 complete.");
    println!();
    Ok(())
}
