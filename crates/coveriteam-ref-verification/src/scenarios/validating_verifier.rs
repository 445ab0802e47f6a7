//! Scenario: validating verifier
//!
//! A verifier checks a program against `unreach-call.prp`; conclusive
//! verdicts are handed to a witness validator, inconclusive ones are passed
//! on unchanged. Runs once on a buggy and once on a correct program.

use coveriteam_contracts::{
    artifact::ArtifactKind,
    contract::Bindings,
    error::CoveriResult,
};
use coveriteam_core::{executor::RunReport, traits::Actor};

use crate::backends::{PROGRAM, SPEC, VERDICT};
use crate::compositions::validating_verifier;
use crate::workbench::Workbench;

use super::{print_outputs, print_trace_summary, VALIDATOR, VERIFIER};

pub const PROPERTY: &str = "unreach-call.prp";

/// Validate the verdict of the bundled verifier on `program`.
pub fn run(bench: &Workbench, program: &str) -> CoveriResult<RunReport> {
    let pipeline = validating_verifier(bench.verifier(VERIFIER)?, bench.validator(VALIDATOR)?)?;
    let inputs = Bindings::new()
        .with(PROGRAM, bench.input(ArtifactKind::Program, program)?)
        .with(SPEC, bench.input(ArtifactKind::BehaviorSpecification, PROPERTY)?);

    println!("  Pipeline: {}", pipeline.name());
    println!("  Program:  {program}");
    bench.engine().run(&pipeline, &inputs)
}

pub fn run_scenario(bench: &Workbench) -> CoveriResult<()> {
    println!("=== Scenario 1: Validating verifier ===");
    println!();

    for program in ["unsafe-sum.c", "safe-loop.c"] {
        let report = run(bench, program)?;
        let verdict = report
            .outputs
            .get(VERDICT)
            .and_then(|v| v.as_verdict())
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("  Run {}: validated verdict {verdict}", report.run_id);
        print_outputs(&report.outputs);
        println!();
    }

    print_trace_summary(bench);
    println!();
    println!("  Scenario 1 complete.");
    println!();
    Ok(())
}
