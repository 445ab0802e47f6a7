//! Scenario: verifier portfolio
//!
//! Two verifiers run in parallel on the same task. The strong one proves
//! the program safe, the weak one gives up; both results are kept under
//! per-verifier names.

use coveriteam_contracts::{
    artifact::ArtifactKind,
    contract::Bindings,
    error::CoveriResult,
};
use coveriteam_core::{executor::RunReport, traits::Actor};

use crate::backends::{PROGRAM, SPEC, VERDICT};
use crate::compositions::{portfolio_output, verifier_portfolio};
use crate::workbench::Workbench;

use super::{print_outputs, print_trace_summary, VERIFIER, WEAK_VERIFIER};

pub const PROPERTY: &str = "unreach-call.prp";

pub fn run(bench: &Workbench, program: &str) -> CoveriResult<RunReport> {
    let pipeline = verifier_portfolio(bench.verifier(VERIFIER)?, bench.verifier(WEAK_VERIFIER)?)?;
    let inputs = Bindings::new()
        .with(PROGRAM, bench.input(ArtifactKind::Program, program)?)
        .with(SPEC, bench.input(ArtifactKind::BehaviorSpecification, PROPERTY)?);

    println!("  Pipeline: {}", pipeline.name());
    println!("  Program:  {program}");
    bench.engine().run(&pipeline, &inputs)
}

pub fn run_scenario(bench: &Workbench) -> CoveriResult<()> {
    println!("=== Scenario 4: Verifier portfolio ===");
    println!();

    let report = run(bench, "safe-loop.c")?;
    println!("  Run {}", report.run_id);
    for verifier in [VERIFIER, WEAK_VERIFIER] {
        let verdict = report
            .outputs
            .get(&portfolio_output(VERDICT, verifier))
            .and_then(|v| v.as_verdict())
            .map(|v| v.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("  {verifier:<22}{verdict}");
    }
    print_outputs(&report.outputs);
    println!();

    print_trace_summary(bench);
    println!();
    println!("  Scenario 4 complete.");
    println!();
    Ok(())
}
