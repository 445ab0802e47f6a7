//! Demo scenarios over the bundled mock tools and example programs.
//!
//! Each scenario builds one reference composition from a [`Workbench`],
//! runs it through the engine and prints what happened. The `run` functions
//! return the report for inspection; `run_scenario` also prints it.

use coveriteam_contracts::contract::Bindings;

use crate::workbench::Workbench;

pub mod cooperative_testing;
pub mod portfolio;
pub mod validating_verifier;
pub mod verifier_based_tester;

/// Mock tool ids used by the scenarios.
pub const VERIFIER: &str = "mock-cpa";
pub const WEAK_VERIFIER: &str = "mock-weak";
pub const VALIDATOR: &str = "mock-validator";
pub const WITNESS_TO_TEST: &str = "mock-witness2test";
pub const TEST_GENERATOR: &str = "mock-tester";
pub const TEST_VALIDATOR: &str = "mock-test-validator";

fn print_outputs(outputs: &Bindings) {
    for (name, artifact) in outputs.iter() {
        println!("  {name:<22}{artifact}");
    }
}

fn print_trace_summary(bench: &Workbench) {
    let trace = bench.trace();
    println!(
        "  Trace chain integrity:  {} ({} invocation(s) recorded)",
        if trace.verify_integrity() { "VERIFIED" } else { "FAILED" },
        trace.len()
    );
}
