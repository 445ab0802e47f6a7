//! End-to-end runs of the reference compositions against the mock tools.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use coveriteam_contracts::{
    artifact::{Artifact, ArtifactKind},
    contract::Bindings,
    error::{CoveriError, CoveriResult},
    execution::InvocationOutcome,
    verdict::ResultClass,
};
use coveriteam_core::traits::Archiver;
use coveriteam_ref_verification::{
    backends::{COVERED_GOALS, PROGRAM, SPEC, TEST_SUITE, VERDICT, WITNESS},
    compositions::portfolio_output,
    scenarios::{cooperative_testing, portfolio, validating_verifier, verifier_based_tester},
    workbench::default_inputs_dir,
    Workbench,
};
use coveriteam_tools::ZipArchiver;
use coveriteam_trace::verify_chain;

/// Stores the names of the suite's files instead of compressing them. The
/// mock test validator only looks for test file names, so this is enough
/// where no `zip` executable is installed.
struct ListingArchiver;

impl Archiver for ListingArchiver {
    fn create_archive(&self, src_dir: &Path, dest_zip: &Path) -> CoveriResult<PathBuf> {
        let mut names: Vec<String> = fs::read_dir(src_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        fs::write(dest_zip, names.join("\n")).unwrap();
        Ok(dest_zip.to_path_buf())
    }
}

fn bench(work: &Path) -> Workbench {
    let bench = Workbench::bundled(work).unwrap();
    if ZipArchiver::new().is_available() {
        bench
    } else {
        bench.with_archiver(Arc::new(ListingArchiver))
    }
}

fn verdict(outputs: &Bindings, name: &str) -> (ResultClass, String) {
    let v = outputs.get(name).unwrap().as_verdict().unwrap();
    (v.class, v.result.clone())
}

#[test]
fn validating_verifier_confirms_a_violation() {
    let work = tempfile::tempdir().unwrap();
    let bench = bench(work.path());

    let report = validating_verifier::run(&bench, "unsafe-sum.c").unwrap();

    assert_eq!(
        verdict(&report.outputs, VERDICT),
        (ResultClass::False, "false(unreach-call)".to_string())
    );
    assert_eq!(bench.trace().len(), 2, "verifier and validator ran once each");
    assert!(bench.trace().verify_integrity());
}

#[test]
fn validating_verifier_confirms_a_proof() {
    let work = tempfile::tempdir().unwrap();
    let bench = bench(work.path());

    let report = validating_verifier::run(&bench, "safe-loop.c").unwrap();

    assert_eq!(verdict(&report.outputs, VERDICT).0, ResultClass::True);
}

#[test]
fn inconclusive_verifier_is_not_validated() {
    let work = tempfile::tempdir().unwrap();
    let bench = bench(work.path());
    let pipeline = coveriteam_ref_verification::compositions::validating_verifier(
        bench.verifier("mock-weak").unwrap(),
        bench.validator("mock-validator").unwrap(),
    )
    .unwrap();
    let inputs = Bindings::new()
        .with(PROGRAM, bench.input(ArtifactKind::Program, "unsafe-sum.c").unwrap())
        .with(SPEC, bench.input(ArtifactKind::Specification, "unreach-call.prp").unwrap());

    let report = bench.engine().run(&pipeline, &inputs).unwrap();

    assert_eq!(
        verdict(&report.outputs, VERDICT),
        (ResultClass::Unknown, "unknown".to_string())
    );
    let log = bench.trace().export_trace().unwrap();
    let tools: Vec<&str> = log.events.iter().map(|e| e.record.tool_id.as_str()).collect();
    assert_eq!(tools, vec!["mock-weak"]);
}

#[test]
fn verifier_based_tester_turns_the_witness_into_a_test() {
    let work = tempfile::tempdir().unwrap();
    let bench = bench(work.path());

    let report = verifier_based_tester::run(&bench, "unsafe-sum.c").unwrap();

    let suite = report.outputs.get(TEST_SUITE).unwrap().path().unwrap().to_path_buf();
    assert!(suite.join("test-violation.xml").is_file());
    assert!(suite.starts_with(work.path().join("runs")));
}

#[test]
fn verifier_based_tester_without_violation_generates_nothing() {
    let work = tempfile::tempdir().unwrap();
    let bench = bench(work.path());

    let report = verifier_based_tester::run(&bench, "safe-loop.c").unwrap();

    assert!(report.outputs.get(TEST_SUITE).unwrap().is_absent());
}

#[test]
fn cooperative_testing_covers_every_branch() {
    let work = tempfile::tempdir().unwrap();
    let bench = bench(work.path());

    let report = cooperative_testing::run(&bench, "branches.c").unwrap();

    assert_eq!(
        report.outputs.get(COVERED_GOALS),
        Some(&Artifact::test_goals(["else_if_branch", "fallthrough", "then_branch"]))
    );
    // Three covering rounds and one confirming round, two tools per round.
    assert_eq!(bench.trace().len(), 8);
    let log = bench.trace().export_trace().unwrap();
    assert_eq!(log.runs.len(), 1);
    assert_eq!(log.runs[0].run_id, report.run_id.to_string());
    assert!(verify_chain(&log.events));
}

#[test]
fn portfolio_keeps_both_verdicts() {
    let work = tempfile::tempdir().unwrap();
    let bench = bench(work.path());

    let report = portfolio::run(&bench, "safe-loop.c").unwrap();

    assert_eq!(
        verdict(&report.outputs, &portfolio_output(VERDICT, "mock-cpa")).0,
        ResultClass::True
    );
    assert_eq!(
        verdict(&report.outputs, &portfolio_output(VERDICT, "mock-weak")).0,
        ResultClass::Unknown
    );
    assert!(!report.outputs.get(&portfolio_output(WITNESS, "mock-cpa")).unwrap().is_absent());
    assert!(report.outputs.get(&portfolio_output(WITNESS, "mock-weak")).unwrap().is_absent());
    assert_eq!(bench.trace().len(), 2);
}

#[test]
fn unstartable_tool_fails_the_run_and_is_traced() {
    let tools = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    fs::write(
        tools.path().join("broken.toml"),
        r#"
id = "broken"
name = "Verifier without an executable"
command = ["/nonexistent/verifier"]

[result_files]
witness = "*.graphml"
"#,
    )
    .unwrap();
    let bench = Workbench::new(tools.path(), default_inputs_dir(), work.path()).unwrap();
    let verifier = bench.verifier("broken").unwrap();
    let inputs = Bindings::new()
        .with(PROGRAM, bench.input(ArtifactKind::Program, "safe-loop.c").unwrap())
        .with(SPEC, bench.input(ArtifactKind::Specification, "unreach-call.prp").unwrap());

    let err = bench.engine().run(verifier.as_ref(), &inputs).unwrap_err();

    match err {
        CoveriError::ToolInvocation { tool, .. } => assert_eq!(tool, "broken"),
        other => panic!("expected ToolInvocation, got {other}"),
    }
    let log = bench.trace().export_trace().unwrap();
    assert_eq!(log.events.len(), 1);
    assert!(matches!(log.events[0].record.outcome, InvocationOutcome::Failed { .. }));
    assert!(bench.trace().verify_integrity());
}

#[test]
fn exported_trace_survives_a_json_round_trip() {
    let work = tempfile::tempdir().unwrap();
    let bench = bench(work.path());
    validating_verifier::run(&bench, "unsafe-sum.c").unwrap();

    let path = work.path().join("trace.json");
    bench.trace().export_trace().unwrap().write_json(&path).unwrap();
    let log = coveriteam_trace::TraceLog::read_json(&path).unwrap();

    assert_eq!(log.events.len(), 2);
    assert!(verify_chain(&log.events));
}
