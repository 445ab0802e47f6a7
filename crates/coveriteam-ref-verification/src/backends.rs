//! Tool backends for the reference actors.
//!
//! | backend            | consumes                               | produces             |
//! |--------------------|----------------------------------------|----------------------|
//! | `Verifier`         | program, spec                          | verdict, witness     |
//! | `Validator`        | program, spec, witness                 | verdict              |
//! | `WitnessToTest`    | program, spec, witness                 | test_suite           |
//! | `TestGenerator`    | program, test_spec, covered_goals      | test_suite           |
//! | `TestValidator`    | program, test_spec, test_suite         | new_goals            |
//!
//! Absent witnesses and test suites are legal inputs; the matching command
//! line option is simply left out.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;

use coveriteam_contracts::{
    artifact::{Artifact, ArtifactKind},
    contract::{ArtifactContract, Bindings},
    error::{CoveriError, CoveriResult},
    tool::{ToolDescriptor, ToolRun},
};
use coveriteam_core::{
    atomic::bind_result_file,
    glob::matching_files,
    traits::{Archiver, ResultParser, ToolBackend},
};
use coveriteam_tools::PatternResultParser;

pub const PROGRAM: &str = "program";
pub const SPEC: &str = "spec";
pub const TEST_SPEC: &str = "test_spec";
pub const VERDICT: &str = "verdict";
pub const WITNESS: &str = "witness";
pub const TEST_SUITE: &str = "test_suite";
pub const COVERED_GOALS: &str = "covered_goals";
pub const NEW_GOALS: &str = "new_goals";

fn file_arg(inputs: &Bindings, tool: &str, name: &str) -> CoveriResult<String> {
    let artifact = inputs.require(tool, name)?;
    artifact
        .path()
        .map(|p| p.display().to_string())
        .ok_or_else(|| CoveriError::contract(tool, format!("input '{name}' ({artifact}) is not a file")))
}

/// `[flag, path]` for a present file artifact, nothing for an absent one.
fn optional_file_arg(inputs: &Bindings, tool: &str, name: &str, flag: &str) -> CoveriResult<Vec<String>> {
    let artifact = inputs.require(tool, name)?;
    Ok(match artifact.path() {
        Some(path) => vec![flag.to_string(), path.display().to_string()],
        None => Vec::new(),
    })
}

/// `[--witness W] --spec S PROGRAM`
fn witness_args(tool: &str, inputs: &Bindings) -> CoveriResult<Vec<String>> {
    let mut args = optional_file_arg(inputs, tool, WITNESS, "--witness")?;
    args.extend(["--spec".to_string(), file_arg(inputs, tool, SPEC)?]);
    args.push(file_arg(inputs, tool, PROGRAM)?);
    Ok(args)
}

/// The deepest directory holding every one of `files`.
fn common_parent(files: &[PathBuf]) -> Option<PathBuf> {
    let mut dirs = files.iter().filter_map(|f| f.parent());
    let first = dirs.next()?.to_path_buf();
    Some(dirs.fold(first, |common, dir| {
        common
            .components()
            .zip(dir.components())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a)
            .collect()
    }))
}

/// The directory holding the test files `run` wrote, or an absent suite when
/// no test was written.
fn bind_test_suite(run: &ToolRun, descriptor: &ToolDescriptor) -> CoveriResult<Artifact> {
    let pattern = descriptor.result_pattern(TEST_SUITE).ok_or_else(|| CoveriError::Config {
        reason: format!("tool '{}' declares no result pattern for '{TEST_SUITE}'", descriptor.id),
    })?;
    let tests = matching_files(run, pattern)?;
    debug!(tool_id = %run.tool_id, tests = tests.len(), "test files collected");
    match common_parent(&tests) {
        Some(dir) => Ok(Artifact::test_suite(dir)),
        None => Ok(Artifact::absent(ArtifactKind::TestSuite)),
    }
}

// ── Verification ──────────────────────────────────────────────────────────────

pub struct Verifier {
    descriptor: ToolDescriptor,
    parser: PatternResultParser,
}

impl Verifier {
    pub fn new(descriptor: ToolDescriptor) -> CoveriResult<Self> {
        let parser = PatternResultParser::for_tool(&descriptor)?;
        Ok(Self { descriptor, parser })
    }

    pub fn inputs() -> ArtifactContract {
        ArtifactContract::new()
            .with(PROGRAM, ArtifactKind::Program)
            .with(SPEC, ArtifactKind::Specification)
    }

    pub fn outputs() -> ArtifactContract {
        ArtifactContract::new()
            .with(VERDICT, ArtifactKind::Verdict)
            .with(WITNESS, ArtifactKind::Witness)
    }
}

impl ToolBackend for Verifier {
    fn prepare_args(&self, inputs: &Bindings) -> CoveriResult<Vec<String>> {
        let id = &self.descriptor.id;
        Ok(vec![
            "--spec".to_string(),
            file_arg(inputs, id, SPEC)?,
            file_arg(inputs, id, PROGRAM)?,
        ])
    }

    fn extract_result(&self, run: &ToolRun) -> CoveriResult<Bindings> {
        let verdict = self.parser.determine_result(run);
        let witness = bind_result_file(run, &self.descriptor, WITNESS, ArtifactKind::Witness)?;
        Ok(Bindings::new()
            .with(VERDICT, Artifact::verdict(verdict))
            .with(WITNESS, witness))
    }
}

/// Checks a verifier's witness and issues its own verdict.
pub struct Validator {
    descriptor: ToolDescriptor,
    parser: PatternResultParser,
}

impl Validator {
    pub fn new(descriptor: ToolDescriptor) -> CoveriResult<Self> {
        let parser = PatternResultParser::for_tool(&descriptor)?;
        Ok(Self { descriptor, parser })
    }

    pub fn inputs() -> ArtifactContract {
        Verifier::inputs().with(WITNESS, ArtifactKind::Witness)
    }

    pub fn outputs() -> ArtifactContract {
        ArtifactContract::new().with(VERDICT, ArtifactKind::Verdict)
    }
}

impl ToolBackend for Validator {
    fn prepare_args(&self, inputs: &Bindings) -> CoveriResult<Vec<String>> {
        witness_args(&self.descriptor.id, inputs)
    }

    fn extract_result(&self, run: &ToolRun) -> CoveriResult<Bindings> {
        Ok(Bindings::new().with(VERDICT, Artifact::verdict(self.parser.determine_result(run))))
    }
}

// ── Testing ───────────────────────────────────────────────────────────────────

/// Turns a violation witness into an executable test.
pub struct WitnessToTest {
    descriptor: ToolDescriptor,
}

impl WitnessToTest {
    pub fn new(descriptor: ToolDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn inputs() -> ArtifactContract {
        Validator::inputs()
    }

    pub fn outputs() -> ArtifactContract {
        ArtifactContract::new().with(TEST_SUITE, ArtifactKind::TestSuite)
    }
}

impl ToolBackend for WitnessToTest {
    fn prepare_args(&self, inputs: &Bindings) -> CoveriResult<Vec<String>> {
        witness_args(&self.descriptor.id, inputs)
    }

    fn extract_result(&self, run: &ToolRun) -> CoveriResult<Bindings> {
        Ok(Bindings::new().with(TEST_SUITE, bind_test_suite(run, &self.descriptor)?))
    }
}

/// Generates tests for goals not covered yet.
pub struct TestGenerator {
    descriptor: ToolDescriptor,
}

impl TestGenerator {
    pub fn new(descriptor: ToolDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn inputs() -> ArtifactContract {
        ArtifactContract::new()
            .with(PROGRAM, ArtifactKind::Program)
            .with(TEST_SPEC, ArtifactKind::TestSpecification)
            .with(COVERED_GOALS, ArtifactKind::TestGoal)
    }

    pub fn outputs() -> ArtifactContract {
        WitnessToTest::outputs()
    }
}

impl ToolBackend for TestGenerator {
    fn prepare_args(&self, inputs: &Bindings) -> CoveriResult<Vec<String>> {
        let id = &self.descriptor.id;
        let mut args = vec!["--spec".to_string(), file_arg(inputs, id, TEST_SPEC)?];

        let covered = inputs.require(id, COVERED_GOALS)?.goals().unwrap_or_default();
        if !covered.is_empty() {
            args.push("--covered".to_string());
            args.push(covered.into_iter().collect::<Vec<_>>().join(","));
        }

        args.push(file_arg(inputs, id, PROGRAM)?);
        Ok(args)
    }

    fn extract_result(&self, run: &ToolRun) -> CoveriResult<Bindings> {
        Ok(Bindings::new().with(TEST_SUITE, bind_test_suite(run, &self.descriptor)?))
    }
}

/// Executes a test suite and reports the goals it covers.
///
/// The tool reads a zip archive, so the suite directory is archived first.
pub struct TestValidator {
    descriptor: ToolDescriptor,
    archiver: Arc<dyn Archiver>,
}

impl TestValidator {
    pub fn new(descriptor: ToolDescriptor, archiver: Arc<dyn Archiver>) -> Self {
        Self { descriptor, archiver }
    }

    pub fn inputs() -> ArtifactContract {
        ArtifactContract::new()
            .with(PROGRAM, ArtifactKind::Program)
            .with(TEST_SPEC, ArtifactKind::TestSpecification)
            .with(TEST_SUITE, ArtifactKind::TestSuite)
    }

    pub fn outputs() -> ArtifactContract {
        ArtifactContract::new().with(NEW_GOALS, ArtifactKind::TestGoal)
    }

    fn archive(&self, suite: &Path) -> CoveriResult<String> {
        if suite.is_dir() {
            let zip = self.archiver.create_archive(suite, &suite.with_extension("zip"))?;
            Ok(zip.display().to_string())
        } else {
            Ok(suite.display().to_string())
        }
    }
}

fn covered_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^covered: (\S+)$").expect("valid coverage regex"))
}

impl ToolBackend for TestValidator {
    fn prepare_args(&self, inputs: &Bindings) -> CoveriResult<Vec<String>> {
        let id = &self.descriptor.id;
        let mut args = vec!["--spec".to_string(), file_arg(inputs, id, TEST_SPEC)?];
        if let Some(suite) = inputs.require(id, TEST_SUITE)?.path() {
            args.push("--suite".to_string());
            args.push(self.archive(suite)?);
        }
        args.push(file_arg(inputs, id, PROGRAM)?);
        Ok(args)
    }

    fn extract_result(&self, run: &ToolRun) -> CoveriResult<Bindings> {
        let goals: Vec<&str> = run
            .log_lines
            .iter()
            .filter_map(|line| covered_line().captures(line))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect();
        Ok(Bindings::new().with(NEW_GOALS, Artifact::test_goals(goals)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use coveriteam_contracts::{
        artifact::{Artifact, ArtifactKind},
        contract::Bindings,
        error::CoveriResult,
        tool::{ToolDescriptor, ToolRun},
        verdict::ResultClass,
    };
    use coveriteam_core::traits::{Archiver, ToolBackend};

    use super::*;

    fn descriptor(id: &str, result_files: &[(&str, &str)]) -> ToolDescriptor {
        ToolDescriptor {
            id: id.to_string(),
            name: id.to_string(),
            version: None,
            command: vec!["sh".to_string()],
            options: vec![],
            limits: Default::default(),
            result_files: result_files
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
            verdict_rules: vec![coveriteam_contracts::tool::VerdictRule {
                id: "violation".to_string(),
                pattern: "^Verification result: FALSE".to_string(),
                class: ResultClass::False,
                result: None,
            }],
        }
    }

    fn run(lines: &[&str], files: &[&str]) -> ToolRun {
        let out = PathBuf::from("/runs/tool/output");
        ToolRun {
            tool_id: "tool".to_string(),
            exit_code: Some(0),
            runtime: Duration::from_millis(3),
            timed_out: false,
            log_path: PathBuf::from("/runs/tool/output.log"),
            log_lines: lines.iter().map(|l| l.to_string()).collect(),
            output_dir: out.clone(),
            result_files: files.iter().map(|f| out.join(f)).collect(),
        }
    }

    struct RecordingArchiver {
        calls: Mutex<Vec<PathBuf>>,
    }

    impl Archiver for RecordingArchiver {
        fn create_archive(&self, src_dir: &Path, dest_zip: &Path) -> CoveriResult<PathBuf> {
            self.calls.lock().unwrap().push(src_dir.to_path_buf());
            Ok(dest_zip.to_path_buf())
        }
    }

    #[test]
    fn verifier_args_and_results() {
        let v = Verifier::new(descriptor("cpa", &[(WITNESS, "**/*.graphml")])).unwrap();
        let inputs = Bindings::new()
            .with(PROGRAM, Artifact::program("/in/a.c"))
            .with(SPEC, Artifact::specification("/in/unreach-call.prp"));

        assert_eq!(
            v.prepare_args(&inputs).unwrap(),
            vec!["--spec", "/in/unreach-call.prp", "/in/a.c"]
        );

        let out = v
            .extract_result(&run(&["Verification result: FALSE"], &["witness.graphml"]))
            .unwrap();
        assert_eq!(out.get(VERDICT).unwrap().as_verdict().unwrap().class, ResultClass::False);
        assert!(!out.get(WITNESS).unwrap().is_absent());
    }

    #[test]
    fn validator_omits_an_absent_witness() {
        let v = Validator::new(descriptor("val", &[])).unwrap();
        let inputs = Bindings::new()
            .with(PROGRAM, Artifact::program("/in/a.c"))
            .with(SPEC, Artifact::specification("/in/p.prp"))
            .with(WITNESS, Artifact::absent(ArtifactKind::Witness));

        assert_eq!(v.prepare_args(&inputs).unwrap(), vec!["--spec", "/in/p.prp", "/in/a.c"]);
    }

    #[test]
    fn generator_passes_covered_goals() {
        let g = TestGenerator::new(descriptor("gen", &[(TEST_SUITE, "test-suite/*.xml")]));
        let inputs = Bindings::new()
            .with(PROGRAM, Artifact::program("/in/a.c"))
            .with(TEST_SPEC, Artifact::test_specification("/in/cov.prp"))
            .with(COVERED_GOALS, Artifact::test_goals(["g2", "g1"]));

        assert_eq!(
            g.prepare_args(&inputs).unwrap(),
            vec!["--spec", "/in/cov.prp", "--covered", "g1,g2", "/in/a.c"]
        );

        let out = g.extract_result(&run(&[], &["test-suite/test-g3.xml"])).unwrap();
        assert_eq!(
            out.get(TEST_SUITE),
            Some(&Artifact::test_suite("/runs/tool/output/test-suite"))
        );
        let none = g.extract_result(&run(&[], &[])).unwrap();
        assert!(none.get(TEST_SUITE).unwrap().is_absent());
    }

    #[test]
    fn suite_directory_follows_the_result_pattern() {
        let g = TestGenerator::new(descriptor("gen", &[(TEST_SUITE, "tests/*.xml")]));

        let out = g
            .extract_result(&run(&[], &["tests/test-g1.xml", "tests/test-g2.xml", "log.txt"]))
            .unwrap();

        assert_eq!(out.get(TEST_SUITE), Some(&Artifact::test_suite("/runs/tool/output/tests")));
    }

    #[test]
    fn suite_directory_is_the_common_parent() {
        let files = [
            PathBuf::from("/out/suite/a/t1.xml"),
            PathBuf::from("/out/suite/b/t2.xml"),
            PathBuf::from("/out/suite/t3.xml"),
        ];
        assert_eq!(common_parent(&files), Some(PathBuf::from("/out/suite")));
        assert_eq!(common_parent(&files[..1]), Some(PathBuf::from("/out/suite/a")));
        assert_eq!(common_parent(&[]), None);
    }

    #[test]
    fn test_validator_reads_covered_goals_from_the_log() {
        let archiver = Arc::new(RecordingArchiver { calls: Mutex::new(vec![]) });
        let tv = TestValidator::new(descriptor("testcov", &[]), archiver.clone());

        let out = tv
            .extract_result(&run(&["covered: g1", "noise", "covered: g3", "Coverage finished"], &[]))
            .unwrap();

        assert_eq!(out.get(NEW_GOALS), Some(&Artifact::test_goals(["g1", "g3"])));
        assert!(archiver.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_validator_archives_suite_directories() {
        let suite = tempfile::tempdir().unwrap();
        let archiver = Arc::new(RecordingArchiver { calls: Mutex::new(vec![]) });
        let tv = TestValidator::new(descriptor("testcov", &[]), archiver.clone());
        let inputs = Bindings::new()
            .with(PROGRAM, Artifact::program("/in/a.c"))
            .with(TEST_SPEC, Artifact::test_specification("/in/cov.prp"))
            .with(TEST_SUITE, Artifact::test_suite(suite.path()));

        let args = tv.prepare_args(&inputs).unwrap();

        assert_eq!(args[2], "--suite");
        assert!(args[3].ends_with(".zip"));
        assert_eq!(archiver.calls.lock().unwrap().as_slice(), &[suite.path().to_path_buf()]);
    }
}
