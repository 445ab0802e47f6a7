//! CoVeriTeam reference compositions demo CLI
//!
//! Runs one or all of the four reference compositions against the bundled
//! shell-script mock tools and example programs.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- validating-verifier
//!   cargo run -p demo -- verifier-based-tester
//!   cargo run -p demo -- cooperative-testing
//!   cargo run -p demo -- portfolio --work-dir /tmp/coveriteam

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use coveriteam_contracts::error::CoveriResult;
use coveriteam_ref_verification::{
    scenarios::{cooperative_testing, portfolio, validating_verifier, verifier_based_tester},
    Workbench,
};

/// Compose verification tools into pipelines and run them.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "CoVeriTeam reference compositions demo",
    long_about = "Runs the reference compositions (validating verifier, verifier-based tester,\n\
                  cooperative test generation, verifier portfolio) with mock tools and prints\n\
                  their outputs and the integrity of the invocation trace."
)]
struct Cli {
    /// Directory that receives one sub-directory per tool invocation.
    #[arg(long, global = true, default_value = "coveriteam-work")]
    work_dir: PathBuf,

    /// Write the invocation trace as JSON to this file after the run.
    #[arg(long, global = true)]
    trace_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all four scenarios in sequence.
    RunAll,
    /// Scenario 1: verifier whose conclusive verdicts are validated.
    ValidatingVerifier,
    /// Scenario 2: test generation through a verifier and witness2test.
    VerifierBasedTester,
    /// Scenario 3: generator and test validator iterated to a fixpoint.
    CooperativeTesting,
    /// Scenario 4: two verifiers in parallel.
    Portfolio,
}

fn main() {
    // RUST_LOG=debug shows every actor step and tool invocation.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    match run(&cli) {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {e}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> CoveriResult<()> {
    let bench = Workbench::bundled(&cli.work_dir)?;
    info!(work_dir = %cli.work_dir.display(), "running demo scenarios");

    match cli.command {
        Command::RunAll => {
            validating_verifier::run_scenario(&bench)?;
            verifier_based_tester::run_scenario(&bench)?;
            cooperative_testing::run_scenario(&bench)?;
            portfolio::run_scenario(&bench)?;
        }
        Command::ValidatingVerifier => validating_verifier::run_scenario(&bench)?,
        Command::VerifierBasedTester => verifier_based_tester::run_scenario(&bench)?,
        Command::CooperativeTesting => cooperative_testing::run_scenario(&bench)?,
        Command::Portfolio => portfolio::run_scenario(&bench)?,
    }

    if let Some(path) = &cli.trace_out {
        bench.trace().export_trace()?.write_json(path)?;
        println!("Trace written to {}", path.display());
    }
    Ok(())
}

fn print_banner() {
    println!();
    println!("CoVeriTeam actor-composition runtime");
    println!("Reference Compositions Demo");
    println!("====================================");
    println!();
    println!("Per atomic actor invocation:");
    println!("  [1] Input artifacts checked against the actor's contract");
    println!("  [2] Tool command line built from the descriptor and the inputs");
    println!("  [3] Tool run in its own directory under the work dir, with limits");
    println!("  [4] Verdict and result files extracted into output artifacts");
    println!("  [5] Invocation record appended to the SHA-256 trace chain");
    println!();
}
