//! # coveriteam-ref-verification
//!
//! Reference actors and compositions for the CoVeriTeam runtime.
//!
//! - `backends`: tool backends for verifiers, witness validators,
//!   witness-to-test converters, test generators and test-suite validators
//! - `workbench`: registry, runner, archiver and trace wired together, handing
//!   out atomic actors by tool id
//! - `compositions`: validating verifier, verifier-based tester, cooperative
//!   test generation and verifier portfolio
//! - `scenarios`: the four compositions run against shell-script mock tools
//!   (`tools/`) and small C programs (`inputs/`)
//!
//! The mock tools need a POSIX `sh`; cooperative test generation also needs
//! `zip` unless another archiver is supplied.

pub mod backends;
pub mod compositions;
pub mod scenarios;
pub mod workbench;

pub use workbench::Workbench;
