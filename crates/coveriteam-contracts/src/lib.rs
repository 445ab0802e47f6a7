//! # coveriteam-contracts
//!
//! Shared types for the CoVeriTeam actor-composition runtime.
//!
//! All crates in the workspace import from here. No execution logic lives in
//! this crate: only artifacts, contracts, tool configuration types, records
//! and the error taxonomy.

pub mod artifact;
pub mod contract;
pub mod error;
pub mod execution;
pub mod tool;
pub mod verdict;

pub use artifact::{Artifact, ArtifactKind, ArtifactValue};
pub use contract::{ArtifactContract, Bindings};
pub use error::{CoveriError, CoveriResult};
pub use verdict::{ResultClass, Verdict};
