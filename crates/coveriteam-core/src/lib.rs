//! # coveriteam-core
//!
//! The actor-composition runtime.
//!
//! This crate provides:
//! - The `Actor` trait and the collaborator traits (`ToolBackend`,
//!   `ToolRunner`, `ResultParser`, `Archiver`, `TraceWriter`)
//! - `execute` / `Engine`, which enforce artifact contracts around every call
//! - `AtomicActor`, the bridge to external tools
//! - The combinators `Sequence`, `Parallel`, `Ite` and `Iterative`
//! - Utility actors and the `Condition` language used by `Ite`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use coveriteam_core::{composite::Sequence, executor::Engine};
//!
//! let pipeline = Sequence::new(verifier, validator)?;
//! let report = Engine::new().run(&pipeline, &inputs)?;
//! ```

pub mod atomic;
pub mod composite;
pub mod condition;
pub mod executor;
pub mod glob;
pub mod traits;
pub mod utility;

#[cfg(test)]
mod test_support;

pub use atomic::AtomicActor;
pub use composite::{Ite, Iterative, LoopState, Parallel, Sequence};
pub use condition::Condition;
pub use executor::{execute, Engine, RunReport};
pub use traits::{Actor, ActorRef};
pub use utility::{CopyActor, IdentityActor, Joiner, KindConverter};
