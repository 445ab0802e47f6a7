//! Control-flow combinators.
//!
//! Each combinator is itself an [`Actor`](crate::traits::Actor) whose
//! contract is derived from its children when it is built. Wiring errors
//! surface as [`CoveriError::Composition`](coveriteam_contracts::error::CoveriError)
//! from the constructor, before any tool runs.

pub mod ite;
pub mod iterative;
pub mod parallel;
pub mod sequence;

pub use ite::Ite;
pub use iterative::{Iterative, LoopState};
pub use parallel::Parallel;
pub use sequence::Sequence;
