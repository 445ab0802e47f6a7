//! # coveriteam-trace
//!
//! Append-only, SHA-256 hash-chained record of every tool invocation.
//!
//! Each `InvocationRecord` written by an atomic actor is wrapped in a
//! `TraceEvent` linked to its predecessor by hash, so editing a stored event
//! breaks the chain and `verify_chain` reports it.
//!
//! ```rust,ignore
//! let trace = Arc::new(InMemoryTraceWriter::new("validating-verifier"));
//! let verifier = verifier.with_trace(trace.clone());
//! Engine::with_trace(trace.clone()).run(&pipeline, &inputs)?;
//! assert!(trace.verify_integrity());
//! ```

pub mod chain;
pub mod event;
pub mod memory;

pub use chain::{first_broken_link, hash_record, verify_chain, GENESIS_HASH};
pub use event::{SealedRun, TraceEvent, TraceLog};
pub use memory::InMemoryTraceWriter;
