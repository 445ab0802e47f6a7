//! In-memory `TraceWriter`.
//!
//! Parallel branches write concurrently, so the chain state sits behind a
//! `Mutex`; the sequence is the order in which writes acquired it.

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info};

use coveriteam_contracts::{
    error::{CoveriError, CoveriResult},
    execution::InvocationRecord,
};
use coveriteam_core::traits::TraceWriter;

use crate::{
    chain::{hash_record, verify_chain, GENESIS_HASH},
    event::{SealedRun, TraceEvent, TraceLog},
};

pub(crate) struct ChainState {
    pub(crate) events: Vec<TraceEvent>,
    pub(crate) runs: Vec<SealedRun>,
    pub(crate) last_hash: String,
}

/// Append-only trace backed by a SHA-256 hash chain.
pub struct InMemoryTraceWriter {
    trace_id: String,
    pub(crate) state: Mutex<ChainState>,
}

impl InMemoryTraceWriter {
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            state: Mutex::new(ChainState {
                events: Vec::new(),
                runs: Vec::new(),
                last_hash: GENESIS_HASH.to_string(),
            }),
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    fn lock(&self) -> CoveriResult<MutexGuard<'_, ChainState>> {
        self.state.lock().map_err(|e| CoveriError::TraceWriteFailed {
            reason: format!("trace state lock poisoned: {e}"),
        })
    }

    pub fn len(&self) -> usize {
        self.lock().map_or(0, |s| s.events.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of everything written and sealed so far.
    pub fn export_trace(&self) -> CoveriResult<TraceLog> {
        let state = self.lock()?;
        Ok(TraceLog {
            trace_id: self.trace_id.clone(),
            events: state.events.clone(),
            runs: state.runs.clone(),
            exported_at: Utc::now(),
            terminal_hash: state.events.last().map(|e| e.this_hash.clone()).unwrap_or_default(),
        })
    }

    /// Recheck every link of the in-memory chain.
    pub fn verify_integrity(&self) -> bool {
        self.lock().is_ok_and(|s| verify_chain(&s.events))
    }
}

impl TraceWriter for InMemoryTraceWriter {
    fn write(&self, record: &InvocationRecord) -> CoveriResult<()> {
        let mut state = self.lock()?;

        let sequence = state.events.len() as u64;
        let prev_hash = state.last_hash.clone();
        let this_hash = hash_record(&self.trace_id, sequence, record, &prev_hash)?;

        debug!(trace_id = %self.trace_id, sequence, actor = %record.actor, "trace event appended");

        state.events.push(TraceEvent {
            sequence,
            trace_id: self.trace_id.clone(),
            record: record.clone(),
            prev_hash,
            this_hash: this_hash.clone(),
        });
        state.last_hash = this_hash;
        Ok(())
    }

    fn finalize(&self, run_id: &str) -> CoveriResult<()> {
        let mut state = self.lock()?;
        let event_count = state.events.len();
        state.runs.push(SealedRun {
            run_id: run_id.to_string(),
            event_count,
            sealed_at: Utc::now(),
        });

        info!(
            trace_id = %self.trace_id,
            run_id = %run_id,
            event_count,
            terminal_hash = %state.last_hash,
            "trace sealed"
        );
        Ok(())
    }
}
