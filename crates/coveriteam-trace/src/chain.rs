//! Hash-chain primitives.
//!
//! Hash input layout (bytes, in order):
//!   1. trace id as UTF-8
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 (64 hex chars)
//!   4. compact JSON of the invocation record

use sha2::{Digest, Sha256};

use coveriteam_contracts::{
    error::{CoveriError, CoveriResult},
    execution::InvocationRecord,
};

use crate::event::TraceEvent;

/// `prev_hash` of the first event of every chain.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Lowercase hex SHA-256 over one chain position.
pub fn hash_record(
    trace_id: &str,
    sequence: u64,
    record: &InvocationRecord,
    prev_hash: &str,
) -> CoveriResult<String> {
    let record_json = serde_json::to_vec(record).map_err(|e| CoveriError::TraceWriteFailed {
        reason: format!("cannot serialize invocation record: {e}"),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(trace_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    Ok(hex::encode(hasher.finalize()))
}

/// Sequence number of the first event whose link or hash does not check out.
pub fn first_broken_link(events: &[TraceEvent]) -> Option<u64> {
    let mut expected_prev: &str = GENESIS_HASH;

    for event in events {
        if event.prev_hash != expected_prev {
            return Some(event.sequence);
        }
        match hash_record(&event.trace_id, event.sequence, &event.record, &event.prev_hash) {
            Ok(h) if h == event.this_hash => {}
            _ => return Some(event.sequence),
        }
        expected_prev = event.this_hash.as_str();
    }

    None
}

/// `true` when every link and every hash of the chain is intact. An empty
/// chain is valid.
pub fn verify_chain(events: &[TraceEvent]) -> bool {
    first_broken_link(events).is_none()
}
