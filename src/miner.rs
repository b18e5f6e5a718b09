//! Proof-of-work search over a block draft's nonce space.
//!
//! The search is a pure, restartable linear scan: digests are computed as a
//! function of (draft, nonce), never by mutating a shared block. Cancellation
//! is cooperative: callers pass a stop flag that is checked once per nonce.

use crate::blockchain::BlockDraft;
use std::sync::atomic::{AtomicBool, Ordering};

const PROGRESS_INTERVAL: u64 = 1 << 20;

/// Difficulty predicate: the digest carries at least `difficulty` leading
/// `'0'` hex characters.
pub fn meets_difficulty(digest: &str, difficulty: u32) -> bool {
    digest.bytes().take_while(|&b| b == b'0').count() >= difficulty as usize
}

/// Scan nonces from `start_nonce` (inclusive) until one satisfies the
/// difficulty predicate, returning it. Returns `None` only if `stop` is
/// raised; there is no other exit. Non-termination is possible for
/// difficulty values large relative to the digest space and is not treated
/// as an error condition.
pub fn search(
    draft: &BlockDraft,
    difficulty: u32,
    start_nonce: u64,
    stop: &AtomicBool,
) -> Option<u64> {
    let mut nonce = start_nonce;
    loop {
        if stop.load(Ordering::Relaxed) {
            return None;
        }
        if meets_difficulty(&draft.digest_with(nonce), difficulty) {
            return Some(nonce);
        }
        nonce = nonce.wrapping_add(1);
        if nonce.is_multiple_of(PROGRESS_INTERVAL) {
            log::debug!(
                "block {} search ongoing: {} nonces tried",
                draft.index,
                nonce.wrapping_sub(start_nonce)
            );
        }
    }
}
