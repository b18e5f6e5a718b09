use crate::error::ChainError;
use crate::mempool::{Record, RecordQueue};
use crate::miner;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

/// Sentinel stored as the genesis block's predecessor digest. Not a real
/// digest; validation never dereferences it.
pub const GENESIS_PREVIOUS_DIGEST: &str = "0";

const GENESIS_RECORD: &str = "Genesis Record";

/// Digest over the canonical serialization of a block's fields.
///
/// The canonical form is sorted-key JSON of
/// `{index, nonce, previous_digest, records, timestamp}`, so two blocks with
/// identical field values hash identically regardless of how they were built.
fn canonical_digest(
    index: u64,
    timestamp: u64,
    records: &[Record],
    previous_digest: &str,
    nonce: u64,
) -> String {
    let canonical = serde_json::json!({
        "index": index,
        "nonce": nonce,
        "previous_digest": previous_digest,
        "records": records,
        "timestamp": timestamp,
    });
    let mut hasher = Sha256::new();
    hasher.update(canonical.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// An unsealed block candidate: every field of a [`Block`] except the nonce
/// and the digest it determines. The proof-of-work search probes nonces
/// through [`BlockDraft::digest_with`] without mutating the draft.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BlockDraft {
    pub index: u64,
    pub timestamp: u64,
    pub records: Vec<Record>,
    pub previous_digest: String,
}

impl BlockDraft {
    /// Capture the candidate fields and stamp the current time.
    pub fn new(index: u64, records: Vec<Record>, previous_digest: String) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis() as u64;
        BlockDraft {
            index,
            timestamp,
            records,
            previous_digest,
        }
    }

    /// Digest this draft would have under the given nonce. Pure.
    pub fn digest_with(&self, nonce: u64) -> String {
        canonical_digest(
            self.index,
            self.timestamp,
            &self.records,
            &self.previous_digest,
            nonce,
        )
    }

    /// Fix the nonce, compute the digest once, and produce the sealed block.
    pub fn seal(self, nonce: u64) -> Block {
        let digest = self.digest_with(nonce);
        Block {
            index: self.index,
            timestamp: self.timestamp,
            records: self.records,
            previous_digest: self.previous_digest,
            nonce,
            digest,
        }
    }
}

/// A sealed ledger block. The stored digest covers all other fields; after
/// sealing, nothing in the normal API recomputes or rewrites it. Integrity
/// is checked on demand by chain validation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    pub records: Vec<Record>,
    pub previous_digest: String,
    pub nonce: u64,
    pub digest: String,
}

impl Block {
    /// The genesis block: index 0, sentinel predecessor, sealed with nonce 0
    /// and no proof-of-work.
    pub fn genesis() -> Block {
        BlockDraft::new(
            0,
            vec![GENESIS_RECORD.to_string()],
            GENESIS_PREVIOUS_DIGEST.to_string(),
        )
        .seal(0)
    }

    /// Fresh digest over the block's current fields. Diverges from the stored
    /// digest exactly when the block was altered after sealing.
    pub fn computed_digest(&self) -> String {
        canonical_digest(
            self.index,
            self.timestamp,
            &self.records,
            &self.previous_digest,
            self.nonce,
        )
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block {}:", self.index)?;
        writeln!(f, "  Timestamp:       {}", self.timestamp)?;
        writeln!(f, "  Records:         {:?}", self.records)?;
        writeln!(f, "  Previous Digest: {}", self.previous_digest)?;
        writeln!(f, "  Nonce:           {}", self.nonce)?;
        write!(f, "  Digest:          {}", self.digest)
    }
}

/// Outcome of a [`Chain::mine_pending`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MineOutcome {
    /// A block was sealed and appended; the pending queue was cleared.
    Sealed {
        index: u64,
        nonce: u64,
        digest: String,
        elapsed: Duration,
    },
    /// The pending queue was empty; the chain is unchanged.
    NothingPending,
    /// The stop signal was raised mid-search; chain and pending are unchanged.
    Cancelled,
}

impl MineOutcome {
    pub fn mined(&self) -> bool {
        matches!(self, MineOutcome::Sealed { .. })
    }
}

/// The ledger: sealed blocks plus the queue of records awaiting sealing.
/// Difficulty is fixed for the chain's lifetime; there is no retargeting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Chain {
    pub blocks: Vec<Block>,
    pub pending: RecordQueue,
    pub difficulty: u32,
}

impl Chain {
    /// Create a chain holding only the genesis block.
    pub fn new(difficulty: u32) -> Self {
        Chain {
            blocks: vec![Block::genesis()],
            pending: RecordQueue::new(),
            difficulty,
        }
    }

    pub fn last_block(&self) -> &Block {
        self.blocks
            .last()
            .expect("chain always holds the genesis block")
    }

    /// Queue a record for inclusion in the next sealed block. Payloads are
    /// opaque; no constraint on content or size.
    pub fn add_record(&mut self, payload: impl Into<Record>) {
        self.pending.push(payload);
    }

    /// Seal all pending records into a new block and append it.
    ///
    /// Blocks the calling thread for the whole proof-of-work search; use
    /// [`Chain::mine_pending_with_stop`] from a worker thread for
    /// cancellation.
    pub fn mine_pending(&mut self) -> MineOutcome {
        self.mine_pending_with_stop(&AtomicBool::new(false))
    }

    /// As [`Chain::mine_pending`], but the search checks `stop` once per
    /// nonce and abandons the block if it is raised.
    pub fn mine_pending_with_stop(&mut self, stop: &AtomicBool) -> MineOutcome {
        if self.pending.is_empty() {
            return MineOutcome::NothingPending;
        }

        let last = self.last_block();
        let draft = BlockDraft::new(
            last.index + 1,
            self.pending.snapshot(),
            last.digest.clone(),
        );

        log::info!(
            "mining block {} ({} records, difficulty {})",
            draft.index,
            draft.records.len(),
            self.difficulty
        );
        let started = Instant::now();
        let Some(nonce) = miner::search(&draft, self.difficulty, 0, stop) else {
            log::info!("mining of block {} cancelled", draft.index);
            return MineOutcome::Cancelled;
        };
        let elapsed = started.elapsed();

        let block = draft.seal(nonce);
        log::info!(
            "block {} sealed in {:.2}s (nonce {})",
            block.index,
            elapsed.as_secs_f64(),
            nonce
        );

        let outcome = MineOutcome::Sealed {
            index: block.index,
            nonce,
            digest: block.digest.clone(),
            elapsed,
        };
        self.blocks.push(block);
        self.pending.clear();
        outcome
    }

    /// Demonstration-only: append a record to an already-sealed block WITHOUT
    /// recomputing its digest, leaving the stored digest stale for validation
    /// to catch. Out-of-range indices are a recoverable error; the chain is
    /// left untouched.
    pub fn tamper(
        &mut self,
        block_index: usize,
        payload: impl Into<Record>,
    ) -> Result<(), ChainError> {
        let height = self.blocks.len();
        match self.blocks.get_mut(block_index) {
            Some(block) => {
                block.records.push(payload.into());
                log::warn!(
                    "block {} tampered: record appended without resealing",
                    block_index
                );
                Ok(())
            }
            None => Err(ChainError::BlockOutOfRange {
                index: block_index,
                height,
            }),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{}", block)?;
        }
        write!(f, "Pending records: {:?}", self.pending.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_draft() -> BlockDraft {
        BlockDraft {
            index: 1,
            timestamp: 1_700_000_000_000,
            records: vec!["a".to_string(), "b".to_string()],
            previous_digest: "0".repeat(64),
        }
    }

    #[test]
    fn test_digest_deterministic_across_calls_and_instances() {
        let draft = fixed_draft();
        assert_eq!(draft.digest_with(42), draft.digest_with(42));

        let twin = fixed_draft();
        assert_eq!(draft.digest_with(42), twin.digest_with(42));
    }

    #[test]
    fn test_digest_changes_with_nonce() {
        let draft = fixed_draft();
        assert_ne!(draft.digest_with(0), draft.digest_with(1));
    }

    #[test]
    fn test_sealed_block_digest_matches_recomputation() {
        let block = fixed_draft().seal(7);
        assert_eq!(block.digest, block.computed_digest());
        assert_eq!(block.digest.len(), 64);
        assert!(block.digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(block.digest, block.digest.to_lowercase());
    }

    #[test]
    fn test_genesis_well_formed() {
        let chain = Chain::new(4);
        assert_eq!(chain.blocks.len(), 1);
        assert_eq!(chain.blocks[0].index, 0);
        assert_eq!(chain.blocks[0].previous_digest, GENESIS_PREVIOUS_DIGEST);
        assert!(chain.pending.is_empty());
        assert!(chain.is_valid());
    }

    #[test]
    fn test_mine_pending_grows_chain_and_clears_queue() {
        let mut chain = Chain::new(1);
        chain.add_record("A");
        chain.add_record("B");

        let outcome = chain.mine_pending();
        assert!(outcome.mined());
        assert_eq!(chain.blocks.len(), 2);
        assert!(chain.pending.is_empty());

        let block = &chain.blocks[1];
        assert_eq!(block.index, 1);
        assert_eq!(block.records, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(block.previous_digest, chain.blocks[0].digest);
        assert!(block.digest.starts_with('0'));
    }

    #[test]
    fn test_mine_pending_on_empty_queue_is_noop() {
        let mut chain = Chain::new(1);
        let outcome = chain.mine_pending();
        assert_eq!(outcome, MineOutcome::NothingPending);
        assert_eq!(chain.blocks.len(), 1);
        assert!(chain.pending.is_empty());
    }

    #[test]
    fn test_cancelled_mining_leaves_state_untouched() {
        let mut chain = Chain::new(4);
        chain.add_record("A");

        let stop = AtomicBool::new(true);
        let outcome = chain.mine_pending_with_stop(&stop);
        assert_eq!(outcome, MineOutcome::Cancelled);
        assert_eq!(chain.blocks.len(), 1);
        assert_eq!(chain.pending.len(), 1);
    }

    #[test]
    fn test_tamper_out_of_range_is_recoverable() {
        let mut chain = Chain::new(1);
        let err = chain.tamper(5, "X").unwrap_err();
        assert_eq!(
            err,
            ChainError::BlockOutOfRange {
                index: 5,
                height: 1
            }
        );
        assert!(chain.is_valid());
    }

    #[test]
    fn test_block_display_lists_all_fields() {
        let block = fixed_draft().seal(7);
        let rendered = block.to_string();
        assert!(rendered.contains("Block 1:"));
        assert!(rendered.contains("1700000000000"));
        assert!(rendered.contains("\"a\""));
        assert!(rendered.contains(&block.previous_digest));
        assert!(rendered.contains("Nonce:           7"));
        assert!(rendered.contains(&block.digest));
    }

    #[test]
    fn test_block_serialization_roundtrip() {
        let block = fixed_draft().seal(7);
        let json = serde_json::to_string(&block).expect("serialize");
        let back: Block = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(block, back);
        assert_eq!(back.digest, back.computed_digest());
    }
}
