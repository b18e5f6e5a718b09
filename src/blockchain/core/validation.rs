use crate::blockchain::core::chain::Chain;
use crate::miner::meets_difficulty;
use std::fmt;

/// Which of the three per-block checks a block failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Stored digest differs from a fresh recomputation over the block's
    /// current fields (in-place tampering).
    DigestMismatch,
    /// `previous_digest` does not match the predecessor's stored digest
    /// (reordering, deletion or insertion).
    BrokenLinkage,
    /// Stored digest does not satisfy the chain's difficulty predicate (the
    /// block was never mined, or its nonce was altered without re-mining).
    InsufficientWork,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::DigestMismatch => write!(f, "stored digest does not match its fields"),
            FaultKind::BrokenLinkage => write!(f, "does not link to its predecessor's digest"),
            FaultKind::InsufficientWork => write!(f, "digest lacks the required proof-of-work"),
        }
    }
}

/// The first failing block and the check it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fault {
    pub index: u64,
    pub kind: FaultKind,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block {} failed validation: {}", self.index, self.kind)
    }
}

/// Walk the chain from block 1 and return the first fault found, if any.
///
/// Genesis is exempt from all three checks by construction: the scan starts
/// at index 1 and only consults block 0 as block 1's predecessor. The checks
/// run in a fixed order (digest, then linkage, then proof-of-work) so the
/// reported diagnostic is deterministic.
pub fn first_fault(chain: &Chain) -> Option<Fault> {
    for pair in chain.blocks.windows(2) {
        let (previous, block) = (&pair[0], &pair[1]);

        let kind = if block.digest != block.computed_digest() {
            Some(FaultKind::DigestMismatch)
        } else if block.previous_digest != previous.digest {
            Some(FaultKind::BrokenLinkage)
        } else if !meets_difficulty(&block.digest, chain.difficulty) {
            Some(FaultKind::InsufficientWork)
        } else {
            None
        };

        if let Some(kind) = kind {
            let fault = Fault {
                index: block.index,
                kind,
            };
            log::warn!("{}", fault);
            return Some(fault);
        }
    }
    None
}

impl Chain {
    /// First failing block, if the chain has one. See [`first_fault`].
    pub fn first_fault(&self) -> Option<Fault> {
        first_fault(self)
    }

    /// True iff every block from 1 to the end passes all three checks.
    /// Always returns a definite answer; validation failures are findings,
    /// not errors.
    pub fn is_valid(&self) -> bool {
        self.first_fault().is_none()
    }
}
