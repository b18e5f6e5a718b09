//! Lock-based chain handle for concurrent producers.
//!
//! The core [`Chain`] is single-threaded. When multiple producers submit
//! records while a miner runs, every operation needs a serialization point,
//! in particular the read-then-clear of the pending queue during sealing,
//! which must be atomic. [`SharedChain`] provides that point with one mutex
//! around the whole chain. Mining through the handle holds the lock for the
//! full search; callers wanting responsiveness mine on a worker thread and
//! cancel via the stop signal.

use crate::blockchain::{Chain, Fault, MineOutcome};
use crate::error::ChainError;
use crate::mempool::Record;
use parking_lot::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub struct SharedChain {
    inner: Arc<Mutex<Chain>>,
}

impl SharedChain {
    pub fn new(chain: Chain) -> Self {
        SharedChain {
            inner: Arc::new(Mutex::new(chain)),
        }
    }

    pub fn add_record(&self, payload: impl Into<Record>) {
        self.inner.lock().add_record(payload);
    }

    pub fn mine_pending(&self) -> MineOutcome {
        self.inner.lock().mine_pending()
    }

    pub fn mine_pending_with_stop(&self, stop: &AtomicBool) -> MineOutcome {
        self.inner.lock().mine_pending_with_stop(stop)
    }

    pub fn is_valid(&self) -> bool {
        self.inner.lock().is_valid()
    }

    pub fn first_fault(&self) -> Option<Fault> {
        self.inner.lock().first_fault()
    }

    pub fn tamper(&self, block_index: usize, payload: impl Into<Record>) -> Result<(), ChainError> {
        self.inner.lock().tamper(block_index, payload)
    }

    pub fn block_count(&self) -> usize {
        self.inner.lock().blocks.len()
    }

    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Owned copy of the chain at this instant, for inspection or rendering.
    pub fn snapshot(&self) -> Chain {
        self.inner.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_concurrent_producers_all_sealed_by_one_mine() {
        let shared = SharedChain::new(Chain::new(1));

        thread::scope(|scope| {
            for producer in 0..4 {
                let handle = shared.clone();
                scope.spawn(move || {
                    for i in 0..10 {
                        handle.add_record(format!("producer {} record {}", producer, i));
                    }
                });
            }
        });
        assert_eq!(shared.pending_count(), 40);

        let outcome = shared.mine_pending();
        assert!(outcome.mined());
        assert_eq!(shared.block_count(), 2);
        assert_eq!(shared.pending_count(), 0);

        let chain = shared.snapshot();
        assert_eq!(chain.blocks[1].records.len(), 40);
        assert!(shared.is_valid());
    }

    #[test]
    fn test_cancelled_mine_through_handle_keeps_pending() {
        let shared = SharedChain::new(Chain::new(4));
        shared.add_record("queued");

        let stop = AtomicBool::new(true);
        assert_eq!(shared.mine_pending_with_stop(&stop), MineOutcome::Cancelled);
        assert_eq!(shared.block_count(), 1);
        assert_eq!(shared.pending_count(), 1);
    }
}
