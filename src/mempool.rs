//! Pending-record queue: payloads submitted but not yet sealed into a block.

use serde::{Deserialize, Serialize};

/// Record payloads are opaque to the ledger; content is never interpreted.
pub type Record = String;

/// Ordered queue of records awaiting inclusion in the next sealed block.
/// Drained exactly when a block is sealed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordQueue {
    records: Vec<Record>,
}

impl RecordQueue {
    pub fn new() -> Self {
        RecordQueue {
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, payload: impl Into<Record>) {
        self.records.push(payload.into());
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy of the queued records in submission order.
    pub fn snapshot(&self) -> Vec<Record> {
        self.records.clone()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}
