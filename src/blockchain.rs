// Thin re-export module: implementation is in `blockchain/core.rs` to allow
// progressive decomposition of ledger responsibilities (sealing, validation,
// chain management).

pub mod core;
pub use core::*;
