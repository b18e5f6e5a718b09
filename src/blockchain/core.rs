// core.rs splits ledger responsibilities into submodules for easier maintenance.
pub mod chain;
pub mod validation;

pub use chain::*;
pub use validation::*;
