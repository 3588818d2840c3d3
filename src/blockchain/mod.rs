// Ledger core module
//
// This module contains the core ledger implementation including:
// - Block structure
// - Ledger structure (chain + pending transactions)
// - Transaction structure
// - Proof of work algorithm

pub mod block;
pub mod ledger;
pub mod pow;
pub mod transaction;

// Re-export main components for easier access
pub use block::Block;
pub use ledger::{is_chain_valid, Ledger, LedgerError};
pub use pow::PowError;
pub use transaction::Transaction;
