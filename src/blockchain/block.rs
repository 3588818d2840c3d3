use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::transaction::Transaction;

/// Previous-hash sentinel carried by the genesis block. Never a computed
/// digest, so chain verification treats the first block specially.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

/// Nonce recorded on the genesis block. Genesis is constructed, not sealed,
/// so this value is never checked against the difficulty predicate.
pub const GENESIS_NONCE: u64 = 1234;

/// Represents a block in the ledger
///
/// Blocks are immutable once created: fields are read through accessors and
/// no mutation API exists, since changing any field would invalidate the
/// hash linkage of every successor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Block {
    /// Index of the block in the chain (1-based, genesis is 1)
    index: u64,

    /// Timestamp when the block was created
    #[schema(value_type = String, example = "2023-01-01T12:00:00Z")]
    timestamp: DateTime<Utc>,

    /// Transactions sealed into this block
    transactions: Vec<Transaction>,

    /// Nonce solving the proof-of-work predicate for this block
    nonce: u64,

    /// Hash of the previous block (hex), or the genesis sentinel
    previous_hash: String,
}

impl Block {
    /// Creates a new block with a fresh timestamp
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the block in the chain
    /// * `transactions` - The transactions to seal into the block
    /// * `nonce` - The proof-of-work nonce
    /// * `previous_hash` - The hash of the previous block
    pub fn new(index: u64, transactions: Vec<Transaction>, nonce: u64, previous_hash: String) -> Self {
        Block {
            index,
            timestamp: Utc::now(),
            transactions,
            nonce,
            previous_hash,
        }
    }

    /// Creates the genesis block (index 1, sentinel previous hash)
    pub fn genesis() -> Self {
        Block::new(1, Vec::new(), GENESIS_NONCE, GENESIS_PREVIOUS_HASH.to_string())
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn previous_hash(&self) -> &str {
        &self.previous_hash
    }
}
