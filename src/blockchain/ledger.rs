use std::sync::{Arc, Mutex};

use log::{info, warn};
use thiserror::Error;

use super::block::{Block, GENESIS_PREVIOUS_HASH};
use super::pow;
use super::transaction::Transaction;

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("nonce {nonce} does not satisfy the difficulty predicate")]
    InvalidProof { nonce: u64 },

    #[error("ledger chain is empty; construction invariant violated")]
    EmptyChain,
}

/// Chain and pending buffer, guarded together by a single lock so that
/// sealing snapshots the pending transactions and appends the block as one
/// atomic step.
#[derive(Debug)]
struct LedgerState {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
}

/// Represents the ledger: an append-only chain of hash-linked blocks plus
/// the buffer of transactions waiting to be sealed
///
/// Cloning yields another handle to the same underlying state.
#[derive(Debug, Clone)]
pub struct Ledger {
    state: Arc<Mutex<LedgerState>>,

    /// Number of leading zero hex characters required of a valid proof,
    /// fixed at construction
    difficulty: usize,
}

impl Ledger {
    /// Creates a new ledger containing only the genesis block, using the
    /// default difficulty
    pub fn new() -> Self {
        Self::with_difficulty(pow::DEFAULT_DIFFICULTY)
    }

    /// Creates a new ledger with the given proof-of-work difficulty
    pub fn with_difficulty(difficulty: usize) -> Self {
        Ledger {
            state: Arc::new(Mutex::new(LedgerState {
                chain: vec![Block::genesis()],
                pending: Vec::new(),
            })),
            difficulty,
        }
    }

    /// The configured proof-of-work difficulty
    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Returns the last appended block
    ///
    /// `EmptyChain` indicates a broken construction invariant, not a
    /// recoverable condition: the genesis block is appended at construction
    /// and blocks are never removed.
    pub fn tip(&self) -> Result<Block, LedgerError> {
        let state = self.state.lock().unwrap();
        state.chain.last().cloned().ok_or(LedgerError::EmptyChain)
    }

    /// Queues a transaction for inclusion in the next sealed block
    ///
    /// Insertion order is preserved and no validation is performed.
    ///
    /// # Returns
    ///
    /// The index of the block that will include this transaction
    pub fn queue_transaction(&self, transaction: Transaction) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.pending.push(transaction);

        // chain is non-empty by construction
        state.chain.last().map(|block| block.index() + 1).unwrap_or(1)
    }

    /// Seals the pending transactions into a new block
    ///
    /// The supplied nonce is validated against the CURRENT TIP's content
    /// before anything is mutated: on `InvalidProof` both the chain and the
    /// pending buffer are left untouched. On success the pending buffer is
    /// consumed into the new block, the block is appended, and a clone of it
    /// is returned.
    pub fn seal_block(&self, nonce: u64) -> Result<Block, LedgerError> {
        let mut state = self.state.lock().unwrap();
        let tip = state.chain.last().cloned().ok_or(LedgerError::EmptyChain)?;

        if !pow::is_valid_proof(&tip, nonce, self.difficulty) {
            warn!("rejected seal attempt with nonce {}", nonce);
            return Err(LedgerError::InvalidProof { nonce });
        }

        let block = Block::new(
            tip.index() + 1,
            std::mem::take(&mut state.pending),
            nonce,
            pow::digest(&tip),
        );
        state.chain.push(block.clone());

        info!(
            "sealed block {} with {} transaction(s)",
            block.index(),
            block.transactions().len()
        );

        Ok(block)
    }

    /// Returns an owned copy of the full chain
    pub fn snapshot(&self) -> Vec<Block> {
        self.state.lock().unwrap().chain.clone()
    }

    /// Returns an owned copy of the pending transactions
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().pending.clone()
    }

    /// Validates the full chain against the configured difficulty
    pub fn is_valid(&self) -> bool {
        is_chain_valid(&self.snapshot(), self.difficulty)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

/// Verifies a chain of blocks independently of any `Ledger` instance
///
/// Checks, in order: the chain is non-empty; the first block carries index 1
/// and the genesis sentinel; every later block increments the index by 1,
/// records its predecessor's digest, and carries a nonce satisfying the
/// difficulty predicate against that predecessor. A tampered historical
/// block surfaces here as a digest mismatch on its successor.
pub fn is_chain_valid(chain: &[Block], difficulty: usize) -> bool {
    let genesis = match chain.first() {
        Some(block) => block,
        None => return false,
    };

    if genesis.index() != 1 || genesis.previous_hash() != GENESIS_PREVIOUS_HASH {
        return false;
    }

    for window in chain.windows(2) {
        let (previous, current) = (&window[0], &window[1]);

        if current.index() != previous.index() + 1 {
            return false;
        }

        if current.previous_hash() != pow::digest(previous) {
            return false;
        }

        if !pow::is_valid_proof(previous, current.nonce(), difficulty) {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    // Difficulty 1 keeps the brute-force search in the tests fast.
    const TEST_DIFFICULTY: usize = 1;

    fn test_ledger() -> Ledger {
        Ledger::with_difficulty(TEST_DIFFICULTY)
    }

    /// Finds a nonce that fails the predicate against the current tip.
    fn failing_nonce(ledger: &Ledger) -> u64 {
        let tip = ledger.tip().unwrap();
        (0..).find(|&n| !pow::is_valid_proof(&tip, n, TEST_DIFFICULTY)).unwrap()
    }

    #[test]
    fn test_new_ledger_has_genesis() {
        let ledger = test_ledger();
        let chain = ledger.snapshot();

        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].index(), 1);
        assert_eq!(chain[0].previous_hash(), GENESIS_PREVIOUS_HASH);
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn test_queue_transaction_preserves_order() {
        let ledger = test_ledger();

        let including = ledger.queue_transaction(Transaction::new("a", "b", 1));
        ledger.queue_transaction(Transaction::new("b", "c", 2));

        assert_eq!(including, 2);
        let pending = ledger.pending_transactions();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].sender, "a");
        assert_eq!(pending[1].sender, "b");
    }

    #[test]
    fn test_seal_block_scenario() {
        let ledger = test_ledger();
        ledger.queue_transaction(Transaction::new("A", "B", 1));

        let genesis = ledger.tip().unwrap();
        let nonce = pow::search(&genesis, TEST_DIFFICULTY);
        let block = ledger.seal_block(nonce).unwrap();

        let chain = ledger.snapshot();
        assert_eq!(chain.len(), 2);
        assert_eq!(block.index(), 2);
        assert_eq!(block.transactions(), &[Transaction::new("A", "B", 1)]);
        assert_eq!(block.previous_hash(), pow::digest(&genesis));
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn test_seal_block_rejects_invalid_nonce() {
        let ledger = test_ledger();
        ledger.queue_transaction(Transaction::new("A", "B", 1));
        let bad_nonce = failing_nonce(&ledger);

        let result = ledger.seal_block(bad_nonce);

        assert!(matches!(result, Err(LedgerError::InvalidProof { .. })));
        // No partial mutation: chain and pending are untouched.
        assert_eq!(ledger.snapshot().len(), 1);
        assert_eq!(ledger.pending_transactions().len(), 1);
    }

    #[test]
    fn test_sealed_chain_is_valid() {
        let ledger = test_ledger();

        for i in 0..3 {
            ledger.queue_transaction(Transaction::new("A", "B", i));
            let tip = ledger.tip().unwrap();
            let nonce = pow::search(&tip, TEST_DIFFICULTY);
            ledger.seal_block(nonce).unwrap();
        }

        let chain = ledger.snapshot();
        assert_eq!(chain.len(), 4);
        for (i, block) in chain.iter().enumerate() {
            assert_eq!(block.index(), i as u64 + 1);
        }
        assert!(ledger.is_valid());
    }

    #[test]
    fn test_tampered_chain_is_detected() {
        let ledger = test_ledger();
        ledger.queue_transaction(Transaction::new("A", "B", 1));
        let tip = ledger.tip().unwrap();
        let nonce = pow::search(&tip, TEST_DIFFICULTY);
        ledger.seal_block(nonce).unwrap();

        assert!(ledger.is_valid());

        // Rebuild the chain with the genesis transactions replaced: the
        // successor still records the digest of the untampered block.
        let chain = ledger.snapshot();
        let tampered_genesis = Block::new(
            1,
            vec![Transaction::new("mallory", "mallory", 1_000_000)],
            chain[0].nonce(),
            chain[0].previous_hash().to_string(),
        );
        let tampered = vec![tampered_genesis, chain[1].clone()];

        assert!(!is_chain_valid(&tampered, TEST_DIFFICULTY));
    }

    #[test]
    fn test_empty_chain_is_invalid() {
        assert!(!is_chain_valid(&[], TEST_DIFFICULTY));
    }
}
