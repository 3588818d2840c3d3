use sha2::{Digest, Sha256};
use thiserror::Error;

use super::block::Block;

/// Number of leading zero hex characters required of a valid proof hash.
/// Every function below takes the difficulty as a parameter; this is only
/// the service-level default.
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Errors that can occur during proof-of-work search
#[derive(Debug, Error)]
pub enum PowError {
    #[error("no valid proof found within {attempts} attempts")]
    ProofNotFound { attempts: u64 },
}

/// Serializes a block's content into a deterministic byte encoding
///
/// Field order is fixed and explicit: index, timestamp, transactions, nonce,
/// previous_hash. The timestamp is encoded as unix milliseconds so the bytes
/// never depend on a string rendering of the instant. Re-encoding identical
/// content always yields identical bytes; hash linkage relies on this.
pub fn canonicalize(block: &Block) -> Vec<u8> {
    let mut buf = Vec::new();

    buf.extend_from_slice(&block.index().to_be_bytes());
    buf.extend_from_slice(&block.timestamp().timestamp_millis().to_be_bytes());

    buf.extend_from_slice(&(block.transactions().len() as u64).to_be_bytes());
    for transaction in block.transactions() {
        transaction.canonical_append(&mut buf);
    }

    buf.extend_from_slice(&block.nonce().to_be_bytes());

    let previous_hash = block.previous_hash().as_bytes();
    buf.extend_from_slice(&(previous_hash.len() as u64).to_be_bytes());
    buf.extend_from_slice(previous_hash);

    buf
}

/// Calculates the SHA-256 digest of a block's canonical encoding
///
/// # Returns
///
/// The hash as a lowercase hexadecimal string
pub fn digest(block: &Block) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonicalize(block));
    hex::encode(hasher.finalize())
}

/// Validates a proof: does hashing the reference block's canonical bytes
/// together with `nonce` produce `difficulty` leading zero hex characters?
///
/// The reference is the block PRECEDING the one being sealed; a candidate
/// block is accepted based on its predecessor's content plus the new nonce.
pub fn is_valid_proof(reference: &Block, nonce: u64, difficulty: usize) -> bool {
    let mut hasher = Sha256::new();
    hasher.update(canonicalize(reference));
    hasher.update(nonce.to_string().as_bytes());
    let guess_hash = hex::encode(hasher.finalize());

    let target = "0".repeat(difficulty);
    guess_hash.starts_with(&target)
}

/// Brute-force search for the smallest nonce satisfying the proof predicate
///
/// Scans from 0 upward, so the result is deterministic for a fixed reference
/// block. Unbounded: expected running time grows as 16^difficulty. Callers
/// needing bounded latency should use [`search_bounded`].
pub fn search(reference: &Block, difficulty: usize) -> u64 {
    let mut nonce = 0;
    while !is_valid_proof(reference, nonce, difficulty) {
        nonce += 1;
    }
    nonce
}

/// Like [`search`], but gives up after `max_attempts` nonces
pub fn search_bounded(
    reference: &Block,
    difficulty: usize,
    max_attempts: u64,
) -> Result<u64, PowError> {
    let reference_bytes = canonicalize(reference);
    let target = "0".repeat(difficulty);

    for nonce in 0..max_attempts {
        let mut hasher = Sha256::new();
        hasher.update(&reference_bytes);
        hasher.update(nonce.to_string().as_bytes());
        let guess_hash = hex::encode(hasher.finalize());

        if guess_hash.starts_with(&target) {
            return Ok(nonce);
        }
    }

    Err(PowError::ProofNotFound {
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Transaction;

    fn sample_block() -> Block {
        let transactions = vec![Transaction::new("alice", "bob", 10)];
        Block::new(2, transactions, 77, "prev".to_string())
    }

    #[test]
    fn test_digest_is_stable() {
        let block = sample_block();

        let first = digest(&block);
        let second = digest(&block);

        assert_eq!(first, second);
        assert_eq!(first.len(), 64); // SHA-256 hash is 64 characters in hex
    }

    #[test]
    fn test_canonicalize_is_stable() {
        let block = sample_block();

        assert_eq!(canonicalize(&block), canonicalize(&block));
    }

    #[test]
    fn test_digest_changes_with_content() {
        let block = sample_block();
        let other = Block::new(
            block.index(),
            vec![Transaction::new("alice", "bob", 11)],
            block.nonce(),
            block.previous_hash().to_string(),
        );

        assert_ne!(digest(&block), digest(&other));
    }

    #[test]
    fn test_search_result_satisfies_predicate() {
        let block = sample_block();

        let nonce = search(&block, 1);

        assert!(is_valid_proof(&block, nonce, 1));
    }

    #[test]
    fn test_search_is_deterministic() {
        let block = sample_block();

        assert_eq!(search(&block, 1), search(&block, 1));
    }

    #[test]
    fn test_search_bounded_agrees_with_search() {
        let block = sample_block();

        let unbounded = search(&block, 1);
        let bounded = search_bounded(&block, 1, u64::MAX).unwrap();

        assert_eq!(unbounded, bounded);
    }

    #[test]
    fn test_search_bounded_exhaustion() {
        let block = sample_block();

        // 64 leading zeros is unreachable; any bound exhausts.
        let result = search_bounded(&block, 64, 10);

        assert!(matches!(result, Err(PowError::ProofNotFound { attempts: 10 })));
    }

    #[test]
    fn test_zero_difficulty_accepts_any_nonce() {
        let block = sample_block();

        assert!(is_valid_proof(&block, 0, 0));
        assert!(is_valid_proof(&block, u64::MAX, 0));
    }
}
