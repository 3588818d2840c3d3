use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Represents a transaction in the ledger
///
/// A closed record: sender, recipient, amount. The ledger does not interpret
/// these fields beyond hashing them; there is no signature verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Sender's address
    pub sender: String,

    /// Recipient's address
    pub recipient: String,

    /// Amount being transferred
    pub amount: u64,
}

impl Transaction {
    /// Creates a new transaction
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: u64) -> Self {
        Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// Appends this transaction's canonical byte encoding to `buf`
    ///
    /// Fields are written in declaration order with length-prefixed strings,
    /// so re-encoding identical content always yields identical bytes.
    pub fn canonical_append(&self, buf: &mut Vec<u8>) {
        append_str(buf, &self.sender);
        append_str(buf, &self.recipient);
        buf.extend_from_slice(&self.amount.to_be_bytes());
    }
}

fn append_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(&(s.len() as u64).to_be_bytes());
    buf.extend_from_slice(s.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction() {
        let transaction = Transaction::new("alice", "bob", 42);

        assert_eq!(transaction.sender, "alice");
        assert_eq!(transaction.recipient, "bob");
        assert_eq!(transaction.amount, 42);
    }

    #[test]
    fn test_canonical_encoding_is_deterministic() {
        let transaction = Transaction::new("alice", "bob", 42);

        let mut first = Vec::new();
        transaction.canonical_append(&mut first);
        let mut second = Vec::new();
        transaction.canonical_append(&mut second);

        assert_eq!(first, second);
    }

    #[test]
    fn test_canonical_encoding_distinguishes_field_boundaries() {
        // "ab" + "c" must not encode to the same bytes as "a" + "bc".
        let mut left = Vec::new();
        Transaction::new("ab", "c", 1).canonical_append(&mut left);
        let mut right = Vec::new();
        Transaction::new("a", "bc", 1).canonical_append(&mut right);

        assert_ne!(left, right);
    }
}
