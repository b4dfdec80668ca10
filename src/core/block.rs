//! Block implementation for the ledger
//!
//! A block links to its predecessor by hash and carries an ordered list of
//! transactions, the first of which is the coinbase.

use crate::core::transaction::{Output, Transaction};
use crate::crypto::sha256_hex_chunks;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// `last_hash` of a genesis block
pub const GENESIS_HASH: &str = "0";

/// A block in the chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Hash of the previous block, or [`GENESIS_HASH`]
    pub last_hash: String,
    /// Transactions, coinbase first
    pub transactions: Vec<Transaction>,
    /// Memoized block hash
    #[serde(skip)]
    hash: OnceLock<String>,
}

impl Block {
    pub fn new(last_hash: impl Into<String>, transactions: Vec<Transaction>) -> Self {
        Self {
            last_hash: last_hash.into(),
            transactions,
            hash: OnceLock::new(),
        }
    }

    /// Create a block with no predecessor
    pub fn genesis(transactions: Vec<Transaction>) -> Self {
        Self::new(GENESIS_HASH, transactions)
    }

    /// Hex SHA-256 of the last hash followed by every serialized transaction.
    ///
    /// Computed on first call and cached; later edits to the block's fields
    /// are not reflected.
    pub fn hash(&self) -> &str {
        self.hash.get_or_init(|| {
            let serialized = self.transactions.iter().map(Transaction::serialize);
            sha256_hex_chunks(std::iter::once(self.last_hash.clone()).chain(serialized))
        })
    }

    /// Get the coinbase transaction (first transaction)
    pub fn coinbase_tx(&self) -> Option<&Transaction> {
        self.transactions.first()
    }

    /// Value minted by the coinbase transaction
    pub fn coinbase_value(&self) -> f64 {
        self.coinbase_tx().map(Transaction::value).unwrap_or(0.0)
    }

    /// All outputs created by this block, in transaction order
    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.transactions.iter().flat_map(|tx| tx.outputs.iter())
    }

    /// Highest output id created by this block
    pub fn max_output_id(&self) -> Option<i64> {
        self.outputs().map(|o| o.id).max()
    }

    /// Get number of transactions in this block
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::Input;
    use crate::crypto::keys::test_key_pair;
    use crate::crypto::sha256_hex;

    fn sample_block() -> Block {
        let key = &test_key_pair(0).public_key;
        Block::new(
            "abc",
            vec![
                Transaction::basic_coinbase(key, 4, 100.0),
                Transaction::new(
                    vec![Input::new(1, "sig")],
                    vec![Output::new(5, 60.0, key.clone()), Output::new(6, 40.0, key.clone())],
                ),
            ],
        )
    }

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis(vec![]);
        assert_eq!(genesis.last_hash, GENESIS_HASH);
        assert_eq!(genesis.tx_count(), 0);
        assert_eq!(genesis.coinbase_value(), 0.0);
        assert_eq!(genesis.max_output_id(), None);
    }

    #[test]
    fn test_hash_covers_last_hash_and_transactions() {
        let block = sample_block();
        let payload: String = std::iter::once("abc".to_string())
            .chain(block.transactions.iter().map(Transaction::serialize))
            .collect();

        assert_eq!(block.hash(), sha256_hex(payload.as_bytes()));
        assert_eq!(block.hash().len(), 64);
    }

    #[test]
    fn test_hash_is_memoized() {
        let mut block = sample_block();
        let first = block.hash().to_string();
        assert_eq!(block.hash(), first);

        block.last_hash = "tampered".to_string();
        block.transactions.clear();
        assert_eq!(block.hash(), first);

        let fresh = Block::new("tampered", vec![]);
        assert_ne!(fresh.hash(), first);
    }

    #[test]
    fn test_different_predecessor_changes_hash() {
        let a = Block::new("a", vec![]);
        let b = Block::new("b", vec![]);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_outputs_and_coinbase() {
        let block = sample_block();
        let ids: Vec<i64> = block.outputs().map(|o| o.id).collect();

        assert_eq!(ids, vec![4, 5, 6]);
        assert_eq!(block.max_output_id(), Some(6));
        assert_eq!(block.coinbase_value(), 100.0);
    }
}
