//! Block validation pipeline
//!
//! Decides whether a candidate block may be appended to a chain. Rules run in
//! a fixed order against the pre-append state and the first violated rule is
//! reported; validation never mutates anything.
//!
//! 1. the block links to the current tip
//! 2. every input references an unspent output
//! 3. no output is spent twice within the block
//! 4. non-coinbase transactions are covered by their inputs
//! 5. the coinbase does not exceed the reward
//! 6. new output ids are unique and above the previous block's highest id
//! 7. every input signature verifies

use crate::core::block::Block;
use crate::core::transaction::{Input, Output, Transaction};
use crate::core::utxo::UtxoSet;
use crate::crypto::verify;
use std::collections::HashMap;
use thiserror::Error;

/// Reasons a block is rejected. A valid block is `Ok(())`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid last hash: expected {expected}, got {actual}")]
    InvalidLastHash { expected: String, actual: String },
    #[error("Inputs reference spent or unknown outputs: {ids:?}")]
    PreviouslySpentTransactions { ids: Vec<i64> },
    #[error("Outputs spent more than once in the block: {ids:?}")]
    TransactionDoubleSpend { ids: Vec<i64> },
    #[error("{} transaction(s) spend more than their inputs", .transactions.len())]
    InsufficientInputValue { transactions: Vec<Transaction> },
    #[error("Coinbase reward too large: {amount}")]
    CoinbaseRewardTooLarge { amount: f64 },
    #[error("Invalid output ids: {ids:?}")]
    InvalidTransactionIds { ids: Vec<i64> },
    #[error("Bad signatures on inputs: {:?}", .inputs.iter().map(|i| i.id).collect::<Vec<_>>())]
    BadSignatures { inputs: Vec<Input> },
}

/// Read-only view of chain state that blocks are validated against
#[derive(Debug, Clone, Copy)]
pub struct BlockValidator<'a> {
    blocks: &'a [Block],
    utxo: &'a UtxoSet,
    reward: f64,
}

impl<'a> BlockValidator<'a> {
    pub fn new(blocks: &'a [Block], utxo: &'a UtxoSet, reward: f64) -> Self {
        Self {
            blocks,
            utxo,
            reward,
        }
    }

    /// Run every rule in order, returning the first violation
    pub fn validate(&self, block: &Block) -> Result<(), ValidationError> {
        self.check_last_hash(block)?;
        self.check_previously_spent(block)?;
        self.check_double_spend(block)?;
        self.check_input_value(block)?;
        self.check_coinbase(block)?;
        self.check_output_ids(block)?;
        self.check_signatures(block)
    }

    /// Resolve an output by id: unspent outputs first, then full history
    pub fn find_output(&self, id: i64) -> Option<&'a Output> {
        self.utxo.get(id).or_else(|| {
            self.blocks
                .iter()
                .flat_map(Block::outputs)
                .find(|output| output.id == id)
        })
    }

    /// Check an input's signature against the output it references.
    ///
    /// Unknown outputs and malformed keys or signatures all count as `false`.
    pub fn verify_signature(&self, input: &Input) -> bool {
        let Some(output) = self.find_output(input.id) else {
            return false;
        };
        verify(&output.serialize(), &input.signature, &output.destination).unwrap_or(false)
    }

    /// Highest output id in the last block, or -1
    pub fn last_id(&self) -> i64 {
        self.blocks
            .last()
            .and_then(Block::max_output_id)
            .unwrap_or(-1)
    }

    fn check_last_hash(&self, block: &Block) -> Result<(), ValidationError> {
        match self.blocks.last() {
            Some(last) if last.hash() != block.last_hash => Err(ValidationError::InvalidLastHash {
                expected: last.hash().to_string(),
                actual: block.last_hash.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn check_previously_spent(&self, block: &Block) -> Result<(), ValidationError> {
        let ids: Vec<i64> = inputs(block)
            .map(|input| input.id)
            .filter(|id| !self.utxo.contains(*id))
            .collect();

        if ids.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::PreviouslySpentTransactions { ids })
        }
    }

    fn check_double_spend(&self, block: &Block) -> Result<(), ValidationError> {
        let ids: Vec<i64> = count_in_order(inputs(block).map(|input| input.id))
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id)
            .collect();

        if ids.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::TransactionDoubleSpend { ids })
        }
    }

    fn check_input_value(&self, block: &Block) -> Result<(), ValidationError> {
        // The coinbase is capped separately.
        let transactions: Vec<Transaction> = block
            .transactions
            .iter()
            .skip(1)
            .filter(|tx| !covers(self.input_value(tx), tx.value()))
            .cloned()
            .collect();

        if transactions.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::InsufficientInputValue { transactions })
        }
    }

    fn input_value(&self, tx: &Transaction) -> f64 {
        tx.inputs
            .iter()
            .map(|input| self.utxo.value_of(input.id))
            .sum()
    }

    fn check_coinbase(&self, block: &Block) -> Result<(), ValidationError> {
        let amount = block.coinbase_value();
        if !covers(self.reward, amount) {
            Err(ValidationError::CoinbaseRewardTooLarge { amount })
        } else {
            Ok(())
        }
    }

    /// Only the previous block's maximum is compared, so an id reused from an
    /// older block can still pass.
    fn check_output_ids(&self, block: &Block) -> Result<(), ValidationError> {
        let last_id = self.last_id();
        let ids: Vec<i64> = count_in_order(block.outputs().map(|output| output.id))
            .into_iter()
            .filter(|(id, count)| *count > 1 || *id <= last_id)
            .map(|(id, _)| id)
            .collect();

        if ids.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::InvalidTransactionIds { ids })
        }
    }

    fn check_signatures(&self, block: &Block) -> Result<(), ValidationError> {
        let inputs: Vec<Input> = inputs(block)
            .filter(|input| !self.verify_signature(input))
            .cloned()
            .collect();

        if inputs.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::BadSignatures { inputs })
        }
    }
}

/// Whether `available` pays for `spent`. A non-finite total never passes,
/// so NaN or infinite outputs cannot cancel out against real ones.
fn covers(available: f64, spent: f64) -> bool {
    spent.is_finite() && available >= spent
}

fn inputs(block: &Block) -> impl Iterator<Item = &Input> {
    block.transactions.iter().flat_map(|tx| tx.inputs.iter())
}

/// Occurrence count per id, in order of first appearance
fn count_in_order(ids: impl Iterator<Item = i64>) -> Vec<(i64, usize)> {
    let mut positions: HashMap<i64, usize> = HashMap::new();
    let mut counts: Vec<(i64, usize)> = Vec::new();

    for id in ids {
        match positions.get(&id) {
            Some(&index) => counts[index].1 += 1,
            None => {
                positions.insert(id, counts.len());
                counts.push((id, 1));
            }
        }
    }

    counts
}
