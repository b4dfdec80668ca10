//! Chain implementation
//!
//! The chain owns the ordered blocks and the unspent output index derived
//! from them. It is the only place ledger state changes, and every change goes
//! through the validation pipeline first: a rejected block leaves the chain
//! exactly as it was.
//!
//! `Chain` has no internal locking. Mutation takes `&mut self`; callers that
//! share a chain across threads should go through [`SharedChain`].
//!
//! [`SharedChain`]: crate::core::SharedChain

use crate::core::block::{Block, GENESIS_HASH};
use crate::core::config::LedgerConfig;
use crate::core::transaction::{Input, Output, Transaction};
use crate::core::utxo::UtxoSet;
use crate::core::validation::{BlockValidator, ValidationError};
use crate::crypto::{sign, KeyError, PrivateKey};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Chain-related errors
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Invalid block: {0}")]
    Validation(#[from] ValidationError),
    #[error("Output not found: {0}")]
    NotFound(i64),
    #[error("Key error: {0}")]
    Key(#[from] KeyError),
    #[error("Chain lock poisoned")]
    LockPoisoned,
}

/// The ledger: blocks plus the unspent outputs they leave behind
#[derive(Debug, Clone, Serialize)]
pub struct Chain {
    blocks: Vec<Block>,
    #[serde(skip)]
    utxo: UtxoSet,
    #[serde(skip)]
    config: LedgerConfig,
}

impl Chain {
    /// Create a chain seeded with `genesis`, which must itself pass validation
    pub fn new(genesis: Block, config: LedgerConfig) -> Result<Self, ChainError> {
        let mut chain = Self {
            blocks: Vec::new(),
            utxo: UtxoSet::new(),
            config,
        };
        chain.add_block(genesis)?;
        Ok(chain)
    }

    /// Create a chain with the default configuration
    pub fn with_genesis(genesis: Block) -> Result<Self, ChainError> {
        Self::new(genesis, LedgerConfig::default())
    }

    /// Number of blocks, genesis included
    pub fn height(&self) -> usize {
        self.blocks.len()
    }

    /// Get the latest block
    pub fn last(&self) -> &Block {
        self.blocks
            .last()
            .expect("Chain should have at least a genesis block")
    }

    /// Highest output id created by the latest block, or -1
    pub fn last_id(&self) -> i64 {
        self.validator().last_id()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn unspent_outputs(&self) -> &UtxoSet {
        &self.utxo
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    fn validator(&self) -> BlockValidator<'_> {
        BlockValidator::new(&self.blocks, &self.utxo, self.config.reward)
    }

    /// Check `block` against the current state without appending it
    pub fn validate(&self, block: &Block) -> Result<(), ValidationError> {
        self.validator().validate(block)
    }

    /// Validate and append a block, then rebuild the unspent output index
    pub fn add_block(&mut self, block: Block) -> Result<(), ChainError> {
        if let Err(err) = self.validate(&block) {
            log::debug!("Rejected block {}: {}", block.hash(), err);
            return Err(err.into());
        }

        self.blocks.push(block);
        self.utxo = UtxoSet::from_blocks(&self.blocks);

        log::info!(
            "Appended block {} at height {} ({} unspent outputs)",
            self.last().hash(),
            self.height(),
            self.utxo.len()
        );
        Ok(())
    }

    /// Wrap `transactions` in a block on top of the current tip and add it
    pub fn add_transactions(&mut self, transactions: Vec<Transaction>) -> Result<(), ChainError> {
        let last_hash = self
            .blocks
            .last()
            .map(|b| b.hash().to_string())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        self.add_block(Block::new(last_hash, transactions))
    }

    /// Look up an output, spent or not
    pub fn find_opt(&self, id: i64) -> Option<&Output> {
        self.validator().find_output(id)
    }

    /// Look up an output that must have existed at some point
    pub fn find(&self, id: i64) -> Result<&Output, ChainError> {
        self.find_opt(id).ok_or(ChainError::NotFound(id))
    }

    /// Sign output `id` so it can be claimed by an input
    pub fn get_signature(&self, id: i64, key: &PrivateKey) -> Result<String, ChainError> {
        let output = self.find(id)?;
        Ok(sign(&output.serialize(), key)?)
    }

    /// Whether `input` carries a valid signature for the output it claims
    pub fn verify_signature(&self, input: &Input) -> bool {
        self.validator().verify_signature(input)
    }

    /// Check the hash links of the whole chain
    pub fn is_valid(&self) -> bool {
        self.blocks
            .windows(2)
            .all(|pair| pair[1].last_hash == pair[0].hash())
    }

    /// Get chain statistics
    pub fn stats(&self) -> ChainStats {
        ChainStats {
            height: self.height(),
            total_transactions: self.blocks.iter().map(Block::tx_count).sum(),
            unspent_outputs: self.utxo.len(),
            unspent_value: self.utxo.total_value(),
            latest_hash: self.last().hash().to_string(),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Size: {}", self.blocks.len())?;
        writeln!(f)?;

        for (i, block) in self.blocks.iter().enumerate() {
            writeln!(f, "Block {}", i)?;
            writeln!(f, "hash: {}", block.hash())?;
            writeln!(f, "last hash: {}", block.last_hash)?;
            writeln!(f, "transactions:")?;
            for (j, tx) in block.transactions.iter().enumerate() {
                if j == 0 {
                    writeln!(f, "  Transaction: {} (coinbase)", j)?;
                } else {
                    writeln!(f, "  Transaction: {}", j)?;
                }
                writeln!(f, "{}", tx)?;
            }
        }
        Ok(())
    }
}

/// Chain statistics
#[derive(Debug, Clone, Serialize)]
pub struct ChainStats {
    pub height: usize,
    pub total_transactions: usize,
    pub unspent_outputs: usize,
    pub unspent_value: f64,
    pub latest_hash: String,
}
