//! UTXO Ledger: a minimal, validated cryptocurrency ledger in Rust
//!
//! This crate provides an append-only chain of blocks holding signed,
//! UTXO-style transactions:
//! - Numbered outputs claimed by RSA-signed inputs
//! - Coinbase transactions capped by a configurable reward
//! - A seven-rule block validation pipeline with typed failures
//! - An unspent output index rebuilt from chain history
//!
//! # Example
//!
//! ```rust,no_run
//! use utxo_ledger::core::{Block, Chain, Input, Output, Transaction};
//! use utxo_ledger::crypto::KeyPair;
//!
//! let alice = KeyPair::generate()?;
//! let bob = KeyPair::generate()?;
//!
//! // Genesis block mints the reward to Alice
//! let genesis = Block::genesis(vec![Transaction::basic_coinbase(&alice.public_key, 0, 100.0)]);
//! let mut chain = Chain::with_genesis(genesis)?;
//!
//! // Alice sends everything to Bob
//! let spend = Transaction::new(
//!     vec![Input::new(0, chain.get_signature(0, &alice.private_key)?)],
//!     vec![Output::new(1, 100.0, bob.public_key.clone())],
//! );
//! chain.add_transactions(vec![Transaction::default(), spend])?;
//!
//! assert_eq!(chain.height(), 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod core;
pub mod crypto;

// Re-export commonly used types
pub use crate::core::{
    Block, Chain, ChainError, Input, LedgerConfig, Output, SharedChain, Transaction,
    ValidationError, DEFAULT_REWARD,
};
pub use crate::crypto::{KeyPair, PublicKey};
