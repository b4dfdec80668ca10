//! Core ledger components
//!
//! This module contains the fundamental building blocks:
//! - Transactions (id-addressed UTXO model, text serialization)
//! - Blocks (hash-linked, memoized hashes)
//! - Unspent output index (rebuilt from history)
//! - Validation pipeline (ordered rules, typed failures)
//! - Chain (the single mutator) and its thread-safe wrapper

pub mod block;
pub mod blockchain;
pub mod config;
pub mod shared;
pub mod transaction;
pub mod utxo;
pub mod validation;

pub use block::{Block, GENESIS_HASH};
pub use blockchain::{Chain, ChainError, ChainStats};
pub use config::{ConfigError, LedgerConfig, DEFAULT_REWARD};
pub use shared::SharedChain;
pub use transaction::{Input, Output, Transaction, TransactionError, FIELD_SEPARATOR};
pub use utxo::UtxoSet;
pub use validation::{BlockValidator, ValidationError};
