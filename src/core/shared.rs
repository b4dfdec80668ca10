//! Thread-safe handle to a chain
//!
//! Validation and append happen under one lock, so two blocks can never be
//! validated against the same unspent output snapshot and both succeed.

use crate::core::block::Block;
use crate::core::blockchain::{Chain, ChainError};
use crate::core::transaction::Transaction;
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable, mutex-guarded owner of a [`Chain`]
#[derive(Debug, Clone)]
pub struct SharedChain {
    inner: Arc<Mutex<Chain>>,
}

impl SharedChain {
    pub fn new(chain: Chain) -> Self {
        Self {
            inner: Arc::new(Mutex::new(chain)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Chain>, ChainError> {
        self.inner.lock().map_err(|_| ChainError::LockPoisoned)
    }

    /// Validate and append a block while holding the lock
    pub fn add_block(&self, block: Block) -> Result<(), ChainError> {
        self.lock()?.add_block(block)
    }

    /// Wrap `transactions` on top of the tip seen under the lock and add them
    pub fn add_transactions(&self, transactions: Vec<Transaction>) -> Result<(), ChainError> {
        self.lock()?.add_transactions(transactions)
    }

    /// Run a read-only closure against the current chain
    pub fn read<T>(&self, f: impl FnOnce(&Chain) -> T) -> Result<T, ChainError> {
        Ok(f(&*self.lock()?))
    }

    pub fn height(&self) -> Result<usize, ChainError> {
        self.read(Chain::height)
    }
}
