//! Unspent output index
//!
//! The set is a pure function of chain history: every output ever created,
//! minus every output ever referenced by an input. It is rebuilt from scratch
//! after each appended block rather than patched incrementally.

use crate::core::block::Block;
use crate::core::transaction::Output;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Mapping from output id to the unspent output
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UtxoSet {
    outputs: HashMap<i64, Output>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the unspent outputs of `blocks`
    pub fn from_blocks(blocks: &[Block]) -> Self {
        let spent: HashSet<i64> = blocks
            .iter()
            .flat_map(|b| b.transactions.iter())
            .flat_map(|tx| tx.inputs.iter())
            .map(|input| input.id)
            .collect();

        let outputs: HashMap<i64, Output> = blocks
            .iter()
            .flat_map(Block::outputs)
            .filter(|output| !spent.contains(&output.id))
            .map(|output| (output.id, output.clone()))
            .collect();

        log::trace!(
            "Rebuilt unspent outputs from {} blocks: {} unspent, {} spent",
            blocks.len(),
            outputs.len(),
            spent.len()
        );
        Self { outputs }
    }

    pub fn get(&self, id: i64) -> Option<&Output> {
        self.outputs.get(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.outputs.contains_key(&id)
    }

    /// Value of the unspent output `id`, or zero if it is not in the set
    pub fn value_of(&self, id: i64) -> f64 {
        self.get(id).map(|o| o.value).unwrap_or(0.0)
    }

    /// Unspent ids in ascending order
    pub fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.outputs.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Sum of all unspent values
    pub fn total_value(&self) -> f64 {
        self.outputs.values().map(|o| o.value).sum()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
