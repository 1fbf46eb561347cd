//! Static contract registries.
//!
//! Every protocol keeps its known contracts in a `static` table and indexes
//! it once, lazily, into a `ContractRegistry` keyed by `(chain_id, address)`.
//! Registries are never mutated after construction.

use alloy_primitives::Address;
use std::collections::HashMap;

/// A contract entry that knows where it is deployed.
pub trait Contract: Sync + 'static {
    fn chain_id(&self) -> u64;
    fn address(&self) -> Address;
}

/// Read-only `(chain_id, address)` index over a static table.
pub struct ContractRegistry<T: Contract> {
    by_key: HashMap<(u64, Address), &'static T>,
    table: &'static [T],
}

impl<T: Contract> ContractRegistry<T> {
    pub fn new(table: &'static [T]) -> Self {
        let by_key = table.iter().map(|c| ((c.chain_id(), c.address()), c)).collect();
        Self { by_key, table }
    }

    pub fn get(&self, chain_id: u64, address: &Address) -> Option<&'static T> {
        self.by_key.get(&(chain_id, *address)).copied()
    }

    pub fn contains(&self, chain_id: u64, address: &Address) -> bool {
        self.by_key.contains_key(&(chain_id, *address))
    }

    /// Addresses deployed on one chain, in table order.
    pub fn addresses(&self, chain_id: u64) -> Vec<Address> {
        self.table
            .iter()
            .filter(|c| c.chain_id() == chain_id)
            .map(|c| c.address())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
