//! Raw execution records as delivered by the chain-data layer.
//!
//! These are the input to every classification. They are assumed to be
//! well-formed; nothing here is validated beyond what the types enforce.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Receipt status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    #[default]
    Success,
    Failure,
}

/// One event log emitted during execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    /// Contract that emitted the log
    pub address: Address,
    /// Position of the log within its block
    pub log_index: u32,
    /// topics[0] is the event topic (or a function selector for LogNote)
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed data
    #[serde(default)]
    pub data: Bytes,
}

impl RawLog {
    pub fn topic0(&self) -> Option<&B256> {
        self.topics.first()
    }
}

/// A value movement made by a contract during execution (an internal call).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalCall {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

/// A transaction's top-level call, its logs, and its internal value movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub hash: B256,
    pub from: Address,
    /// `None` for contract creations
    #[serde(default)]
    pub to: Option<Address>,
    /// Native value in wei
    #[serde(default)]
    pub value: U256,
    /// Price per unit of gas in wei
    pub gas_price: U256,
    pub gas_used: U256,
    pub nonce: u64,
    #[serde(default)]
    pub status: TxStatus,
    /// Block timestamp (Unix seconds, UTC)
    pub timestamp: i64,
    #[serde(default)]
    pub logs: Vec<RawLog>,
    #[serde(default)]
    pub internal: Vec<InternalCall>,
}

impl RawTransaction {
    pub fn is_failure(&self) -> bool {
        self.status == TxStatus::Failure
    }

    /// Gas cost in wei.
    pub fn fee(&self) -> U256 {
        self.gas_used.saturating_mul(self.gas_price)
    }

    /// Highest log index present, if any.
    pub fn max_log_index(&self) -> Option<u32> {
        self.logs.iter().map(|l| l.log_index).max()
    }
}
