//! Chain metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Static facts about the chain a transaction was executed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainMetadata {
    /// EVM chain ID, e.g. 1 for Ethereum mainnet
    pub chain_id: u64,
    /// Human-readable name used as the account prefix, e.g. "Ethereum"
    pub name: String,
    /// Symbol of the native asset gas is paid in, e.g. "ETH"
    pub fee_asset: String,
}

impl ChainMetadata {
    pub fn new(chain_id: u64, name: impl Into<String>, fee_asset: impl Into<String>) -> Self {
        Self {
            chain_id,
            name: name.into(),
            fee_asset: fee_asset.into(),
        }
    }

    pub fn ethereum() -> Self {
        Self::new(1, "Ethereum", "ETH")
    }

    pub fn polygon() -> Self {
        Self::new(137, "Polygon", "MATIC")
    }

    /// Native assets always use 18 decimals on EVM chains.
    pub fn fee_decimals(&self) -> u8 {
        18
    }
}

impl fmt::Display for ChainMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
