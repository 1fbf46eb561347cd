//! The classified transaction, the primary output of ChainLedger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of the gas fee transfer; sorts first.
pub const FEE_INDEX: f64 = -1.0;
/// Position of the top-level native value transfer.
pub const VALUE_INDEX: f64 = 0.0;
/// Log-derived transfers sit at `LOG_INDEX_OFFSET + log_index`.
pub const LOG_INDEX_OFFSET: f64 = 1.0;

/// Economic meaning of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransferCategory {
    #[default]
    Unknown,
    Internal,
    Income,
    Expense,
    Fee,
    Deposit,
    Withdraw,
    SwapIn,
    SwapOut,
    Borrow,
    Repay,
}

impl TransferCategory {
    /// Categories assigned by the endpoint-only rule. A transfer in one of
    /// these has not been claimed by any protocol parser yet.
    pub const SIMPLE: [TransferCategory; 4] = [
        TransferCategory::Unknown,
        TransferCategory::Internal,
        TransferCategory::Income,
        TransferCategory::Expense,
    ];

    /// Category implied by which endpoints are tracked accounts.
    pub fn from_endpoints(from_is_self: bool, to_is_self: bool) -> Self {
        match (from_is_self, to_is_self) {
            (true, true) => Self::Internal,
            (true, false) => Self::Expense,
            (false, true) => Self::Income,
            (false, false) => Self::Unknown,
        }
    }

    pub fn is_simple(self) -> bool {
        Self::SIMPLE.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Internal => "Internal",
            Self::Income => "Income",
            Self::Expense => "Expense",
            Self::Fee => "Fee",
            Self::Deposit => "Deposit",
            Self::Withdraw => "Withdraw",
            Self::SwapIn => "SwapIn",
            Self::SwapOut => "SwapOut",
            Self::Borrow => "Borrow",
            Self::Repay => "Repay",
        }
    }
}

impl fmt::Display for TransferCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One directed movement of an asset between two accounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    /// Asset symbol, e.g. "ETH", "DAI"
    pub asset: String,
    pub category: TransferCategory,
    /// Chain-qualified address or synthetic account id
    pub from: String,
    /// Chain-qualified address or synthetic account id
    pub to: String,
    pub quantity: Decimal,
    /// Ordering key; fractional values splice between neighbours
    pub index: f64,
}

impl Transfer {
    pub fn new(
        asset: impl Into<String>,
        category: TransferCategory,
        from: impl Into<String>,
        to: impl Into<String>,
        quantity: Decimal,
        index: f64,
    ) -> Self {
        Self {
            asset: asset.into(),
            category,
            from: from.into(),
            to: to.into(),
            quantity,
            index,
        }
    }
}

/// A transaction reconstructed into semantically meaningful transfers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedTransaction {
    pub date: DateTime<Utc>,
    pub hash: String,
    /// Protocol identifiers, most recent detection first
    pub sources: Vec<String>,
    /// Protocol app names, most recent detection first
    pub apps: Vec<String>,
    pub method: String,
    pub transfers: Vec<Transfer>,
}

impl ClassifiedTransaction {
    pub fn new(hash: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            date,
            hash: hash.into(),
            sources: vec![],
            apps: vec![],
            method: "Unknown".into(),
            transfers: vec![],
        }
    }

    /// Record a detected source; a repeat detection moves it to the front.
    pub fn add_source(&mut self, source: &str) {
        front_insert(&mut self.sources, source);
    }

    /// Record a detected app; a repeat detection moves it to the front.
    pub fn add_app(&mut self, app: &str) {
        front_insert(&mut self.apps, app);
    }

    pub fn set_method(&mut self, method: &str) {
        self.method = method.to_string();
    }

    /// Number of transfers carrying a classification signal.
    pub fn classified_count(&self) -> usize {
        self.transfers
            .iter()
            .filter(|t| t.category != TransferCategory::Unknown)
            .count()
    }

    /// An index strictly between `anchor` and the next higher index present.
    pub fn index_after(&self, anchor: f64) -> f64 {
        let next = self
            .transfers
            .iter()
            .map(|t| t.index)
            .filter(|i| *i > anchor)
            .min_by(f64::total_cmp);
        match next {
            Some(next) => anchor + (next - anchor) / 2.0,
            None => anchor + 1.0,
        }
    }

    /// An index strictly between the next lower index present and `anchor`.
    pub fn index_before(&self, anchor: f64) -> f64 {
        let prev = self
            .transfers
            .iter()
            .map(|t| t.index)
            .filter(|i| *i < anchor)
            .max_by(f64::total_cmp);
        match prev {
            Some(prev) => anchor - (anchor - prev) / 2.0,
            None => anchor - 1.0,
        }
    }
}

fn front_insert(list: &mut Vec<String>, value: &str) {
    list.retain(|v| v != value);
    list.insert(0, value.to_string());
}
