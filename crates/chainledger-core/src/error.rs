//! Error types for the ChainLedger classification pipeline.
//!
//! None of these abort a classification: the top-level entry point always
//! returns a transaction. They are carried as [`Diagnostic`](crate::Diagnostic)
//! entries so degraded results can be audited.

use thiserror::Error;

/// Everything that can go wrong while classifying one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// A log did not match any signature known to the decoder.
    #[error("log {log_index} at {address} matched no known signature")]
    DecodeMismatch { address: String, log_index: u32 },

    /// A decoded event implies a movement the matcher could not find.
    #[error("{parser}: no {asset} transfer of {quantity} found for {event}")]
    UnmatchedTransfer {
        parser: String,
        event: String,
        asset: String,
        quantity: String,
    },

    /// A protocol parser returned an error or panicked.
    #[error("parser '{parser}' failed: {reason}")]
    ParserFault { parser: String, reason: String },

    /// A raw integer amount is too large for a decimal quantity.
    #[error("amount {raw} with {decimals} decimals overflows a decimal quantity")]
    AmountOverflow { raw: String, decimals: u8 },

    #[error("invalid address '{value}'")]
    InvalidAddress { value: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClassifyError {
    /// Short, stable label used for metric tags.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DecodeMismatch { .. } => "decode_mismatch",
            Self::UnmatchedTransfer { .. } => "unmatched_transfer",
            Self::ParserFault { .. } => "parser_fault",
            Self::AmountOverflow { .. } => "amount_overflow",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::Config(_) => "config",
        }
    }

    pub fn is_parser_fault(&self) -> bool {
        matches!(self, Self::ParserFault { .. })
    }
}

impl From<serde_json::Error> for ClassifyError {
    fn from(e: serde_json::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<serde_yaml::Error> for ClassifyError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Config(e.to_string())
    }
}
