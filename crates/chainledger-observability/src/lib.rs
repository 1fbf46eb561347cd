//! # chainledger-observability
//!
//! Logging and metrics for ChainLedger.
//!
//! ## Built-in metrics
//! - `chainledger.transactions_classified`: counter tagged with chain + method
//! - `chainledger.transfers_classified`: counter tagged with chain + category
//! - `chainledger.unmatched_transfers`: counter tagged with chain + parser
//! - `chainledger.parser_faults`: counter tagged with chain + parser
//!
//! ## Structured logging
//! Text or JSON logs through `tracing-subscriber`, with levels configurable
//! per component.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::ClassifierMetrics;
pub use tracing_setup::{init_tracing, LogConfig};
