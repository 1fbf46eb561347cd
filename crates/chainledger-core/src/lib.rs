//! # chainledger-core
//!
//! Core types and chain-agnostic stages of the ChainLedger classifier:
//! the raw and classified transaction models, the account classifier
//! capability, the transfer matcher, and the final normalizer. The EVM
//! decoding and protocol parsers in `chainledger-evm` are built on top of
//! the interfaces defined here.

pub mod account;
pub mod amount;
pub mod chain;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod event;
pub mod matcher;
pub mod normalize;
pub mod raw;
pub mod transaction;

pub use account::{AccountClassifier, AddressBook, AddressCategory, AddressEntry};
pub use amount::format_units;
pub use chain::ChainMetadata;
pub use config::{ClassifierConfig, ToleranceConfig};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::ClassifyError;
pub use event::{DecodedEvent, DecodedValue};
pub use matcher::{find_transfer, MatchResult, TransferQuery};
pub use normalize::normalize;
pub use raw::{InternalCall, RawLog, RawTransaction, TxStatus};
pub use transaction::{ClassifiedTransaction, Transfer, TransferCategory};
