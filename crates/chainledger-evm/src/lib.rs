//! # chainledger-evm
//!
//! EVM transaction classifier built on the `chainledger-core` model.
//!
//! ## Stages
//! 1. [`base::assemble`]: fee, top-level value and internal value movements
//! 2. [`pipeline::Pipeline`]: protocol parsers in a fixed order, each one
//!    decoding its own logs with a [`decoder::LogDecoder`] and reclassifying
//!    transfers through the core matcher
//! 3. `chainledger_core::normalize`: canonical accounts, drop noise, sort
//!
//! ## Implementation notes
//! - Uses `alloy-core` for ABI decode
//! - topics[0] → event topic (keccak256 of the canonical signature), or a
//!   left-aligned function selector for LogNote anonymous logs
//! - topics[1..] → indexed parameters; `data` → non-indexed tuple

pub mod base;
pub mod batch;
pub mod classifier;
pub mod decoder;
pub mod events;
pub mod fingerprint;
pub mod normalizer;
pub mod note;
pub mod pipeline;
pub mod protocols;
pub mod registry;

#[cfg(test)]
mod testkit;

#[doc(hidden)]
pub use chainledger_core as __core;

pub use batch::classify_batch;
pub use classifier::{Classification, Classifier};
pub use decoder::{AbiSignature, LogDecoder, SignatureKind};
pub use events::EventSet;
pub use pipeline::{ParseContext, Pipeline, ProtocolParser};
pub use protocols::standard_parsers;
