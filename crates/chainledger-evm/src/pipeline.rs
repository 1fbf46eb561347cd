//! Protocol parser pipeline.
//!
//! Parsers run in a fixed, documented order. Each one works on a copy of the
//! transaction; the copy replaces the original only when the parser returns
//! `Ok`. Errors and panics become `ParserFault` diagnostics and leave the
//! transaction exactly as the previous parser left it.

use alloy_primitives::{Address, U256};
use chainledger_core::{
    account::{position_account, qualify, AccountClassifier},
    amount::format_units,
    chain::ChainMetadata,
    config::ToleranceConfig,
    diagnostics::Diagnostics,
    error::ClassifyError,
    raw::RawTransaction,
    transaction::ClassifiedTransaction,
};
use rust_decimal::Decimal;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// Everything a parser may read, plus the diagnostics sink.
pub struct ParseContext<'a> {
    pub chain: &'a ChainMetadata,
    pub accounts: &'a dyn AccountClassifier,
    pub tolerance: &'a ToleranceConfig,
    pub diagnostics: &'a mut Diagnostics,
}

impl<'a> ParseContext<'a> {
    /// Chain-qualified id of an address.
    pub fn account(&self, address: &Address) -> String {
        qualify(&self.chain.name, address)
    }

    /// Synthetic per-position account, e.g. `Ethereum/Maker/CDP-42`.
    pub fn position(&self, protocol: &str, position: &str) -> String {
        position_account(&self.chain.name, protocol, position)
    }

    pub fn is_self(&self, account: &str) -> bool {
        self.accounts.is_self(account)
    }

    /// Scale a raw amount; an overflow is recorded and yields `None`.
    pub fn amount(&mut self, parser: &str, raw: U256, decimals: u8) -> Option<Decimal> {
        match format_units(raw, decimals) {
            Ok(q) => Some(q),
            Err(e) => {
                self.diagnostics.warn(parser, e);
                None
            }
        }
    }

    /// Record an expected counterpart transfer that could not be found.
    pub fn unmatched(&mut self, parser: &str, event: &str, asset: &str, quantity: Decimal) {
        self.diagnostics.warn(
            parser,
            ClassifyError::UnmatchedTransfer {
                parser: parser.to_string(),
                event: event.to_string(),
                asset: asset.to_string(),
                quantity: quantity.to_string(),
            },
        );
    }
}

/// One protocol's recogniser.
///
/// `parse` mutates the transaction in place; returning `Err` (or panicking)
/// discards everything it did.
pub trait ProtocolParser: Send + Sync {
    /// Stable identifier used in diagnostics, metrics and configuration.
    fn name(&self) -> &'static str;

    /// Known contract addresses on `chain`.
    fn contracts(&self, chain: &ChainMetadata) -> Vec<Address>;

    /// Parsers that must run earlier because this one relies on their
    /// reclassifications.
    fn depends_on(&self) -> &'static [&'static str] {
        &[]
    }

    /// Fast exit: does any log come from one of our contracts?
    fn applies_to(&self, raw: &RawTransaction, ctx: &ParseContext<'_>) -> bool {
        let contracts = self.contracts(ctx.chain);
        raw.logs.iter().any(|log| contracts.contains(&log.address))
    }

    fn parse(
        &self,
        tx: &mut ClassifiedTransaction,
        raw: &RawTransaction,
        ctx: &mut ParseContext<'_>,
    ) -> Result<(), ClassifyError>;
}

/// The ordered parser list.
pub struct Pipeline {
    parsers: Vec<Box<dyn ProtocolParser>>,
    disabled: Vec<String>,
}

impl Pipeline {
    /// Validate names and ordering: every dependency must be present and
    /// earlier in the list.
    pub fn new(parsers: Vec<Box<dyn ProtocolParser>>) -> Result<Self, ClassifyError> {
        let mut seen: Vec<&str> = Vec::with_capacity(parsers.len());
        for parser in &parsers {
            let name = parser.name();
            if seen.contains(&name) {
                return Err(ClassifyError::Config(format!("duplicate parser '{name}'")));
            }
            if let Some(missing) = parser.depends_on().iter().find(|d| !seen.contains(*d)) {
                return Err(ClassifyError::Config(format!(
                    "parser '{name}' depends on '{missing}', which must run before it"
                )));
            }
            seen.push(name);
        }
        Ok(Self {
            parsers,
            disabled: vec![],
        })
    }

    /// The built-in protocol set in its fixed order.
    pub fn standard() -> Result<Self, ClassifyError> {
        Self::new(crate::protocols::standard_parsers()?)
    }

    /// Skip the named parsers at run time.
    pub fn with_disabled(mut self, names: &[String]) -> Self {
        self.disabled = names.to_vec();
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Run every enabled parser in order.
    pub fn run(
        &self,
        mut tx: ClassifiedTransaction,
        raw: &RawTransaction,
        ctx: &mut ParseContext<'_>,
    ) -> ClassifiedTransaction {
        for parser in &self.parsers {
            let name = parser.name();
            if self.disabled.iter().any(|d| d == name) || !parser.applies_to(raw, ctx) {
                continue;
            }

            let mut candidate = tx.clone();
            let mark = ctx.diagnostics.len();
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| parser.parse(&mut candidate, raw, ctx)));
            if !matches!(outcome, Ok(Ok(()))) {
                // warnings about the discarded candidate go with it
                ctx.diagnostics.truncate(mark);
            }
            match outcome {
                Ok(Ok(())) => {
                    debug!(
                        parser = name,
                        tx = %tx.hash,
                        classified = candidate.classified_count(),
                        "parser applied"
                    );
                    tx = candidate;
                }
                Ok(Err(e)) => ctx.diagnostics.error(name, fault(name, e.to_string())),
                Err(payload) => ctx.diagnostics.error(name, fault(name, panic_message(&*payload))),
            }
        }
        tx
    }
}

fn fault(parser: &str, reason: String) -> ClassifyError {
    ClassifyError::ParserFault {
        parser: parser.to_string(),
        reason,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
