//! Base assembler: the transfers visible without decoding any log.
//!
//! Produces the fee, the top-level value transfer and internal value
//! movements touching tracked accounts, and rewrites `to` for contract
//! creations. Protocol parsers refine this skeleton afterwards.

use alloy_primitives::U256;
use chainledger_core::{
    account::{qualify, AccountClassifier},
    amount::format_units,
    chain::ChainMetadata,
    diagnostics::Diagnostics,
    raw::RawTransaction,
    transaction::{
        ClassifiedTransaction, Transfer, TransferCategory, FEE_INDEX, LOG_INDEX_OFFSET,
        VALUE_INDEX,
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::trace;

const STAGE: &str = "base";

/// Output of [`assemble`]: the initial classification and the raw
/// transaction as later stages should see it.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub transaction: ClassifiedTransaction,
    pub raw: RawTransaction,
}

/// Build the initial classified transaction.
pub fn assemble(
    raw: &RawTransaction,
    chain: &ChainMetadata,
    accounts: &dyn AccountClassifier,
    diagnostics: &mut Diagnostics,
) -> Assembled {
    let mut prepared = raw.clone();
    let date = DateTime::<Utc>::from_timestamp(raw.timestamp, 0).unwrap_or_default();
    let mut tx = ClassifiedTransaction::new(raw.hash.to_string(), date);

    let name = &chain.name;
    let from = qualify(name, &raw.from);
    let from_self = accounts.is_self(&from);

    if from_self {
        if let Some(fee) = scale(raw.fee(), chain.fee_decimals(), diagnostics) {
            tx.transfers.push(Transfer::new(
                &chain.fee_asset,
                TransferCategory::Fee,
                &from,
                name,
                fee,
                FEE_INDEX,
            ));
        }
    }

    if raw.is_failure() {
        tx.set_method("Failure");
        return Assembled { transaction: tx, raw: prepared };
    }

    let created = raw.to.is_none();
    let to_address = raw.to.unwrap_or_else(|| raw.from.create(raw.nonce));
    prepared.to = Some(to_address);
    let to = qualify(name, &to_address);
    let to_self = accounts.is_self(&to);

    if raw.value > U256::ZERO && (from_self || to_self) {
        if let Some(quantity) = scale(raw.value, chain.fee_decimals(), diagnostics) {
            tx.transfers.push(Transfer::new(
                &chain.fee_asset,
                TransferCategory::from_endpoints(from_self, to_self),
                &from,
                &to,
                quantity,
                VALUE_INDEX,
            ));
            tx.set_method("Transfer");
        }
    }

    if created {
        tx.set_method("Create Contract");
    }

    push_internal(&mut tx, raw, chain, accounts, diagnostics);

    trace!(tx = %tx.hash, transfers = tx.transfers.len(), "base transfers assembled");
    Assembled { transaction: tx, raw: prepared }
}

/// Internal value movements. Incoming ones land strictly between the value
/// transfer and the first log, outgoing ones after the last log.
fn push_internal(
    tx: &mut ClassifiedTransaction,
    raw: &RawTransaction,
    chain: &ChainMetadata,
    accounts: &dyn AccountClassifier,
    diagnostics: &mut Diagnostics,
) {
    let name = &chain.name;
    let mut incoming = Vec::new();
    let mut outgoing = Vec::new();
    for call in raw.internal.iter().filter(|c| c.value > U256::ZERO) {
        let from = qualify(name, &call.from);
        let to = qualify(name, &call.to);
        let (from_self, to_self) = (accounts.is_self(&from), accounts.is_self(&to));
        if to_self {
            incoming.push((call, from, to, from_self, to_self));
        } else if from_self {
            outgoing.push((call, from, to, from_self, to_self));
        }
    }

    let slots = (incoming.len() + 1) as f64;
    for (i, (call, from, to, from_self, to_self)) in incoming.into_iter().enumerate() {
        if let Some(quantity) = scale(call.value, chain.fee_decimals(), diagnostics) {
            tx.transfers.push(Transfer::new(
                &chain.fee_asset,
                TransferCategory::from_endpoints(from_self, to_self),
                from,
                to,
                quantity,
                (i + 1) as f64 / slots,
            ));
        }
    }

    let first_out = match raw.max_log_index() {
        Some(max) => LOG_INDEX_OFFSET + max as f64 + 1.0,
        None => LOG_INDEX_OFFSET,
    };
    for (i, (call, from, to, from_self, to_self)) in outgoing.into_iter().enumerate() {
        if let Some(quantity) = scale(call.value, chain.fee_decimals(), diagnostics) {
            tx.transfers.push(Transfer::new(
                &chain.fee_asset,
                TransferCategory::from_endpoints(from_self, to_self),
                from,
                to,
                quantity,
                first_out + i as f64,
            ));
        }
    }
}

fn scale(raw: U256, decimals: u8, diagnostics: &mut Diagnostics) -> Option<Decimal> {
    format_units(raw, decimals)
        .map_err(|e| diagnostics.warn(STAGE, e))
        .ok()
}
