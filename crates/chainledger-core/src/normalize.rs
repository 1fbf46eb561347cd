//! Final clean-up of a classified transaction.

use rust_decimal::Decimal;
use tracing::trace;

use crate::account::{canonicalize_account, is_address_shaped, AccountClassifier};
use crate::chain::ChainMetadata;
use crate::transaction::{ClassifiedTransaction, Transfer, TransferCategory};

/// Drop empty and signal-free transfers, canonicalize address endpoints,
/// stamp the chain as fallback source, and stable-sort by index.
pub fn normalize(
    mut tx: ClassifiedTransaction,
    chain: &ChainMetadata,
    accounts: &dyn AccountClassifier,
) -> ClassifiedTransaction {
    let before = tx.transfers.len();
    tx.transfers = tx
        .transfers
        .into_iter()
        .filter(|t| t.quantity > Decimal::ZERO)
        .map(|mut t| {
            t.from = canonicalize_account(&t.from);
            t.to = canonicalize_account(&t.to);
            t
        })
        .filter(|t| carries_signal(t, accounts))
        .collect();
    if tx.transfers.len() != before {
        trace!(tx = %tx.hash, dropped = before - tx.transfers.len(), "normalizer dropped transfers");
    }

    if tx.sources.is_empty() {
        tx.sources.push(chain.name.clone());
    }

    tx.transfers.sort_by(|a, b| a.index.total_cmp(&b.index));
    tx
}

/// An unclassified transfer between two untracked chain addresses says
/// nothing about the tracked accounts.
fn carries_signal(t: &Transfer, accounts: &dyn AccountClassifier) -> bool {
    if t.category != TransferCategory::Unknown {
        return true;
    }
    let untracked = |account: &str| is_address_shaped(account) && !accounts.is_self(account);
    !(untracked(&t.from) && untracked(&t.to))
}
