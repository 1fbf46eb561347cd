//! Rayon-powered batch classification.
//!
//! Transactions are independent, so a batch is a plain parallel map over
//! the input slice. Output order matches input order.

use chainledger_core::{account::AccountClassifier, chain::ChainMetadata, raw::RawTransaction};
use rayon::prelude::*;
use tracing::info;

use crate::classifier::{Classification, Classifier};

/// Classify `txs` in parallel using Rayon.
pub fn classify_batch(
    classifier: &Classifier,
    txs: &[RawTransaction],
    chain: &ChainMetadata,
    accounts: &dyn AccountClassifier,
) -> Vec<Classification> {
    let results: Vec<Classification> = txs
        .par_iter()
        .map(|raw| classifier.classify_with_diagnostics(raw, chain, accounts))
        .collect();

    let degraded = results.iter().filter(|c| !c.is_clean()).count();
    info!(
        chain = %chain.name,
        total = results.len(),
        degraded,
        "batch classified"
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::*;
    use alloy_primitives::{B256, U256};
    use chainledger_core::config::ClassifierConfig;

    #[test]
    fn preserves_input_order() {
        let classifier = Classifier::new(ClassifierConfig::default()).unwrap();
        let txs: Vec<RawTransaction> = (0u8..32)
            .map(|i| {
                let mut raw = raw_tx(ME, THEM, U256::from(u64::from(i) + 1), vec![]);
                raw.hash = B256::repeat_byte(i);
                raw
            })
            .collect();

        let out = classify_batch(&classifier, &txs, &ChainMetadata::ethereum(), &book(&[]));
        assert_eq!(out.len(), txs.len());
        for (raw, c) in txs.iter().zip(&out) {
            assert_eq!(c.transaction.hash, raw.hash.to_string());
        }
    }

    #[test]
    fn empty_batch() {
        let classifier = Classifier::new(ClassifierConfig::default()).unwrap();
        assert!(classify_batch(&classifier, &[], &ChainMetadata::ethereum(), &book(&[])).is_empty());
    }
}
