//! ChainLedger metrics definitions.
//!
//! All metrics use OpenTelemetry conventions; exporting them is up to the
//! meter provider the application installs.

use chainledger_core::{
    diagnostics::Diagnostic, error::ClassifyError, transaction::ClassifiedTransaction,
};
use opentelemetry::{
    metrics::{Counter, Meter},
    KeyValue,
};

/// Central metrics handle for the classifier.
#[derive(Clone)]
pub struct ClassifierMetrics {
    pub transactions_classified: Counter<u64>,
    pub transfers_classified: Counter<u64>,
    pub unmatched_transfers: Counter<u64>,
    pub parser_faults: Counter<u64>,
}

impl ClassifierMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            transactions_classified: meter
                .u64_counter("chainledger.transactions_classified")
                .with_description("Transactions run through the classifier")
                .init(),
            transfers_classified: meter
                .u64_counter("chainledger.transfers_classified")
                .with_description("Transfers emitted, by category")
                .init(),
            unmatched_transfers: meter
                .u64_counter("chainledger.unmatched_transfers")
                .with_description("Decoded events whose counterpart transfer was not found")
                .init(),
            parser_faults: meter
                .u64_counter("chainledger.parser_faults")
                .with_description("Protocol parsers that failed or panicked")
                .init(),
        }
    }

    /// Record one finished classification and its diagnostics.
    pub fn record(&self, chain: &str, tx: &ClassifiedTransaction, diagnostics: &[Diagnostic]) {
        self.transactions_classified.add(
            1,
            &[
                KeyValue::new("chain", chain.to_string()),
                KeyValue::new("method", tx.method.clone()),
            ],
        );
        for transfer in &tx.transfers {
            self.transfers_classified.add(
                1,
                &[
                    KeyValue::new("chain", chain.to_string()),
                    KeyValue::new("category", transfer.category.as_str()),
                ],
            );
        }
        for diagnostic in diagnostics {
            let counter = match diagnostic.error {
                ClassifyError::UnmatchedTransfer { .. } => &self.unmatched_transfers,
                ClassifyError::ParserFault { .. } => &self.parser_faults,
                _ => continue,
            };
            counter.add(
                1,
                &[
                    KeyValue::new("chain", chain.to_string()),
                    KeyValue::new("parser", diagnostic.parser.clone()),
                ],
            );
        }
    }
}
