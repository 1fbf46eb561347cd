//! The classifier facade: base assembly, protocol pipeline, normalization.

use chainledger_core::{
    account::AccountClassifier,
    chain::ChainMetadata,
    config::ClassifierConfig,
    diagnostics::{Diagnostic, Diagnostics},
    error::ClassifyError,
    normalize::normalize,
    raw::RawTransaction,
    transaction::ClassifiedTransaction,
};
use tracing::{debug, instrument};

use crate::base::assemble;
use crate::pipeline::{ParseContext, Pipeline};

/// A classified transaction together with everything that went wrong
/// while producing it.
#[derive(Debug, Clone)]
pub struct Classification {
    pub transaction: ClassifiedTransaction,
    pub diagnostics: Vec<Diagnostic>,
}

impl Classification {
    /// True when no parser reported a warning or fault.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Turns raw EVM transactions into classified ones.
///
/// Holds no per-transaction state, so one instance can be shared across
/// threads (see [`crate::batch::classify_batch`]).
pub struct Classifier {
    pipeline: Pipeline,
    config: ClassifierConfig,
}

impl Classifier {
    /// Classifier with the standard parser set, minus any parser the
    /// configuration disables.
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifyError> {
        let pipeline = Pipeline::standard()?.with_disabled(&config.disabled_parsers);
        Ok(Self { pipeline, config })
    }

    /// Classifier over a caller-supplied pipeline.
    pub fn with_pipeline(pipeline: Pipeline, config: ClassifierConfig) -> Self {
        let pipeline = pipeline.with_disabled(&config.disabled_parsers);
        Self { pipeline, config }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classify one transaction, discarding diagnostics.
    pub fn classify(
        &self,
        raw: &RawTransaction,
        chain: &ChainMetadata,
        accounts: &dyn AccountClassifier,
    ) -> ClassifiedTransaction {
        self.classify_with_diagnostics(raw, chain, accounts).transaction
    }

    /// Classify one transaction. Never fails: problems degrade the result
    /// and are reported in [`Classification::diagnostics`].
    #[instrument(skip_all, fields(tx = %raw.hash, chain = %chain.name))]
    pub fn classify_with_diagnostics(
        &self,
        raw: &RawTransaction,
        chain: &ChainMetadata,
        accounts: &dyn AccountClassifier,
    ) -> Classification {
        let mut diagnostics = Diagnostics::new(raw.hash.to_string());
        let assembled = assemble(raw, chain, accounts, &mut diagnostics);

        let transaction = if raw.is_failure() {
            assembled.transaction
        } else {
            let mut ctx = ParseContext {
                chain,
                accounts,
                tolerance: &self.config.tolerance,
                diagnostics: &mut diagnostics,
            };
            self.pipeline.run(assembled.transaction, &assembled.raw, &mut ctx)
        };

        let transaction = normalize(transaction, chain, accounts);
        debug!(
            method = %transaction.method,
            transfers = transaction.transfers.len(),
            diagnostics = diagnostics.entries().len(),
            "classified"
        );
        Classification {
            transaction,
            diagnostics: diagnostics.into_entries(),
        }
    }
}
