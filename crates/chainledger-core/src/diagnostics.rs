//! Audit trail for degraded or ambiguous classifications.
//!
//! Every entry is also emitted as a `tracing` event so the same information
//! reaches logs and callers.

use serde::Serialize;
use tracing::{error, warn};

use crate::error::ClassifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// One recorded problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Parser (or pipeline stage) that reported it
    pub parser: String,
    pub error: ClassifyError,
}

/// Collects diagnostics for a single transaction.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    tx_hash: String,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new(tx_hash: impl Into<String>) -> Self {
        Self {
            tx_hash: tx_hash.into(),
            entries: vec![],
        }
    }

    pub fn warn(&mut self, parser: &str, error: ClassifyError) {
        warn!(parser, tx = %self.tx_hash, "{error}");
        self.entries.push(Diagnostic {
            severity: Severity::Warning,
            parser: parser.to_string(),
            error,
        });
    }

    pub fn error(&mut self, parser: &str, error: ClassifyError) {
        error!(parser, tx = %self.tx_hash, "{error}");
        self.entries.push(Diagnostic {
            severity: Severity::Error,
            parser: parser.to_string(),
            error,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Drop everything recorded after the first `len` entries.
    pub fn truncate(&mut self, len: usize) {
        self.entries.truncate(len);
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
