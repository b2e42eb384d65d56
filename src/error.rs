// src/error.rs
//! Error kinds of the ingest core.
//!
//! Per-article and per-provider kinds are recoverable: the coordinator records
//! them and keeps going. `LedgerUnavailable` and `Output` abort a run.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("daily quota exhausted for {provider}: {used}/{limit} requests used")]
    QuotaExhausted {
        provider: String,
        used: u32,
        limit: u32,
    },

    #[error("transport error from {provider}: {reason}")]
    Transport { provider: String, reason: String },

    #[error("malformed article: {0}")]
    MalformedArticle(String),

    #[error("title ledger unavailable at {}: {source}", .path.display())]
    LedgerUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("provider already registered: {0}")]
    DuplicateProvider(String),

    #[error("daily quota for {0} must be positive")]
    InvalidQuota(String),

    #[error("output sink failed at {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    /// Short machine-friendly label used in run summaries and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::QuotaExhausted { .. } => "quota_exhausted",
            IngestError::Transport { .. } => "transport",
            IngestError::MalformedArticle(_) => "malformed_article",
            IngestError::LedgerUnavailable { .. } => "ledger_unavailable",
            IngestError::DuplicateProvider(_) => "duplicate_provider",
            IngestError::InvalidQuota(_) => "invalid_quota",
            IngestError::Output { .. } => "output",
        }
    }

    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IngestError::LedgerUnavailable { .. } | IngestError::Output { .. }
        )
    }
}
