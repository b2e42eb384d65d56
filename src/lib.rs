// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod cli;
pub mod error;
pub mod ingest;
pub mod runtime;

// ---- Re-exports for stable public API ----
pub use crate::error::IngestError;
pub use crate::ingest::classify::CountryClassifier;
pub use crate::ingest::ledger::{FileLedger, LedgerFallback, MemoryLedger, TitleLedger};
pub use crate::ingest::registry::{ProviderRegistry, RunMode};
pub use crate::ingest::types::{CanonicalArticle, NewsBatch, NewsProvider, Transport};
pub use crate::ingest::{run_once, RunSummary};
