// src/ingest/mod.rs
pub mod classify;
pub mod config;
pub mod ledger;
pub mod normalize;
pub mod output;
pub mod providers;
pub mod quota;
pub mod registry;
pub mod scheduler;
pub mod transport;
pub mod types;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use rand::Rng;
use serde::Serialize;

use crate::error::IngestError;
use crate::ingest::classify::CountryClassifier;
use crate::ingest::ledger::TitleLedger;
use crate::ingest::normalize::{ArticleNormalizer, SkippedArticle};
use crate::ingest::output::OutputSink;
use crate::ingest::registry::{ProviderAdapter, ProviderRegistry, RunMode};
use crate::ingest::types::{NewsBatch, Transport};

/// One-time metrics registration (so series carry descriptions once a recorder exists).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("news_runs_total", "Scheduled runs started.");
        describe_counter!("news_fetch_total", "Successful provider fetches.");
        describe_counter!(
            "news_provider_errors_total",
            "Provider transport/response failures."
        );
        describe_counter!(
            "news_quota_exhausted_total",
            "Fetches refused because the provider's daily quota was used up."
        );
        describe_counter!(
            "news_articles_accepted_total",
            "Articles written to the output sink."
        );
        describe_counter!(
            "news_duplicates_total",
            "Articles dropped because the title ledger already had them."
        );
        describe_counter!("news_malformed_total", "Articles skipped as malformed.");
        describe_gauge!("news_last_run_ts", "Unix ts when the last run finished.");
    });
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderStatus {
    Ok,
    Failed { kind: String, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderReport {
    pub provider: String,
    #[serde(flatten)]
    pub status: ProviderStatus,
    pub fetched: usize,
    pub accepted: usize,
    pub duplicates: usize,
}

impl ProviderReport {
    fn failed(provider: &str, e: &IngestError) -> Self {
        Self {
            provider: provider.to_string(),
            status: ProviderStatus::Failed {
                kind: e.kind().to_string(),
                reason: e.to_string(),
            },
            fetched: 0,
            accepted: 0,
            duplicates: 0,
        }
    }
}

/// What happened in one run: per-provider results plus skipped articles.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mode: RunMode,
    pub providers: Vec<ProviderReport>,
    pub accepted: usize,
    pub duplicates: usize,
    pub skipped: Vec<SkippedArticle>,
}

impl RunSummary {
    fn new(mode: RunMode) -> Self {
        Self {
            mode,
            providers: Vec::new(),
            accepted: 0,
            duplicates: 0,
            skipped: Vec::new(),
        }
    }

    pub fn failed_providers(&self) -> impl Iterator<Item = &ProviderReport> {
        self.providers
            .iter()
            .filter(|p| matches!(p.status, ProviderStatus::Failed { .. }))
    }
}

/// Drive one execution end to end.
///
/// Provider failures (quota, transport, bad envelope) land in the summary and
/// the run moves on. The batch is written exactly once, possibly empty.
/// Ledger and sink failures abort with an error. Accepted titles are
/// committed to the ledger only after the batch is written; an aborted run
/// rolls them back so the next run emits them again.
pub async fn run_once<R: Rng>(
    registry: &mut ProviderRegistry,
    transport: &dyn Transport,
    classifier: &CountryClassifier,
    ledger: &mut dyn TitleLedger,
    sink: &mut dyn OutputSink,
    mode: RunMode,
    rng: &mut R,
) -> Result<RunSummary, IngestError> {
    ensure_metrics_described();

    let mut summary = RunSummary::new(mode);
    let gathered = gather(
        registry,
        transport,
        classifier,
        &mut *ledger,
        mode,
        rng,
        &mut summary,
    )
    .await;
    let batch = match gathered {
        Ok(b) => b,
        Err(e) => {
            ledger.rollback();
            return Err(e);
        }
    };

    if let Err(e) = sink.write_batch(&batch) {
        ledger.rollback();
        tracing::error!(error = %e, articles = batch.articles.len(), "batch not written; titles rolled back");
        return Err(e);
    }
    ledger.commit()?;

    summary.accepted = batch.articles.len();
    counter!("news_articles_accepted_total").increment(summary.accepted as u64);
    counter!("news_duplicates_total").increment(summary.duplicates as u64);
    counter!("news_malformed_total").increment(summary.skipped.len() as u64);
    gauge!("news_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

    tracing::info!(
        mode = ?mode,
        accepted = summary.accepted,
        duplicates = summary.duplicates,
        skipped = summary.skipped.len(),
        failed_providers = summary.failed_providers().count(),
        "run finished"
    );
    Ok(summary)
}

async fn gather<R: Rng>(
    registry: &mut ProviderRegistry,
    transport: &dyn Transport,
    classifier: &CountryClassifier,
    ledger: &mut dyn TitleLedger,
    mode: RunMode,
    rng: &mut R,
    summary: &mut RunSummary,
) -> Result<NewsBatch, IngestError> {
    let mut batch = NewsBatch::default();
    let mut normalizer = ArticleNormalizer::new(classifier, ledger);

    match mode {
        RunMode::Single => match registry.select_one(rng) {
            Some(adapter) => {
                tracing::info!(provider = adapter.name(), "provider selected");
                drive_provider(adapter, transport, &mut normalizer, &mut batch, summary).await?;
            }
            None => tracing::warn!("no providers registered; writing empty batch"),
        },
        RunMode::All => {
            for adapter in registry.adapters_mut() {
                drive_provider(adapter, transport, &mut normalizer, &mut batch, summary).await?;
            }
        }
    }
    Ok(batch)
}

/// Fetch + extract + normalize one provider. Only fatal errors are returned.
async fn drive_provider(
    adapter: &mut ProviderAdapter,
    transport: &dyn Transport,
    normalizer: &mut ArticleNormalizer<'_>,
    batch: &mut NewsBatch,
    summary: &mut RunSummary,
) -> Result<(), IngestError> {
    let name = adapter.name().to_string();

    let raws = match adapter.fetch(transport).await {
        Ok(body) => {
            counter!("news_fetch_total").increment(1);
            adapter.extract_articles(&body)
        }
        Err(e) => Err(e),
    };
    let raws = match raws {
        Ok(r) => r,
        Err(e) => {
            match e {
                IngestError::QuotaExhausted { .. } => {
                    counter!("news_quota_exhausted_total").increment(1);
                }
                _ => counter!("news_provider_errors_total").increment(1),
            }
            tracing::warn!(provider = %name, kind = e.kind(), error = %e, "provider skipped");
            summary.providers.push(ProviderReport::failed(&name, &e));
            return Ok(());
        }
    };

    let out = normalizer.normalize_batch(&name, &raws, adapter.provider().fields())?;
    tracing::info!(
        provider = %name,
        fetched = raws.len(),
        accepted = out.accepted.len(),
        duplicates = out.duplicates,
        malformed = out.malformed.len(),
        "provider done"
    );

    summary.providers.push(ProviderReport {
        provider: name,
        status: ProviderStatus::Ok,
        fetched: raws.len(),
        accepted: out.accepted.len(),
        duplicates: out.duplicates,
    });
    summary.duplicates += out.duplicates;
    summary.skipped.extend(out.malformed);
    batch.articles.extend(out.accepted);
    Ok(())
}
