// src/runtime.rs
//! Wires config into a ready-to-run pipeline: registry, transport, ledger, sink.

use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::{rngs::StdRng, SeedableRng};
use tracing::info;

use crate::ingest::classify::CountryClassifier;
use crate::ingest::config::AppConfig;
use crate::ingest::ledger::{FileLedger, TitleLedger};
use crate::ingest::output::{JsonFileSink, OutputSink, StdoutSink};
use crate::ingest::quota::QuotaState;
use crate::ingest::registry::{ProviderRegistry, RunMode};
use crate::ingest::transport::HttpTransport;
use crate::ingest::types::Transport;
use crate::ingest::{self, RunSummary};

pub struct NewsRuntime {
    pub registry: ProviderRegistry,
    pub mode: RunMode,
    transport: Box<dyn Transport>,
    classifier: CountryClassifier,
    ledger: Box<dyn TitleLedger>,
    sink: Box<dyn OutputSink>,
    // None on dry runs: counters are not persisted
    quota_path: Option<PathBuf>,
    // counters as last loaded, incl. providers not registered right now
    quota_base: QuotaState,
    rng: StdRng,
}

impl NewsRuntime {
    /// Real run: file ledger, appended output file, persisted quota counters.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let ledger = FileLedger::open(&cfg.paths.ledger, cfg.run.ledger_fallback)?;
        Self::assemble(
            cfg,
            Box::new(ledger),
            Box::new(JsonFileSink::new(&cfg.paths.output)),
        )?
        .with_quota_file(&cfg.paths.quota_state)
    }

    /// Dry run: reads the ledger and quota file but writes nothing to disk.
    pub fn dry_run(cfg: &AppConfig) -> Result<Self> {
        let ledger = FileLedger::open(&cfg.paths.ledger, cfg.run.ledger_fallback)?.snapshot();
        let mut rt = Self::assemble(cfg, Box::new(ledger), Box::new(StdoutSink))?;
        let state = QuotaState::load(&cfg.paths.quota_state)?;
        rt.registry.apply_quota_state(&state);
        Ok(rt)
    }

    /// Assemble from explicit parts; tests and embedders plug in their own.
    pub fn with_parts(
        registry: ProviderRegistry,
        transport: Box<dyn Transport>,
        classifier: CountryClassifier,
        ledger: Box<dyn TitleLedger>,
        sink: Box<dyn OutputSink>,
        mode: RunMode,
    ) -> Self {
        Self {
            registry,
            mode,
            transport,
            classifier,
            ledger,
            sink,
            quota_path: None,
            quota_base: QuotaState::default(),
            rng: StdRng::from_os_rng(),
        }
    }

    fn assemble(
        cfg: &AppConfig,
        ledger: Box<dyn TitleLedger>,
        sink: Box<dyn OutputSink>,
    ) -> Result<Self> {
        let registry = cfg.build_registry()?;
        let transport = HttpTransport::new(cfg.run.request_timeout())?;
        info!(
            providers = ?registry.names(),
            mode = ?cfg.run.mode,
            ledger_titles = ledger.len(),
            "runtime ready"
        );
        Ok(Self::with_parts(
            registry,
            Box::new(transport),
            cfg.classifier(),
            ledger,
            sink,
            cfg.run.mode,
        ))
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Persist quota counters in `path` across runs, starting from what it
    /// already holds.
    pub fn with_quota_file(mut self, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = QuotaState::load(&path)
            .with_context(|| format!("reading quota state {}", path.display()))?;
        self.registry.apply_quota_state(&state);
        self.quota_base = state;
        self.quota_path = Some(path);
        Ok(self)
    }

    fn save_quota_state(&self) -> Result<()> {
        if let Some(p) = &self.quota_path {
            let mut state = self.quota_base.clone();
            state.merge(self.registry.quota_state());
            state
                .save(p)
                .with_context(|| format!("writing quota state {}", p.display()))?;
        }
        Ok(())
    }

    pub async fn run_once(&mut self) -> Result<RunSummary> {
        let result = ingest::run_once(
            &mut self.registry,
            self.transport.as_ref(),
            &self.classifier,
            self.ledger.as_mut(),
            self.sink.as_mut(),
            self.mode,
            &mut self.rng,
        )
        .await;
        // counters moved even if the run aborted later on; the batch may
        // already be out, so a failed save does not discard the summary
        if let Err(e) = self.save_quota_state() {
            let msg = format!("{e:#}");
            tracing::error!(error = %msg, "quota state not saved; counters kept in memory");
        }
        Ok(result?)
    }

    /// Daily reset for the cron path: rewrites only the quota file, so it
    /// needs neither API keys nor the ledger nor the network.
    pub fn reset_quota_file(cfg: &AppConfig) -> Result<QuotaState> {
        let path = &cfg.paths.quota_state;
        let mut state = QuotaState::load(path)
            .with_context(|| format!("reading quota state {}", path.display()))?;
        state.reset_all();
        state
            .save(path)
            .with_context(|| format!("writing quota state {}", path.display()))?;
        info!(providers = ?state.providers.keys().collect::<Vec<_>>(), "daily quotas reset");
        Ok(state)
    }

    /// Daily reset hook.
    pub fn reset_quotas(&mut self) -> Result<()> {
        self.registry.reset_all();
        self.quota_base.reset_all();
        self.save_quota_state()?;
        info!(providers = ?self.registry.names(), "daily quotas reset");
        Ok(())
    }
}
