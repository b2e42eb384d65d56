// src/ingest/registry.rs
//! Provider registry, random selection and quota-guarded fetching.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::IngestError;
use crate::ingest::quota::{DailyQuota, QuotaState};
use crate::ingest::types::{NewsProvider, RawArticle, Transport};

/// Which providers one run drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// One provider chosen uniformly at random.
    #[default]
    Single,
    /// Every registered provider once, each quota-checked on its own.
    All,
}

/// A provider plus its daily request counter.
pub struct ProviderAdapter {
    provider: Box<dyn NewsProvider>,
    quota: DailyQuota,
}

impl ProviderAdapter {
    pub fn new(provider: Box<dyn NewsProvider>, daily_quota: u32) -> Self {
        Self {
            provider,
            quota: DailyQuota::new(daily_quota),
        }
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    pub fn provider(&self) -> &dyn NewsProvider {
        self.provider.as_ref()
    }

    pub fn quota(&self) -> &DailyQuota {
        &self.quota
    }

    /// Quota first, then exactly one GET. Only a successful GET is counted.
    pub async fn fetch(&mut self, transport: &dyn Transport) -> Result<Value, IngestError> {
        self.quota.check(self.provider.name())?;
        let body = self.provider.fetch(transport).await?;
        self.quota.consume();
        Ok(body)
    }

    pub fn extract_articles(&self, body: &Value) -> Result<Vec<RawArticle>, IngestError> {
        self.provider.extract_articles(body)
    }
}

#[derive(Default)]
pub struct ProviderRegistry {
    adapters: Vec<ProviderAdapter>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        provider: Box<dyn NewsProvider>,
        daily_quota: u32,
    ) -> Result<(), IngestError> {
        let name = provider.name().to_string();
        if self.adapters.iter().any(|a| a.name() == name) {
            return Err(IngestError::DuplicateProvider(name));
        }
        if daily_quota == 0 {
            return Err(IngestError::InvalidQuota(name));
        }
        self.adapters.push(ProviderAdapter::new(provider, daily_quota));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&ProviderAdapter> {
        self.adapters.iter().find(|a| a.name() == name)
    }

    pub fn adapters_mut(&mut self) -> impl Iterator<Item = &mut ProviderAdapter> {
        self.adapters.iter_mut()
    }

    /// Uniform pick over all providers, exhausted ones included.
    pub fn select_one<R: Rng>(&mut self, rng: &mut R) -> Option<&mut ProviderAdapter> {
        if self.adapters.is_empty() {
            return None;
        }
        let i = rng.random_range(0..self.adapters.len());
        self.adapters.get_mut(i)
    }

    /// Daily reset hook; the timer lives outside the registry.
    pub fn reset_all(&mut self) {
        for a in &mut self.adapters {
            a.quota.reset();
        }
    }

    /// Restore counters saved by a previous invocation. Unknown names are ignored.
    pub fn apply_quota_state(&mut self, state: &QuotaState) {
        for a in &mut self.adapters {
            if let Some(&used) = state.providers.get(a.name()) {
                a.quota.set_used(used);
            }
        }
    }

    pub fn quota_state(&self) -> QuotaState {
        QuotaState {
            providers: self
                .adapters
                .iter()
                .map(|a| (a.name().to_string(), a.quota.used()))
                .collect(),
        }
    }
}
