// src/ingest/quota.rs
//! Per-provider daily request quota and its on-disk counter file.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyQuota {
    limit: u32,
    used: u32,
}

impl DailyQuota {
    pub fn new(limit: u32) -> Self {
        Self { limit, used: 0 }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used)
    }

    /// Checks without mutating.
    pub fn check(&self, provider: &str) -> Result<(), IngestError> {
        if self.used >= self.limit {
            return Err(IngestError::QuotaExhausted {
                provider: provider.to_string(),
                used: self.used,
                limit: self.limit,
            });
        }
        Ok(())
    }

    /// Count one successful request.
    pub fn consume(&mut self) {
        self.used = self.used.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.used = 0;
    }

    pub(crate) fn set_used(&mut self, used: u32) {
        self.used = used;
    }
}

/// Snapshot of `requests_used_today` per provider, persisted between
/// invocations of the batch job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotaState {
    #[serde(default)]
    pub providers: BTreeMap<String, u32>,
}

impl QuotaState {
    /// Missing file reads as all-zero counters.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match fs::read_to_string(path) {
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Zero every counter, including providers no longer configured.
    pub fn reset_all(&mut self) {
        for used in self.providers.values_mut() {
            *used = 0;
        }
    }

    /// Overlay `newer` on top; counters only in `self` are kept.
    pub fn merge(&mut self, newer: QuotaState) {
        self.providers.extend(newer.providers);
    }

    /// Write via temp file + rename so a crash never leaves half a file.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("json.tmp");
        let s = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        let mut f = fs::File::create(&tmp)?;
        f.write_all(s.as_bytes())?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}
