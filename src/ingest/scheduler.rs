// src/ingest/scheduler.rs
use std::time::Duration;

use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::runtime::NewsRuntime;

pub const DAY_SECS: u64 = 24 * 3600;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval_secs: u64,
    pub reset_every_secs: u64,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            reset_every_secs: DAY_SECS,
        }
    }
}

/// Run the pipeline every `interval_secs` (first run immediately) and reset
/// provider quotas every `reset_every_secs`. A failed run is logged and the
/// loop keeps going.
pub fn spawn_scheduler(cfg: SchedulerCfg, mut rt: NewsRuntime) -> JoinHandle<()> {
    tokio::spawn(async move {
        let run_every = Duration::from_secs(cfg.interval_secs.max(1));
        let reset_every = Duration::from_secs(cfg.reset_every_secs.max(1));
        let mut runs = interval_at(Instant::now(), run_every);
        let mut resets = interval_at(Instant::now() + reset_every, reset_every);
        runs.set_missed_tick_behavior(MissedTickBehavior::Delay);
        resets.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = resets.tick() => {
                    if let Err(e) = rt.reset_quotas() {
                        tracing::error!(target: "scheduler", error = %e, "quota reset failed");
                    }
                }
                _ = runs.tick() => {
                    counter!("news_runs_total").increment(1);
                    match rt.run_once().await {
                        Ok(s) => tracing::info!(
                            target: "scheduler",
                            accepted = s.accepted,
                            duplicates = s.duplicates,
                            "scheduled run done"
                        ),
                        Err(e) => tracing::error!(target: "scheduler", error = %e, "scheduled run failed"),
                    }
                }
            }
        }
    })
}
