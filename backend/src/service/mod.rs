use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use corelib::{ChainSnapshot, MetricsResult};
use engine::MetricsEngine;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::logger::warn_if_slow;
use crate::storage::model::{ChainRecord, MetricsRecord, SeriesKey};
use crate::storage::repository::{ChainRepository, MetricsRepository};

/// Stored snapshot id plus the metrics recomputed from it.
#[derive(Debug)]
pub struct IngestOutcome {
    pub chain_id: Uuid,
    pub metrics: Result<MetricsResult, AppError>,
}

/// Orchestrates chain storage, baseline bookkeeping and the metrics engine
/// for every tracked series.
///
/// Stateless apart from its collaborators; share it behind an `Arc`.
pub struct MetricsService {
    chains: Arc<dyn ChainRepository>,
    metrics: Arc<dyn MetricsRepository>,
    engine: MetricsEngine,
    slow: Duration,
}

impl MetricsService {
    pub fn new(
        chains: Arc<dyn ChainRepository>,
        metrics: Arc<dyn MetricsRepository>,
        engine: MetricsEngine,
        slow: Duration,
    ) -> Self {
        Self {
            chains,
            metrics,
            engine,
            slow,
        }
    }

    /// One backing store for both chains and metrics.
    pub fn from_repository<R>(repo: Arc<R>, engine: MetricsEngine, slow: Duration) -> Self
    where
        R: ChainRepository + MetricsRepository + 'static,
    {
        Self::new(repo.clone(), repo, engine, slow)
    }

    /// Recompute metrics for `key` from its most recent chain snapshot.
    ///
    /// The first non-empty computation for a series becomes its baseline.
    /// Empty chains return [`MetricsResult::empty`] and leave storage untouched.
    #[instrument(skip(self, key), target = "service", fields(series = %key))]
    pub async fn calculate_metrics(&self, key: &SeriesKey) -> Result<MetricsResult, AppError> {
        let record = warn_if_slow("db_latest_chain", self.slow, async {
            self.chains.latest_chain(key).await
        })
        .await
        .context("failed to load latest chain")?;

        let Some(record) = record else {
            warn!("no chain stored for series");
            return Err(AppError::ChainNotFound(key.clone()));
        };

        let snapshot = resolve_reference_price(record.snapshot);
        let analysis = self.engine.analyze(&snapshot)?;

        if analysis.is_degenerate() {
            info!("chain has no strikes; skipping baseline and persistence");
            return Ok(MetricsResult::empty(analysis.current_price()));
        }

        let inserted = warn_if_slow("db_baseline_get_or_create", self.slow, async {
            self.metrics
                .insert_baseline_if_absent(key, analysis.totals(), Utc::now())
                .await
        })
        .await
        .context("failed to get or create baseline")?;

        if inserted.created {
            info!(baseline_id = %inserted.baseline.metrics_id, "baseline recorded");
        }

        let result = analysis.finish(&inserted.baseline.totals);

        let metrics_id = warn_if_slow("db_insert_metrics", self.slow, async {
            self.metrics.insert_metrics(key, &result, Utc::now()).await
        })
        .await
        .context("failed to persist metrics")?;

        debug!(%metrics_id, price = result.current_price, "metrics persisted");
        Ok(result)
    }

    /// Store a fresh snapshot and recompute. A failed recompute is logged and
    /// handed back in the outcome; the snapshot stays stored either way.
    #[instrument(skip(self, key, snapshot), target = "service", fields(series = %key, strikes = snapshot.data.len()))]
    pub async fn ingest_chain(
        &self,
        key: &SeriesKey,
        snapshot: &ChainSnapshot,
    ) -> Result<IngestOutcome, AppError> {
        let chain_id = warn_if_slow("db_insert_chain", self.slow, async {
            self.chains.insert_chain(key, snapshot, Utc::now()).await
        })
        .await
        .context("failed to store chain snapshot")?;

        info!(%chain_id, "chain snapshot stored");

        let metrics = self.calculate_metrics(key).await;
        if let Err(e) = &metrics {
            warn!(error = %e, "metrics recompute after ingest failed");
        }

        Ok(IngestOutcome { chain_id, metrics })
    }

    #[instrument(skip(self, key), target = "service", fields(series = %key))]
    pub async fn latest_chain(&self, key: &SeriesKey) -> Result<Option<ChainRecord>, AppError> {
        let record = warn_if_slow("db_latest_chain", self.slow, async {
            self.chains.latest_chain(key).await
        })
        .await
        .context("failed to load latest chain")?;
        Ok(record)
    }

    #[instrument(skip(self, key), target = "service", fields(series = %key))]
    pub async fn latest_metrics(&self, key: &SeriesKey) -> Result<Option<MetricsRecord>, AppError> {
        let record = warn_if_slow("db_latest_metrics", self.slow, async {
            self.metrics.latest_metrics(key).await
        })
        .await
        .context("failed to load latest metrics")?;
        Ok(record)
    }

    /// Drop the stored baseline; the next computation records a new one.
    /// Returns whether a baseline existed.
    #[instrument(skip(self, key), target = "service", fields(series = %key))]
    pub async fn reset_baseline(&self, key: &SeriesKey) -> Result<bool, AppError> {
        let removed = warn_if_slow("db_reset_baseline", self.slow, async {
            self.metrics.reset_baseline(key).await
        })
        .await
        .context("failed to reset baseline")?;

        info!(removed, "baseline reset");
        Ok(removed)
    }
}

/// A chain with strikes but no spot price is priced at its lowest-magnitude
/// strike (ties go to the lower strike).
fn resolve_reference_price(snapshot: ChainSnapshot) -> ChainSnapshot {
    if snapshot.underlying_spot_price.is_some() || snapshot.is_empty() {
        return snapshot;
    }

    let fallback = snapshot
        .strikes()
        .into_iter()
        .min_by(|a, b| a.abs().total_cmp(&b.abs()).then(a.total_cmp(b)));

    match fallback {
        Some(price) => {
            warn!(fallback = price, "reference price missing; using strike nearest zero");
            snapshot.with_reference_price(price)
        }
        None => snapshot,
    }
}
