use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use corelib::{ChainSnapshot, MetricsResult, TotalsRecord};
use uuid::Uuid;

use crate::storage::model::{BaselineInsert, BaselineRecord, ChainRecord, MetricsRecord, SeriesKey};

/// Source of chain snapshots.
#[async_trait]
pub trait ChainRepository: Send + Sync {
    /// Most recent snapshot by `fetched_at`.
    async fn latest_chain(&self, key: &SeriesKey) -> Result<Option<ChainRecord>>;

    async fn insert_chain(
        &self,
        key: &SeriesKey,
        snapshot: &ChainSnapshot,
        fetched_at: DateTime<Utc>,
    ) -> Result<Uuid>;
}

/// Store of computed metrics and per-series baselines.
#[async_trait]
pub trait MetricsRepository: Send + Sync {
    async fn fetch_baseline(&self, key: &SeriesKey) -> Result<Option<BaselineRecord>>;

    /// Persist `totals` as the baseline unless one already exists, and return
    /// whichever baseline is stored afterwards.
    ///
    /// Must be atomic: concurrent first calls for the same key end with exactly
    /// one baseline and all observe it.
    async fn insert_baseline_if_absent(
        &self,
        key: &SeriesKey,
        totals: &TotalsRecord,
        now: DateTime<Utc>,
    ) -> Result<BaselineInsert>;

    async fn insert_metrics(
        &self,
        key: &SeriesKey,
        result: &MetricsResult,
        now: DateTime<Utc>,
    ) -> Result<Uuid>;

    async fn latest_metrics(&self, key: &SeriesKey) -> Result<Option<MetricsRecord>>;

    /// Drop the baseline so the next computation starts a new one.
    /// Returns false if there was none.
    async fn reset_baseline(&self, key: &SeriesKey) -> Result<bool>;
}
