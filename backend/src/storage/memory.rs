use std::collections::HashMap;
use std::collections::hash_map::Entry;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use corelib::{ChainSnapshot, MetricsResult, TotalsRecord};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::storage::model::{BaselineInsert, BaselineRecord, ChainRecord, MetricsRecord, SeriesKey};
use crate::storage::repository::{ChainRepository, MetricsRepository};

/// Process-local repository. Baseline insert-if-absent is atomic under the map lock.
#[derive(Default)]
pub struct MemoryRepository {
    chains: Mutex<HashMap<SeriesKey, Vec<ChainRecord>>>,
    baselines: Mutex<HashMap<SeriesKey, BaselineRecord>>,
    metrics: Mutex<HashMap<SeriesKey, Vec<MetricsRecord>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every non-baseline record stored for `key`, oldest first.
    pub fn metrics_history(&self, key: &SeriesKey) -> Vec<MetricsRecord> {
        self.metrics.lock().get(key).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ChainRepository for MemoryRepository {
    async fn latest_chain(&self, key: &SeriesKey) -> Result<Option<ChainRecord>> {
        Ok(self
            .chains
            .lock()
            .get(key)
            .and_then(|rows| rows.iter().max_by_key(|r| r.fetched_at).cloned()))
    }

    async fn insert_chain(
        &self,
        key: &SeriesKey,
        snapshot: &ChainSnapshot,
        fetched_at: DateTime<Utc>,
    ) -> Result<Uuid> {
        let chain_id = Uuid::new_v4();
        self.chains.lock().entry(key.clone()).or_default().push(ChainRecord {
            chain_id,
            key: key.clone(),
            snapshot: snapshot.clone(),
            fetched_at,
        });
        Ok(chain_id)
    }
}

#[async_trait]
impl MetricsRepository for MemoryRepository {
    async fn fetch_baseline(&self, key: &SeriesKey) -> Result<Option<BaselineRecord>> {
        Ok(self.baselines.lock().get(key).cloned())
    }

    async fn insert_baseline_if_absent(
        &self,
        key: &SeriesKey,
        totals: &TotalsRecord,
        now: DateTime<Utc>,
    ) -> Result<BaselineInsert> {
        let mut g = self.baselines.lock();
        let out = match g.entry(key.clone()) {
            Entry::Occupied(e) => BaselineInsert {
                baseline: e.get().clone(),
                created: false,
            },
            Entry::Vacant(e) => {
                let rec = e.insert(BaselineRecord {
                    metrics_id: Uuid::new_v4(),
                    key: key.clone(),
                    totals: *totals,
                    created_at: now,
                });
                BaselineInsert {
                    baseline: rec.clone(),
                    created: true,
                }
            }
        };
        Ok(out)
    }

    async fn insert_metrics(
        &self,
        key: &SeriesKey,
        result: &MetricsResult,
        now: DateTime<Utc>,
    ) -> Result<Uuid> {
        let metrics_id = Uuid::new_v4();
        self.metrics.lock().entry(key.clone()).or_default().push(MetricsRecord {
            metrics_id,
            key: key.clone(),
            result: result.clone(),
            created_at: now,
        });
        Ok(metrics_id)
    }

    async fn latest_metrics(&self, key: &SeriesKey) -> Result<Option<MetricsRecord>> {
        Ok(self
            .metrics
            .lock()
            .get(key)
            .and_then(|rows| rows.iter().max_by_key(|r| r.created_at).cloned()))
    }

    async fn reset_baseline(&self, key: &SeriesKey) -> Result<bool> {
        Ok(self.baselines.lock().remove(key).is_some())
    }
}
