use anyhow::{Context, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use corelib::{ChainSnapshot, MetricsResult, StrikeQuote, TotalsRecord};
use serde::de::DeserializeOwned;
use sqlx::{AnyPool, Row};
use uuid::Uuid;

use crate::storage::model::{
    BaselineInsert, BaselineRecord, ChainRecord, EXPIRY_FORMAT, MetricsRecord, SeriesKey,
};
use crate::storage::repository::{ChainRepository, MetricsRepository};

/// SQLx-backed implementation of both repositories.
/// Responsible only for persistence and row mapping.
///
/// The one-baseline-per-series invariant rests on the partial unique index
/// `uq_metrics_baseline` created by the schema migration.
#[derive(Clone)]
pub struct SqlxRepository {
    pool: AnyPool,
}

impl SqlxRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChainRepository for SqlxRepository {
    async fn latest_chain(&self, key: &SeriesKey) -> anyhow::Result<Option<ChainRecord>> {
        let row = sqlx::query(
            r#"
SELECT chain_id, instrument_key, expiry_date, underlying_spot_price, data, fetched_ms
FROM option_chains
WHERE instrument_key = ? AND expiry_date = ?
ORDER BY fetched_ms DESC
LIMIT 1;
"#,
        )
        .bind(key.instrument_key.as_str())
        .bind(key.expiry_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_chain(&r)?)),
            None => Ok(None),
        }
    }

    async fn insert_chain(
        &self,
        key: &SeriesKey,
        snapshot: &ChainSnapshot,
        fetched_at: DateTime<Utc>,
    ) -> anyhow::Result<Uuid> {
        let chain_id = Uuid::new_v4();
        let data = serde_json::to_string(&snapshot.data).context("serialize chain data")?;

        sqlx::query(
            r#"
INSERT INTO option_chains (chain_id, instrument_key, expiry_date, underlying_spot_price, data, fetched_ms)
VALUES (?, ?, ?, ?, ?, ?);
"#,
        )
        .bind(chain_id.to_string())
        .bind(key.instrument_key.as_str())
        .bind(key.expiry_str())
        .bind(snapshot.underlying_spot_price)
        .bind(data)
        .bind(fetched_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(chain_id)
    }
}

#[async_trait]
impl MetricsRepository for SqlxRepository {
    async fn fetch_baseline(&self, key: &SeriesKey) -> anyhow::Result<Option<BaselineRecord>> {
        let row = sqlx::query(
            r#"
SELECT metrics_id, instrument_key, expiry_date, totals, created_ms
FROM metrics
WHERE instrument_key = ? AND expiry_date = ? AND is_baseline = 1
LIMIT 1;
"#,
        )
        .bind(key.instrument_key.as_str())
        .bind(key.expiry_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_baseline(&r)?)),
            None => Ok(None),
        }
    }

    async fn insert_baseline_if_absent(
        &self,
        key: &SeriesKey,
        totals: &TotalsRecord,
        now: DateTime<Utc>,
    ) -> anyhow::Result<BaselineInsert> {
        let totals_json = serde_json::to_string(totals).context("serialize baseline totals")?;
        let now_ms = now.timestamp_millis();

        // Losing a race against another writer hits uq_metrics_baseline and inserts nothing.
        let res = sqlx::query(
            r#"
INSERT INTO metrics (
  metrics_id, instrument_key, expiry_date, is_baseline,
  current_price, totals, difference, difference_percent,
  bid_ask_imbalance, bid_ask_spread, created_ms, updated_ms
)
VALUES (?, ?, ?, 1, NULL, ?, NULL, NULL, NULL, NULL, ?, ?)
ON CONFLICT DO NOTHING;
"#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(key.instrument_key.as_str())
        .bind(key.expiry_str())
        .bind(totals_json)
        .bind(now_ms)
        .bind(now_ms)
        .execute(&self.pool)
        .await?;

        let created = res.rows_affected() == 1;

        let baseline = self
            .fetch_baseline(key)
            .await?
            .ok_or_else(|| anyhow!("baseline for {key} missing after insert-if-absent"))?;

        Ok(BaselineInsert { baseline, created })
    }

    async fn insert_metrics(
        &self,
        key: &SeriesKey,
        result: &MetricsResult,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Uuid> {
        let metrics_id = Uuid::new_v4();
        let now_ms = now.timestamp_millis();

        sqlx::query(
            r#"
INSERT INTO metrics (
  metrics_id, instrument_key, expiry_date, is_baseline,
  current_price, totals, difference, difference_percent,
  bid_ask_imbalance, bid_ask_spread, created_ms, updated_ms
)
VALUES (?, ?, ?, 0, ?, ?, ?, ?, ?, ?, ?, ?);
"#,
        )
        .bind(metrics_id.to_string())
        .bind(key.instrument_key.as_str())
        .bind(key.expiry_str())
        .bind(result.current_price)
        .bind(to_json(&result.totals)?)
        .bind(to_json(&result.difference)?)
        .bind(to_json(&result.difference_percent)?)
        .bind(to_json(&result.bid_ask_imbalance)?)
        .bind(to_json(&result.bid_ask_spread)?)
        .bind(now_ms)
        .bind(now_ms)
        .execute(&self.pool)
        .await?;

        Ok(metrics_id)
    }

    async fn latest_metrics(&self, key: &SeriesKey) -> anyhow::Result<Option<MetricsRecord>> {
        let row = sqlx::query(
            r#"
SELECT
  metrics_id, instrument_key, expiry_date, current_price,
  totals, difference, difference_percent,
  bid_ask_imbalance, bid_ask_spread, created_ms
FROM metrics
WHERE instrument_key = ? AND expiry_date = ? AND is_baseline = 0
ORDER BY created_ms DESC
LIMIT 1;
"#,
        )
        .bind(key.instrument_key.as_str())
        .bind(key.expiry_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_metrics(&r)?)),
            None => Ok(None),
        }
    }

    async fn reset_baseline(&self, key: &SeriesKey) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
DELETE FROM metrics
WHERE instrument_key = ? AND expiry_date = ? AND is_baseline = 1;
"#,
        )
        .bind(key.instrument_key.as_str())
        .bind(key.expiry_str())
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }
}

/* =========================
Row mapping + conversions
========================= */

fn row_to_key(r: &sqlx::any::AnyRow) -> anyhow::Result<SeriesKey> {
    let expiry: String = r.try_get("expiry_date")?;
    let expiry_date =
        NaiveDate::parse_from_str(&expiry, EXPIRY_FORMAT).context("invalid expiry_date")?;
    Ok(SeriesKey::new(r.try_get::<String, _>("instrument_key")?, expiry_date))
}

fn row_to_chain(r: &sqlx::any::AnyRow) -> anyhow::Result<ChainRecord> {
    let data: Vec<StrikeQuote> = from_json(r, "data")?;

    Ok(ChainRecord {
        chain_id: parse_uuid(r, "chain_id")?,
        key: row_to_key(r)?,
        snapshot: ChainSnapshot::new(r.try_get::<Option<f64>, _>("underlying_spot_price")?, data),
        fetched_at: ms_to_utc(r.try_get("fetched_ms")?)?,
    })
}

fn row_to_baseline(r: &sqlx::any::AnyRow) -> anyhow::Result<BaselineRecord> {
    Ok(BaselineRecord {
        metrics_id: parse_uuid(r, "metrics_id")?,
        key: row_to_key(r)?,
        totals: from_json(r, "totals")?,
        created_at: ms_to_utc(r.try_get("created_ms")?)?,
    })
}

fn row_to_metrics(r: &sqlx::any::AnyRow) -> anyhow::Result<MetricsRecord> {
    Ok(MetricsRecord {
        metrics_id: parse_uuid(r, "metrics_id")?,
        key: row_to_key(r)?,
        result: MetricsResult {
            current_price: r.try_get::<Option<f64>, _>("current_price")?.unwrap_or(0.0),
            totals: from_json(r, "totals")?,
            difference: from_json(r, "difference")?,
            difference_percent: from_json(r, "difference_percent")?,
            bid_ask_imbalance: from_json(r, "bid_ask_imbalance")?,
            bid_ask_spread: from_json(r, "bid_ask_spread")?,
        },
        created_at: ms_to_utc(r.try_get("created_ms")?)?,
    })
}

fn parse_uuid(r: &sqlx::any::AnyRow, col: &str) -> anyhow::Result<Uuid> {
    let s: String = r.try_get(col)?;
    Uuid::parse_str(&s).with_context(|| format!("invalid {col}"))
}

fn from_json<T: DeserializeOwned>(r: &sqlx::any::AnyRow, col: &str) -> anyhow::Result<T> {
    let s: String = r.try_get(col)?;
    serde_json::from_str(&s).with_context(|| format!("malformed json in column {col}"))
}

fn to_json<T: serde::Serialize>(v: &T) -> anyhow::Result<String> {
    serde_json::to_string(v).context("serialize metrics column")
}

fn ms_to_utc(ms: i64) -> anyhow::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| anyhow!("timestamp out of range: {ms}"))
}
