use std::sync::Arc;

use backend::db::schema;
use backend::storage::{ChainRepository, MetricsRepository, SeriesKey, SqlxRepository};
use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use corelib::{
    ChainSnapshot, FieldValues, MetricField, MetricsResult, SidePair, SideQuote, SpreadQuote,
    StrikeQuote, TotalsRecord,
};
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyPool, Row};
use tokio::task::JoinSet;
use uuid::Uuid;

/// Isolated in-memory SQLite database per test. The unique name keeps parallel
/// tests apart while shared cache lets every pooled connection see the schema.
async fn setup_db() -> AnyPool {
    sqlx::any::install_default_drivers();

    let db_name = Uuid::new_v4().to_string();
    let conn_str = format!("sqlite:file:{}?mode=memory&cache=shared", db_name);

    let pool = AnyPoolOptions::new()
        .max_connections(5)
        .connect(&conn_str)
        .await
        .unwrap();

    schema::migrate(&pool).await.unwrap();
    pool
}

fn key(instrument: &str) -> SeriesKey {
    SeriesKey::new(instrument, NaiveDate::from_ymd_opt(2025, 9, 30).unwrap())
}

fn chain(spot: Option<f64>) -> ChainSnapshot {
    let leg = SideQuote {
        oi: 12.0,
        volume: 340.0,
        iv: 0.18,
        bid_qty: 50.0,
        ask_qty: 75.0,
        bid_price: 101.5,
        ask_price: 102.0,
    };
    ChainSnapshot::new(
        spot,
        vec![
            StrikeQuote::new(24_900.0, leg, leg),
            StrikeQuote::new(25_000.0, leg, SideQuote::default()),
        ],
    )
}

fn totals(call_oi: f64) -> TotalsRecord {
    let mut call = FieldValues::zeroed(&MetricField::TOTALS);
    call.set(MetricField::Oi, call_oi);
    SidePair::new(call, FieldValues::zeroed(&MetricField::TOTALS))
}

fn result(price: f64) -> MetricsResult {
    MetricsResult {
        current_price: price,
        totals: totals(30.0),
        difference: totals(5.0),
        difference_percent: totals(16.5),
        bid_ask_imbalance: SidePair::new(0.04, -0.12),
        bid_ask_spread: SidePair::new(
            SpreadQuote {
                bid_avg: 101.5,
                ask_avg: 102.0,
            },
            SpreadQuote::default(),
        ),
    }
}

#[tokio::test]
async fn latest_chain_round_trip() {
    let pool = setup_db().await;
    let repo = SqlxRepository::new(pool);
    let k = key("NSE_INDEX|Nifty 50");

    assert!(repo.latest_chain(&k).await.unwrap().is_none());

    let earlier = Utc::now() - ChronoDuration::seconds(60);
    repo.insert_chain(&k, &chain(Some(24_950.0)), earlier).await.unwrap();
    let newest = repo.insert_chain(&k, &chain(None), Utc::now()).await.unwrap();

    let got = repo.latest_chain(&k).await.unwrap().unwrap();
    assert_eq!(got.chain_id, newest);
    assert_eq!(got.key, k);
    assert_eq!(got.snapshot, chain(None));
    assert_eq!(got.snapshot.underlying_spot_price, None);

    // Other series are untouched.
    assert!(repo.latest_chain(&key("NSE_INDEX|Nifty Bank")).await.unwrap().is_none());
}

#[tokio::test]
async fn baseline_is_inserted_once() {
    let pool = setup_db().await;
    let repo = SqlxRepository::new(pool.clone());
    let k = key("NSE_INDEX|Nifty 50");

    let first = repo.insert_baseline_if_absent(&k, &totals(10.0), Utc::now()).await.unwrap();
    assert!(first.created);
    assert_eq!(first.baseline.totals, totals(10.0));

    let second = repo.insert_baseline_if_absent(&k, &totals(99.0), Utc::now()).await.unwrap();
    assert!(!second.created);
    assert_eq!(second.baseline.metrics_id, first.baseline.metrics_id);
    assert_eq!(second.baseline.totals, totals(10.0));

    let row = sqlx::query("SELECT COUNT(*) AS n FROM metrics WHERE is_baseline = 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.try_get::<i64, _>("n").unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_baseline_inserts_agree_on_one_winner() {
    let pool = setup_db().await;
    let repo = Arc::new(SqlxRepository::new(pool.clone()));
    let k = key("NSE_INDEX|Nifty 50");

    let mut set = JoinSet::new();
    for i in 0..8 {
        let repo = repo.clone();
        let k = k.clone();
        set.spawn(async move {
            repo.insert_baseline_if_absent(&k, &totals(i as f64), Utc::now())
                .await
                .unwrap()
        });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = set.join_next().await {
        outcomes.push(joined.unwrap());
    }

    assert_eq!(outcomes.iter().filter(|o| o.created).count(), 1);
    let winner = outcomes[0].baseline.metrics_id;
    assert!(outcomes.iter().all(|o| o.baseline.metrics_id == winner));

    let row = sqlx::query("SELECT COUNT(*) AS n FROM metrics WHERE is_baseline = 1")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(row.try_get::<i64, _>("n").unwrap(), 1);
}

#[tokio::test]
async fn latest_metrics_skips_the_baseline_row() {
    let pool = setup_db().await;
    let repo = SqlxRepository::new(pool);
    let k = key("NSE_INDEX|Nifty 50");

    repo.insert_metrics(&k, &result(24_900.0), Utc::now() - ChronoDuration::seconds(5))
        .await
        .unwrap();
    let id = repo.insert_metrics(&k, &result(25_010.0), Utc::now()).await.unwrap();
    repo.insert_baseline_if_absent(&k, &totals(1.0), Utc::now() + ChronoDuration::seconds(5))
        .await
        .unwrap();

    let latest = repo.latest_metrics(&k).await.unwrap().unwrap();
    assert_eq!(latest.metrics_id, id);
    assert_eq!(latest.result, result(25_010.0));
}

#[tokio::test]
async fn reset_baseline_removes_only_the_baseline() {
    let pool = setup_db().await;
    let repo = SqlxRepository::new(pool);
    let k = key("NSE_INDEX|Nifty 50");

    assert!(!repo.reset_baseline(&k).await.unwrap());

    repo.insert_baseline_if_absent(&k, &totals(10.0), Utc::now()).await.unwrap();
    repo.insert_metrics(&k, &result(25_000.0), Utc::now()).await.unwrap();

    assert!(repo.reset_baseline(&k).await.unwrap());
    assert!(repo.fetch_baseline(&k).await.unwrap().is_none());
    assert!(repo.latest_metrics(&k).await.unwrap().is_some());

    let again = repo.insert_baseline_if_absent(&k, &totals(20.0), Utc::now()).await.unwrap();
    assert!(again.created);
    assert_eq!(again.baseline.totals, totals(20.0));
}
