use sqlx::AnyPool;

pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    // Chain snapshots, append-only
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS option_chains (
  chain_id TEXT PRIMARY KEY,
  instrument_key TEXT NOT NULL,
  expiry_date TEXT NOT NULL,
  underlying_spot_price DOUBLE PRECISION,
  data TEXT NOT NULL,
  fetched_ms BIGINT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Metrics: computed rows plus one baseline row per series
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS metrics (
  metrics_id TEXT PRIMARY KEY,
  instrument_key TEXT NOT NULL,
  expiry_date TEXT NOT NULL,
  is_baseline INTEGER NOT NULL CHECK (is_baseline IN (0,1)),
  current_price DOUBLE PRECISION,
  totals TEXT NOT NULL,
  difference TEXT,
  difference_percent TEXT,
  bid_ask_imbalance TEXT,
  bid_ask_spread TEXT,
  created_ms BIGINT NOT NULL,
  updated_ms BIGINT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_option_chains_series ON option_chains(instrument_key, expiry_date, fetched_ms);"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_metrics_series ON metrics(instrument_key, expiry_date, created_ms);"#,
    )
    .execute(pool)
    .await?;

    // At most one baseline per (instrument, expiry).
    sqlx::query(
        r#"CREATE UNIQUE INDEX IF NOT EXISTS uq_metrics_baseline ON metrics(instrument_key, expiry_date) WHERE is_baseline = 1;"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
