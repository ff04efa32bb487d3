use std::str::FromStr;
use std::time::Duration;

use corelib::MetricField;
use engine::EngineConfig;

use crate::storage::model::SeriesKey;

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string.
    pub database_url: String,

    /// Upper bound on pooled database connections.
    pub db_max_connections: u32,

    // =========================
    // Engine configuration
    // =========================
    /// Fields summed into totals and diffed against the baseline.
    ///
    /// Changing this for a series that already has a baseline is allowed:
    /// fields missing from the stored baseline diff against zero.
    pub metrics_fields: Vec<MetricField>,

    // =========================
    // Refresher configuration
    // =========================
    /// Series recomputed by the refresher loop, as `instrument_key@YYYY-MM-DD`.
    pub tracked_series: Vec<SeriesKey>,

    /// Cadence of the refresher loop (milliseconds).
    pub refresh_interval_ms: u64,

    /// Repository calls slower than this are logged on the `performance` target.
    pub slow_query_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://chainpulse_dev.db?mode=rwc".to_string(),
            db_max_connections: 16,
            metrics_fields: MetricField::TOTALS.to_vec(),
            tracked_series: Vec::new(),
            refresh_interval_ms: 60_000,
            slow_query_ms: 200,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable values keep their
    /// default and are logged.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(url) = get("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            cfg.database_url = url;
        }

        parse_into(&get, "DB_MAX_CONNECTIONS", &mut cfg.db_max_connections);
        parse_into(&get, "REFRESH_INTERVAL_MS", &mut cfg.refresh_interval_ms);
        parse_into(&get, "SLOW_QUERY_MS", &mut cfg.slow_query_ms);

        if let Some(raw) = get("METRICS_FIELDS") {
            match MetricField::parse_list(&raw) {
                Ok(fields) if !fields.is_empty() => cfg.metrics_fields = fields,
                Ok(_) => tracing::warn!("METRICS_FIELDS is empty; keeping defaults"),
                Err(e) => tracing::warn!(error = %e, "invalid METRICS_FIELDS; keeping defaults"),
            }
        }

        if let Some(raw) = get("TRACKED_SERIES") {
            for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                match SeriesKey::from_str(entry) {
                    Ok(key) => cfg.tracked_series.push(key),
                    Err(e) => tracing::warn!(entry, error = %e, "skipping tracked series"),
                }
            }
        }

        cfg
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default().with_fields(self.metrics_fields.clone())
    }

    pub fn slow_query(&self) -> Duration {
        Duration::from_millis(self.slow_query_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        // tokio::time::interval panics on a zero period.
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }
}

fn parse_into<T>(get: &impl Fn(&str) -> Option<String>, key: &str, slot: &mut T)
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = get(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(v) => *slot = v,
        Err(e) => tracing::warn!(key, value = %raw, error = %e, "invalid config value; keeping default"),
    }
}
