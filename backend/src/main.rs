use std::sync::Arc;
use std::time::Duration;

use backend::{
    config::AppConfig,
    db::Db,
    logger::{TraceId, annotate_span, init_tracing, root_span},
    service::MetricsService,
    storage::{SeriesKey, SqlxRepository},
};
use engine::MetricsEngine;
use tracing::Instrument;

/// Connects, migrates and wires the sqlx repository into the service.
async fn init_service(cfg: &AppConfig) -> anyhow::Result<Arc<MetricsService>> {
    let db = Db::connect(&cfg.database_url, cfg.db_max_connections).await?;
    db.migrate().await?;

    let repo = Arc::new(SqlxRepository::new(db.pool.clone()));
    let engine = MetricsEngine::new(cfg.engine_config());

    Ok(Arc::new(MetricsService::from_repository(
        repo,
        engine,
        cfg.slow_query(),
    )))
}

/// Recomputes every tracked series on a fixed cadence. A failing series is
/// logged and retried on the next tick.
fn start_refresh_loop(service: Arc<MetricsService>, series: Vec<SeriesKey>, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        loop {
            ticker.tick().await;

            for key in &series {
                let span = root_span("refresh", &TraceId::new());
                let outcome = async {
                    annotate_span(key);
                    service.calculate_metrics(key).await
                }
                .instrument(span)
                .await;

                match outcome {
                    Ok(m) => tracing::debug!(series = %key, price = m.current_price, "series refreshed"),
                    Err(e) if e.is_not_found() => {
                        tracing::debug!(series = %key, "no chain yet; skipping")
                    }
                    Err(e) => tracing::error!(error = %e, series = %key, "refresh failed"),
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    tracing::info!("Starting chainpulse refresher...");

    let cfg = AppConfig::from_env();
    let service = init_service(&cfg).await?;

    if cfg.tracked_series.is_empty() {
        tracing::warn!("TRACKED_SERIES is empty; refresher will idle");
    } else {
        tracing::info!(
            series = cfg.tracked_series.len(),
            interval_ms = cfg.refresh_interval_ms,
            "refresher running"
        );
    }

    start_refresh_loop(service, cfg.tracked_series.clone(), cfg.refresh_interval());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    Ok(())
}
