pub mod cli;

use std::sync::Arc;

use backend::{
    config::AppConfig,
    db::Db,
    logger::{TraceId, annotate_span, root_span},
    service::MetricsService,
    storage::SqlxRepository,
};
use clap::Parser;
use serde::Serialize;
use tracing::Instrument;

use cli::*;

/// Opens the configured database and wires the service the same way the
/// refresher does.
async fn connect_service(cli: &Cli) -> anyhow::Result<MetricsService> {
    let cfg = AppConfig::from_env();
    let url = cli.database_url.clone().unwrap_or(cfg.database_url.clone());

    let db = Db::connect(&url, cfg.db_max_connections).await?;
    db.migrate().await?;

    Ok(MetricsService::from_repository(
        Arc::new(SqlxRepository::new(db.pool.clone())),
        engine::MetricsEngine::new(cfg.engine_config()),
        cfg.slow_query(),
    ))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    common::logger::init_logger("chainpulse");

    let cli = Cli::parse();

    match &cli.command {
        Command::Compute {
            snapshot,
            baseline,
            fields,
        } => {
            let engine = engine_from_fields(fields);
            let snapshot = read_snapshot(snapshot)?;
            let baseline = baseline.as_deref().map(read_baseline).transpose()?;

            print_json(&compute_offline(&engine, &snapshot, baseline.as_ref())?)
        }

        Command::Ingest { series, snapshot } => {
            let key = series.key()?;
            let snapshot = read_snapshot(snapshot)?;
            let service = connect_service(&cli).await?;

            let span = root_span("cli_ingest", &TraceId::new());
            let outcome = async {
                annotate_span(&key);
                service.ingest_chain(&key, &snapshot).await
            }
            .instrument(span)
            .await?;

            print_json(&ingested_metrics(outcome)?)
        }

        Command::Metrics { series } => {
            let key = series.key()?;
            let service = connect_service(&cli).await?;

            let span = root_span("cli_metrics", &TraceId::new());
            let result = async {
                annotate_span(&key);
                service.calculate_metrics(&key).await
            }
            .instrument(span)
            .await?;

            print_json(&result)
        }

        Command::ResetBaseline { series } => {
            let key = series.key()?;
            let service = connect_service(&cli).await?;

            let removed = service.reset_baseline(&key).await?;
            print_json(&serde_json::json!({ "series": key.to_string(), "removed": removed }))
        }
    }
}
