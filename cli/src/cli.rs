use std::path::{Path, PathBuf};

use anyhow::Context;
use backend::service::IngestOutcome;
use backend::storage::SeriesKey;
use clap::{Args, Parser, Subcommand, ValueEnum};
use corelib::{ChainSnapshot, MetricField, MetricsResult, TotalsRecord};
use engine::{EngineConfig, MetricsEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FieldCli {
    Oi,
    Volume,
    Iv,
    BidQty,
    AskQty,
    BidPrice,
    AskPrice,
}

#[derive(Debug, Parser)]
#[clap(name = "chainpulse", version)]
pub struct Cli {
    /// Database for the stored-series commands (falls back to the app config default)
    #[clap(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compute metrics for a snapshot file without touching storage
    Compute {
        /// Chain snapshot JSON (provider shape)
        #[clap(long)]
        snapshot: PathBuf,

        /// Baseline totals JSON; omitted means the snapshot is its own baseline
        #[clap(long)]
        baseline: Option<PathBuf>,

        /// Fields to aggregate (comma-separated)
        #[clap(long, value_enum, value_delimiter = ',')]
        fields: Vec<FieldCli>,
    },

    /// Store a snapshot for a series and print the recomputed metrics
    Ingest {
        #[clap(flatten)]
        series: SeriesArgs,

        #[clap(long)]
        snapshot: PathBuf,
    },

    /// Recompute metrics for a series from its latest stored snapshot
    Metrics {
        #[clap(flatten)]
        series: SeriesArgs,
    },

    /// Drop a series' baseline so the next computation records a fresh one
    ResetBaseline {
        #[clap(flatten)]
        series: SeriesArgs,
    },
}

#[derive(Debug, Args)]
pub struct SeriesArgs {
    /// Instrument key, e.g. "NSE_INDEX|Nifty 50"
    #[clap(long)]
    pub instrument: String,

    /// Expiry date (YYYY-MM-DD)
    #[clap(long)]
    pub expiry: String,
}

impl SeriesArgs {
    pub(crate) fn key(&self) -> anyhow::Result<SeriesKey> {
        Ok(SeriesKey::parse(&self.instrument, &self.expiry)?)
    }
}

/// Convert CLI field selection → model field
pub(crate) fn cli_to_field(f: FieldCli) -> MetricField {
    match f {
        FieldCli::Oi => MetricField::Oi,
        FieldCli::Volume => MetricField::Volume,
        FieldCli::Iv => MetricField::Iv,
        FieldCli::BidQty => MetricField::BidQty,
        FieldCli::AskQty => MetricField::AskQty,
        FieldCli::BidPrice => MetricField::BidPrice,
        FieldCli::AskPrice => MetricField::AskPrice,
    }
}

/// Build the engine from CLI configuration. No fields keeps the defaults.
pub(crate) fn engine_from_fields(fields: &[FieldCli]) -> MetricsEngine {
    let config = if fields.is_empty() {
        EngineConfig::default()
    } else {
        EngineConfig::default().with_fields(fields.iter().copied().map(cli_to_field).collect())
    };
    MetricsEngine::new(config)
}

pub(crate) fn read_snapshot(path: &Path) -> anyhow::Result<ChainSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    parse_json(&raw).with_context(|| format!("parsing snapshot {}", path.display()))
}

pub(crate) fn read_baseline(path: &Path) -> anyhow::Result<TotalsRecord> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading baseline {}", path.display()))?;
    parse_json(&raw).with_context(|| format!("parsing baseline {}", path.display()))
}

fn parse_json<T: serde::de::DeserializeOwned>(raw: &str) -> anyhow::Result<T> {
    Ok(serde_json::from_str(raw)?)
}

/// Offline computation behind `compute`.
pub(crate) fn compute_offline(
    engine: &MetricsEngine,
    snapshot: &ChainSnapshot,
    baseline: Option<&TotalsRecord>,
) -> anyhow::Result<MetricsResult> {
    Ok(engine.compute(snapshot, baseline)?)
}

/// Metrics computed from a freshly ingested snapshot. A failed recompute is an
/// error even though the snapshot itself was stored.
pub(crate) fn ingested_metrics(outcome: IngestOutcome) -> anyhow::Result<MetricsResult> {
    let IngestOutcome { chain_id, metrics } = outcome;
    tracing::info!(%chain_id, "snapshot ingested");
    metrics.with_context(|| format!("snapshot {chain_id} stored but metrics recompute failed"))
}
