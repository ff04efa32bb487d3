use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use corelib::{ChainSnapshot, MetricsResult, TotalsRecord};
use uuid::Uuid;

use crate::error::AppError;

pub const EXPIRY_FORMAT: &str = "%Y-%m-%d";

/// Identity of a tracked series: one instrument at one expiry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub instrument_key: String,
    pub expiry_date: NaiveDate,
}

impl SeriesKey {
    pub fn new(instrument_key: impl Into<String>, expiry_date: NaiveDate) -> Self {
        Self {
            instrument_key: instrument_key.into(),
            expiry_date,
        }
    }

    /// Validates a raw `(instrument_key, YYYY-MM-DD)` pair.
    pub fn parse(instrument_key: &str, expiry_date: &str) -> Result<Self, AppError> {
        let instrument_key = instrument_key.trim();
        if instrument_key.is_empty() {
            return Err(AppError::invalid("missing instrument_key"));
        }

        let expiry_date = expiry_date.trim();
        if expiry_date.is_empty() {
            return Err(AppError::invalid("missing expiry_date"));
        }

        let date = NaiveDate::parse_from_str(expiry_date, EXPIRY_FORMAT)
            .map_err(|e| AppError::invalid(format!("expiry_date {expiry_date:?}: {e}")))?;

        Ok(Self::new(instrument_key, date))
    }

    pub fn expiry_str(&self) -> String {
        self.expiry_date.format(EXPIRY_FORMAT).to_string()
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.instrument_key, self.expiry_str())
    }
}

/// `instrument_key@YYYY-MM-DD`. Instrument keys may contain `|` and spaces.
impl FromStr for SeriesKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (instrument, expiry) = s
            .rsplit_once('@')
            .ok_or_else(|| AppError::invalid(format!("expected instrument@expiry, got {s:?}")))?;
        SeriesKey::parse(instrument, expiry)
    }
}

/// Stored chain snapshot.
#[derive(Clone, Debug, PartialEq)]
pub struct ChainRecord {
    pub chain_id: Uuid,
    pub key: SeriesKey,
    pub snapshot: ChainSnapshot,
    pub fetched_at: DateTime<Utc>,
}

/// First totals ever recorded for a series. At most one per key.
#[derive(Clone, Debug, PartialEq)]
pub struct BaselineRecord {
    pub metrics_id: Uuid,
    pub key: SeriesKey,
    pub totals: TotalsRecord,
    pub created_at: DateTime<Utc>,
}

/// Outcome of an insert-if-absent: the baseline that won, and whether this call created it.
#[derive(Clone, Debug, PartialEq)]
pub struct BaselineInsert {
    pub baseline: BaselineRecord,
    pub created: bool,
}

/// Time-stamped, non-baseline metrics row.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricsRecord {
    pub metrics_id: Uuid,
    pub key: SeriesKey,
    pub result: MetricsResult,
    pub created_at: DateTime<Utc>,
}
