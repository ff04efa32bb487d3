use engine::EngineError;
use thiserror::Error;

use crate::storage::model::SeriesKey;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("option chain data not found for {0}")]
    ChainNotFound(SeriesKey),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("storage failure: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Maps to a "not found" response at the transport edge.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::ChainNotFound(_))
    }

    /// Caller error; never worth retrying.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, AppError::InvalidInput(_) | AppError::Engine(_))
    }
}
