//! Options-chain metrics derivation.
//!
//! Pure, synchronous computations over a [`ChainSnapshot`](corelib::ChainSnapshot):
//! strike classification around the money, windowed strike selection, per-side
//! totals, drift against a baseline, bid/ask imbalance and spread.

pub mod classify;
pub mod config;
pub mod error;
pub mod metrics;
pub mod window;

pub use classify::{StrikeClassification, classify};
pub use config::EngineConfig;
pub use error::EngineError;
pub use metrics::{ChainAnalysis, MetricsEngine};
pub use window::{StrikeWindow, WindowSpec, select_window};
