use thiserror::Error;

/// Invalid input handed to the engine. Never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("cannot classify an empty strike set")]
    EmptyStrikes,

    #[error("reference price missing for a non-empty chain")]
    MissingReferencePrice,

    #[error("non-finite {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}
