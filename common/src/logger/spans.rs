use tracing::{Span, field};

use super::TraceId;

/// Root span for one request / refresh / job. Series fields are recorded later.
pub fn root_span(name: &'static str, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "root",
        name = %name,
        trace_id = %trace_id,
        instrument_key = field::Empty,
        expiry_date = field::Empty
    )
}
