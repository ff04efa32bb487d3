mod init;
mod spans;
mod trace_id;

pub use init::init_logger;
pub use spans::root_span;
pub use trace_id::TraceId;
