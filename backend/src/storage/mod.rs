pub mod memory;
pub mod model;
pub mod repository;
pub mod repository_sqlx;

pub use memory::MemoryRepository;
pub use model::{BaselineInsert, BaselineRecord, ChainRecord, MetricsRecord, SeriesKey};
pub use repository::{ChainRepository, MetricsRepository};
pub use repository_sqlx::SqlxRepository;
