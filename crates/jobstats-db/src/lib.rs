pub mod codec;
pub mod config;
pub mod dialect;
pub mod error;
pub mod pool;
pub mod query;
pub mod repository;
pub mod schema;

// Re-exports
pub use codec::{RawRow, StatisticsRecord};
pub use self::config::DatabaseConfig;
pub use dialect::Dialect;
pub use error::{Error, Result};
pub use pool::StatisticsPool;
pub use repository::StatisticsRepository;
pub use schema::Table;
