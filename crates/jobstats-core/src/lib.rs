pub mod error;
pub mod interval;
pub mod statistics;
pub mod time;

// Re-exports
pub use error::{Error, Result};
pub use interval::StatisticInterval;
pub use statistics::{
    JobRegisterStatistics, JobRunningStatistics, TaskResultStatistics, TaskRunningStatistics,
};
