//! Physical tables and schema provisioning.

use jobstats_core::StatisticInterval;
use crate::{Dialect, Error, Result, StatisticsPool};

/// One physical statistics table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    TaskResult(StatisticInterval),
    TaskRunning,
    JobRunning,
    JobRegister,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::TaskResult(StatisticInterval::Minute),
        Table::TaskResult(StatisticInterval::Hour),
        Table::TaskResult(StatisticInterval::Day),
        Table::TaskRunning,
        Table::JobRunning,
        Table::JobRegister,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::TaskResult(StatisticInterval::Minute) => "TASK_RESULT_STATISTICS_MINUTE",
            Table::TaskResult(StatisticInterval::Hour) => "TASK_RESULT_STATISTICS_HOUR",
            Table::TaskResult(StatisticInterval::Day) => "TASK_RESULT_STATISTICS_DAY",
            Table::TaskRunning => "TASK_RUNNING_STATISTICS",
            Table::JobRunning => "JOB_RUNNING_STATISTICS",
            Table::JobRegister => "JOB_REGISTER_STATISTICS",
        }
    }

    /// Counter columns in insert/select order.
    pub fn count_columns(&self) -> &'static [&'static str] {
        match self {
            Table::TaskResult(_) => &["success_count", "failed_count"],
            Table::TaskRunning | Table::JobRunning => &["running_count"],
            Table::JobRegister => &["registered_count"],
        }
    }

    pub fn interval(&self) -> Option<StatisticInterval> {
        match self {
            Table::TaskResult(interval) => Some(*interval),
            _ => None,
        }
    }

    pub(crate) fn ordinal(&self) -> usize {
        match self {
            Table::TaskResult(StatisticInterval::Minute) => 0,
            Table::TaskResult(StatisticInterval::Hour) => 1,
            Table::TaskResult(StatisticInterval::Day) => 2,
            Table::TaskRunning => 3,
            Table::JobRunning => 4,
            Table::JobRegister => 5,
        }
    }

    pub(crate) fn index_name(&self) -> String {
        format!("IDX_{}_STATISTICS_TIME", self.name())
    }

    pub(crate) fn create_table_ddl(&self, dialect: Dialect) -> String {
        let counters: String = self
            .count_columns()
            .iter()
            .map(|column| format!("    {} INTEGER NOT NULL,\n", column))
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {},\n{}    statistics_time BIGINT NOT NULL,\n    creation_time BIGINT NOT NULL DEFAULT {}\n)",
            self.name(),
            dialect.id_column(),
            counters,
            dialect.now_millis(),
        )
    }

    pub(crate) fn create_index_ddl(&self) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {}(statistics_time)",
            self.index_name(),
            self.name()
        )
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Create every statistics table and its time index if absent.
///
/// Statements are independently idempotent, so a failed run can simply be retried.
pub async fn provision(pool: &StatisticsPool) -> Result<()> {
    let dialect = pool.dialect();
    for table in Table::ALL {
        for ddl in [table.create_table_ddl(dialect), table.create_index_ddl()] {
            if let Err(err) = pool.execute(&ddl, &[]).await {
                if dialect.is_already_exists(&err) {
                    tracing::warn!(table = table.name(), error = %err, "Schema object created concurrently");
                    continue;
                }
                tracing::error!(table = table.name(), error = %err, "Failed to provision statistics schema");
                return Err(Error::StorageUnavailable(err));
            }
        }
        tracing::debug!(table = table.name(), "Statistics table ready");
    }

    tracing::info!(%dialect, "Statistics schema initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_task_result_routing_per_interval() {
        for interval in StatisticInterval::ALL {
            let table = Table::TaskResult(interval);
            assert!(table.name().ends_with(interval.table_suffix()));
            assert_eq!(table.interval(), Some(interval));
        }
        assert_eq!(Table::JobRegister.interval(), None);
    }

    #[test]
    fn test_ordinals_are_dense_and_unique() {
        let ordinals: HashSet<usize> = Table::ALL.iter().map(Table::ordinal).collect();
        assert_eq!(ordinals, (0..Table::ALL.len()).collect::<HashSet<usize>>());
        for (position, table) in Table::ALL.iter().enumerate() {
            assert_eq!(table.ordinal(), position);
        }
    }

    #[test]
    fn test_create_table_ddl() {
        let ddl = Table::TaskResult(StatisticInterval::Hour).create_table_ddl(Dialect::Postgres);
        assert!(ddl.starts_with("CREATE TABLE IF NOT EXISTS TASK_RESULT_STATISTICS_HOUR"));
        assert!(ddl.contains("id BIGSERIAL PRIMARY KEY"));
        assert!(ddl.contains("success_count INTEGER NOT NULL"));
        assert!(ddl.contains("failed_count INTEGER NOT NULL"));
        assert!(ddl.contains("statistics_time BIGINT NOT NULL"));

        let ddl = Table::JobRegister.create_table_ddl(Dialect::Sqlite);
        assert!(ddl.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(ddl.contains("registered_count INTEGER NOT NULL"));
        assert!(!ddl.contains("running_count"));
    }

    #[test]
    fn test_create_index_ddl() {
        assert_eq!(
            Table::TaskRunning.create_index_ddl(),
            "CREATE INDEX IF NOT EXISTS IDX_TASK_RUNNING_STATISTICS_STATISTICS_TIME ON TASK_RUNNING_STATISTICS(statistics_time)"
        );
    }
}
