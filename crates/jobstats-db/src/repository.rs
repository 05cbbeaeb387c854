use chrono::{DateTime, Utc};
use jobstats_core::{
    time, JobRegisterStatistics, JobRunningStatistics, StatisticInterval, TaskResultStatistics,
    TaskRunningStatistics,
};
use std::sync::Arc;

use crate::{
    codec::{self, StatisticsRecord},
    pool::Bind,
    query::StatementSet,
    schema::{self, Table},
    DatabaseConfig, Dialect, Error, Result, StatisticsPool,
};

/// Append-only store for job and task statistics.
///
/// A value only exists once the schema is provisioned. Storage failures after
/// that point never escape an operation: writes report `false`, reads report no
/// data, and every absorbed failure is logged at `error` level.
#[derive(Clone)]
pub struct StatisticsRepository {
    pool: StatisticsPool,
    statements: Arc<StatementSet>,
}

impl std::fmt::Debug for StatisticsRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsRepository")
            .field("dialect", &self.statements.dialect())
            .finish_non_exhaustive()
    }
}

impl StatisticsRepository {
    /// Build a repository on an existing connection source and provision its schema.
    pub async fn new(pool: impl Into<StatisticsPool>) -> Result<Self> {
        let pool = pool.into();
        schema::provision(&pool).await?;

        let statements = Arc::new(StatementSet::new(pool.dialect()));
        Ok(Self { pool, statements })
    }

    /// Open a pool from configuration, then provision.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = config.connect().await?;
        Self::new(pool).await
    }

    pub fn dialect(&self) -> Dialect {
        self.statements.dialect()
    }

    // ========================================================================
    // Write Operations
    // ========================================================================

    /// Append one record to the table of its family.
    ///
    /// Returns `Ok(false)` when the store rejected the insert; only counters
    /// that cannot be represented are reported as errors.
    pub async fn add<R: StatisticsRecord>(&self, record: &R) -> Result<bool> {
        let table = record.table();
        let row = codec::encode(record)?;

        let mut binds: Vec<Bind> = row.counters.iter().map(|counter| Bind::Int(*counter)).collect();
        binds.push(Bind::BigInt(row.statistics_time));

        match self.pool.execute(&self.statements.for_table(table).insert, &binds).await {
            Ok(affected) => {
                tracing::debug!(table = table.name(), statistics_time = row.statistics_time, "Statistics row added");
                Ok(affected == 1)
            }
            Err(err) => {
                let err = Error::Transient(err);
                tracing::error!(table = table.name(), error = %err, "Failed to add statistics row");
                Ok(false)
            }
        }
    }

    // ========================================================================
    // Task Result Queries
    // ========================================================================

    /// Rows of the interval's table with `statistics_time >= from`, oldest first.
    pub async fn find_task_result_statistics(
        &self,
        from: DateTime<Utc>,
        interval: StatisticInterval,
    ) -> Vec<TaskResultStatistics> {
        self.find_from(Table::TaskResult(interval), from).await
    }

    /// Sum of both counters over rows with `statistics_time >= from`.
    ///
    /// Sums are computed in 64 bits and saturate at `u32::MAX`. The returned
    /// record carries `from` as its statistics time and has no id.
    pub async fn get_summed_task_result_statistics(
        &self,
        from: DateTime<Utc>,
        interval: StatisticInterval,
    ) -> TaskResultStatistics {
        let table = Table::TaskResult(interval);
        let mut summed = TaskResultStatistics::new(0, 0, interval, from);

        match self.fetch_sums(table, from).await {
            Ok((success, failed)) => {
                summed.success_count = codec::saturate_sum(table, "success_count", success);
                summed.failed_count = codec::saturate_sum(table, "failed_count", failed);
            }
            Err(err) => {
                tracing::error!(table = table.name(), error = %err, "Failed to sum task result statistics");
            }
        }

        summed
    }

    pub async fn find_latest_task_result_statistics(
        &self,
        interval: StatisticInterval,
    ) -> Option<TaskResultStatistics> {
        self.find_latest(Table::TaskResult(interval)).await
    }

    // ========================================================================
    // Running and Register Queries
    // ========================================================================

    pub async fn find_task_running_statistics(
        &self,
        from: DateTime<Utc>,
    ) -> Vec<TaskRunningStatistics> {
        self.find_from(Table::TaskRunning, from).await
    }

    pub async fn find_latest_task_running_statistics(&self) -> Option<TaskRunningStatistics> {
        self.find_latest(Table::TaskRunning).await
    }

    pub async fn find_job_running_statistics(
        &self,
        from: DateTime<Utc>,
    ) -> Vec<JobRunningStatistics> {
        self.find_from(Table::JobRunning, from).await
    }

    pub async fn find_latest_job_running_statistics(&self) -> Option<JobRunningStatistics> {
        self.find_latest(Table::JobRunning).await
    }

    pub async fn find_job_register_statistics(
        &self,
        from: DateTime<Utc>,
    ) -> Vec<JobRegisterStatistics> {
        self.find_from(Table::JobRegister, from).await
    }

    pub async fn find_latest_job_register_statistics(&self) -> Option<JobRegisterStatistics> {
        self.find_latest(Table::JobRegister).await
    }

    // ========================================================================
    // Shared Query Paths
    // ========================================================================

    async fn find_from<R: StatisticsRecord>(&self, table: Table, from: DateTime<Utc>) -> Vec<R> {
        match self.try_find_from(table, from).await {
            Ok(records) => records,
            Err(err) => {
                tracing::error!(table = table.name(), error = %err, "Failed to query statistics, returning no rows");
                Vec::new()
            }
        }
    }

    async fn try_find_from<R: StatisticsRecord>(
        &self,
        table: Table,
        from: DateTime<Utc>,
    ) -> Result<Vec<R>> {
        let binds = [Bind::BigInt(time::to_epoch_millis(&from))];
        let rows = self
            .pool
            .fetch_rows(table, &self.statements.for_table(table).find_from, &binds)
            .await?;

        rows.iter().map(R::decode).collect()
    }

    async fn find_latest<R: StatisticsRecord>(&self, table: Table) -> Option<R> {
        match self.try_find_latest(table).await {
            Ok(record) => record,
            Err(err) => {
                tracing::error!(table = table.name(), error = %err, "Failed to query latest statistics, returning none");
                None
            }
        }
    }

    async fn try_find_latest<R: StatisticsRecord>(&self, table: Table) -> Result<Option<R>> {
        let row = self
            .pool
            .fetch_row(table, &self.statements.for_table(table).find_latest, &[])
            .await?;

        row.as_ref().map(R::decode).transpose()
    }

    async fn fetch_sums(&self, table: Table, from: DateTime<Utc>) -> Result<(i64, i64)> {
        let sql = self
            .statements
            .for_table(table)
            .sum_from
            .as_deref()
            .ok_or_else(|| Error::InvalidArgument(format!("{} does not support sums", table)))?;

        self.pool
            .fetch_sums(sql, &[Bind::BigInt(time::to_epoch_millis(&from))])
            .await
    }
}
