//! Mapping between statistics records and table rows.
//!
//! Counters are `u32` in the API but 32-bit signed `INTEGER` columns in storage,
//! and times are stored as UTC epoch milliseconds.

use chrono::{DateTime, Utc};
use jobstats_core::{
    time, JobRegisterStatistics, JobRunningStatistics, TaskResultStatistics,
    TaskRunningStatistics,
};
use sqlx::{ColumnIndex, Decode, Row, Type};

use crate::{schema::Table, Error, Result};

/// A record family that can be stored in one of the statistics tables.
pub trait StatisticsRecord: Sized + Send + Sync {
    /// Table the record is routed to.
    fn table(&self) -> Table;

    /// Counter values, in the order of [`Table::count_columns`].
    fn counters(&self) -> Vec<u32>;

    fn statistics_time(&self) -> DateTime<Utc>;

    fn decode(row: &RawRow) -> Result<Self>;
}

/// Bind values of one insert, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRow {
    pub counters: Vec<i32>,
    pub statistics_time: i64,
}

pub fn encode<R: StatisticsRecord>(record: &R) -> Result<EncodedRow> {
    let table = record.table();
    let counters = record
        .counters()
        .into_iter()
        .zip(table.count_columns())
        .map(|(value, column)| {
            i32::try_from(value).map_err(|_| {
                Error::InvalidArgument(format!(
                    "{}.{} = {} exceeds the column range",
                    table, column, value
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(EncodedRow {
        counters,
        statistics_time: time::to_epoch_millis(&record.statistics_time()),
    })
}

/// Column values of one stored row, read with the backend's native integer types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub table: Table,
    pub id: i64,
    /// In the order of [`Table::count_columns`].
    pub counters: Vec<i32>,
    pub statistics_time: i64,
    pub creation_time: i64,
}

impl RawRow {
    pub(crate) fn read<R>(table: Table, row: &R) -> Result<Self>
    where
        R: Row,
        for<'c> &'c str: ColumnIndex<R>,
        i32: Type<R::Database> + for<'r> Decode<'r, R::Database>,
        i64: Type<R::Database> + for<'r> Decode<'r, R::Database>,
    {
        let column_error = |column: &str, err: sqlx::Error| Error::Decode {
            table: table.name(),
            message: format!("{}: {}", column, err),
        };
        let wide = |column: &'static str| {
            row.try_get::<i64, _>(column)
                .map_err(|err| column_error(column, err))
        };

        let counters = table
            .count_columns()
            .iter()
            .map(|column| {
                row.try_get::<i32, _>(*column)
                    .map_err(|err| column_error(*column, err))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            table,
            id: wide("id")?,
            counters,
            statistics_time: wide("statistics_time")?,
            creation_time: wide("creation_time")?,
        })
    }

    fn error(&self, message: String) -> Error {
        Error::Decode {
            table: self.table.name(),
            message,
        }
    }

    fn counter(&self, index: usize) -> Result<u32> {
        let column = self.table.count_columns().get(index).copied().unwrap_or("counter");
        let value = self
            .counters
            .get(index)
            .copied()
            .ok_or_else(|| self.error(format!("missing {}", column)))?;
        u32::try_from(value)
            .map_err(|_| self.error(format!("{} = {} is not a valid counter", column, value)))
    }

    fn time(&self, column: &str, millis: i64) -> Result<DateTime<Utc>> {
        time::from_epoch_millis(millis).map_err(|err| self.error(format!("{}: {}", column, err)))
    }

    fn statistics_time(&self) -> Result<DateTime<Utc>> {
        self.time("statistics_time", self.statistics_time)
    }

    fn creation_time(&self) -> Result<DateTime<Utc>> {
        self.time("creation_time", self.creation_time)
    }
}

impl StatisticsRecord for TaskResultStatistics {
    fn table(&self) -> Table {
        Table::TaskResult(self.interval)
    }

    fn counters(&self) -> Vec<u32> {
        vec![self.success_count, self.failed_count]
    }

    fn statistics_time(&self) -> DateTime<Utc> {
        self.statistics_time
    }

    fn decode(row: &RawRow) -> Result<Self> {
        let interval = row
            .table
            .interval()
            .ok_or_else(|| row.error("not a task result table".to_string()))?;

        Ok(Self {
            id: Some(row.id),
            success_count: row.counter(0)?,
            failed_count: row.counter(1)?,
            interval,
            statistics_time: row.statistics_time()?,
            creation_time: Some(row.creation_time()?),
        })
    }
}

// The three sampled families share one counter column plus the common time columns.
macro_rules! sampled_record {
    ($record:ty, $table:expr, $count:ident) => {
        impl StatisticsRecord for $record {
            fn table(&self) -> Table {
                $table
            }

            fn counters(&self) -> Vec<u32> {
                vec![self.$count]
            }

            fn statistics_time(&self) -> DateTime<Utc> {
                self.statistics_time
            }

            fn decode(row: &RawRow) -> Result<Self> {
                if row.table != $table {
                    return Err(row.error(format!("expected {}", $table)));
                }

                Ok(Self {
                    id: Some(row.id),
                    $count: row.counter(0)?,
                    statistics_time: row.statistics_time()?,
                    creation_time: Some(row.creation_time()?),
                })
            }
        }
    };
}

sampled_record!(TaskRunningStatistics, Table::TaskRunning, running_count);
sampled_record!(JobRunningStatistics, Table::JobRunning, running_count);
sampled_record!(JobRegisterStatistics, Table::JobRegister, registered_count);

/// Narrow a 64-bit sum to the counter width, saturating on overflow.
pub fn saturate_sum(table: Table, column: &str, sum: i64) -> u32 {
    match u32::try_from(sum) {
        Ok(value) => value,
        Err(_) if sum < 0 => {
            tracing::warn!(table = table.name(), column, sum, "Negative counter sum clamped to zero");
            0
        }
        Err(_) => {
            tracing::warn!(table = table.name(), column, sum, "Counter sum saturated");
            u32::MAX
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jobstats_core::StatisticInterval;

    #[test]
    fn test_encode_task_result() {
        let time = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let stats = TaskResultStatistics::new(100, 2, StatisticInterval::Hour, time);

        let encoded = encode(&stats).unwrap();
        assert_eq!(encoded.counters, vec![100, 2]);
        assert_eq!(encoded.statistics_time, 1_700_000_000_123);
        assert_eq!(stats.table(), Table::TaskResult(StatisticInterval::Hour));
    }

    #[test]
    fn test_encode_sampled_families() {
        let now = Utc::now();
        assert_eq!(encode(&TaskRunningStatistics::new(5, now)).unwrap().counters, vec![5]);
        assert_eq!(encode(&JobRunningStatistics::new(6, now)).unwrap().counters, vec![6]);
        assert_eq!(encode(&JobRegisterStatistics::new(7, now)).unwrap().counters, vec![7]);
        assert_eq!(JobRunningStatistics::new(6, now).table(), Table::JobRunning);
    }

    #[test]
    fn test_encode_rejects_counter_wider_than_column() {
        let stats = TaskResultStatistics::new(u32::MAX, 0, StatisticInterval::Minute, Utc::now());
        let err = encode(&stats).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(ref message) if message.contains("success_count")));

        let stats = JobRegisterStatistics::new(i32::MAX as u32 + 1, Utc::now());
        assert!(matches!(encode(&stats), Err(Error::InvalidArgument(_))));

        let stats = JobRegisterStatistics::new(i32::MAX as u32, Utc::now());
        assert!(encode(&stats).is_ok());
    }

    fn stored(table: Table, counters: Vec<i32>) -> RawRow {
        RawRow {
            table,
            id: 42,
            counters,
            statistics_time: 1_700_000_000_000,
            creation_time: 1_700_000_000_500,
        }
    }

    #[test]
    fn test_decode_task_result_takes_interval_from_table() {
        let row = stored(Table::TaskResult(StatisticInterval::Day), vec![300, 7]);
        let stats = TaskResultStatistics::decode(&row).unwrap();

        assert_eq!(stats.id, Some(42));
        assert_eq!((stats.success_count, stats.failed_count), (300, 7));
        assert_eq!(stats.interval, StatisticInterval::Day);
        assert_eq!(stats.statistics_time.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(stats.creation_time.unwrap().timestamp_millis(), 1_700_000_000_500);
    }

    #[test]
    fn test_decode_rejects_negative_counter() {
        let row = stored(Table::TaskRunning, vec![-1]);
        let err = TaskRunningStatistics::decode(&row).unwrap_err();
        assert!(matches!(err, Error::Decode { table: "TASK_RUNNING_STATISTICS", .. }));
    }

    #[test]
    fn test_decode_rejects_foreign_table() {
        let row = stored(Table::JobRunning, vec![3]);
        assert!(JobRegisterStatistics::decode(&row).is_err());
        assert!(TaskResultStatistics::decode(&row).is_err());
        assert_eq!(JobRunningStatistics::decode(&row).unwrap().running_count, 3);
    }

    #[test]
    fn test_saturate_sum() {
        let table = Table::TaskResult(StatisticInterval::Day);
        assert_eq!(saturate_sum(table, "success_count", 0), 0);
        assert_eq!(saturate_sum(table, "success_count", 300), 300);
        assert_eq!(saturate_sum(table, "success_count", i64::from(u32::MAX)), u32::MAX);
        assert_eq!(saturate_sum(table, "success_count", i64::from(u32::MAX) + 1), u32::MAX);
        assert_eq!(saturate_sum(table, "failed_count", -1), 0);
    }
}
