use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::StatisticInterval;

/// Success and failure counts of tasks finished within one interval bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResultStatistics {
    pub id: Option<i64>,
    pub success_count: u32,
    pub failed_count: u32,
    pub interval: StatisticInterval,
    pub statistics_time: DateTime<Utc>,
    pub creation_time: Option<DateTime<Utc>>,
}

impl TaskResultStatistics {
    pub fn new(
        success_count: u32,
        failed_count: u32,
        interval: StatisticInterval,
        statistics_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            success_count,
            failed_count,
            interval,
            statistics_time,
            creation_time: None,
        }
    }
}

/// Number of tasks running at the sample instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRunningStatistics {
    pub id: Option<i64>,
    pub running_count: u32,
    pub statistics_time: DateTime<Utc>,
    pub creation_time: Option<DateTime<Utc>>,
}

impl TaskRunningStatistics {
    pub fn new(running_count: u32, statistics_time: DateTime<Utc>) -> Self {
        Self {
            id: None,
            running_count,
            statistics_time,
            creation_time: None,
        }
    }
}

/// Number of jobs running at the sample instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRunningStatistics {
    pub id: Option<i64>,
    pub running_count: u32,
    pub statistics_time: DateTime<Utc>,
    pub creation_time: Option<DateTime<Utc>>,
}

impl JobRunningStatistics {
    pub fn new(running_count: u32, statistics_time: DateTime<Utc>) -> Self {
        Self {
            id: None,
            running_count,
            statistics_time,
            creation_time: None,
        }
    }
}

/// Total number of registered jobs at the sample instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRegisterStatistics {
    pub id: Option<i64>,
    pub registered_count: u32,
    pub statistics_time: DateTime<Utc>,
    pub creation_time: Option<DateTime<Utc>>,
}

impl JobRegisterStatistics {
    pub fn new(registered_count: u32, statistics_time: DateTime<Utc>) -> Self {
        Self {
            id: None,
            registered_count,
            statistics_time,
            creation_time: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_records_are_unpersisted() {
        let now = Utc::now();
        let result = TaskResultStatistics::new(100, 2, StatisticInterval::Minute, now);
        assert_eq!(result.id, None);
        assert_eq!(result.creation_time, None);
        assert_eq!(result.statistics_time, now);

        let running = TaskRunningStatistics::new(7, now);
        assert_eq!(running.id, None);
        assert_eq!(running.running_count, 7);

        let register = JobRegisterStatistics::new(42, now);
        assert_eq!(register.registered_count, 42);
    }

    #[test]
    fn test_serialize_task_result() {
        let stats = TaskResultStatistics::new(3, 1, StatisticInterval::Hour, Utc::now());
        let value = serde_json::to_value(&stats).unwrap();

        assert_eq!(value["success_count"], 3);
        assert_eq!(value["failed_count"], 1);
        assert_eq!(value["interval"], "HOUR");
        assert!(value["id"].is_null());
    }
}
