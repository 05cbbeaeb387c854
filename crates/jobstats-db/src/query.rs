//! Parameterised statement text for every statistics table.
//!
//! Statements are rendered once when the repository is built and never change
//! afterwards, so the set can be shared freely between callers.

use crate::{schema::Table, Dialect};

/// Column aliases of the summed task result query.
pub const SUCCESS_SUM: &str = "success_sum";
pub const FAILED_SUM: &str = "failed_sum";

#[derive(Debug, Clone)]
pub struct TableStatements {
    pub insert: String,
    pub find_from: String,
    pub find_latest: String,
    /// Only rendered for task result tables.
    pub sum_from: Option<String>,
}

impl TableStatements {
    fn render(table: Table, dialect: Dialect) -> Self {
        let name = table.name();
        let counters = table.count_columns();
        let select_columns = format!("id, {}, statistics_time, creation_time", counters.join(", "));

        let placeholders: Vec<String> = (1..=counters.len() + 1)
            .map(|index| dialect.placeholder(index))
            .collect();
        let insert = format!(
            "INSERT INTO {} ({}, statistics_time) VALUES ({})",
            name,
            counters.join(", "),
            placeholders.join(", ")
        );

        let find_from = format!(
            "SELECT {} FROM {} WHERE statistics_time >= {} ORDER BY statistics_time ASC, id ASC",
            select_columns,
            name,
            dialect.placeholder(1)
        );

        let find_latest = format!(
            "SELECT {} FROM {} ORDER BY statistics_time DESC, id DESC LIMIT 1",
            select_columns, name
        );

        let sum_from = table.interval().map(|_| {
            format!(
                "SELECT COALESCE(SUM(success_count), 0) AS {}, COALESCE(SUM(failed_count), 0) AS {} FROM {} WHERE statistics_time >= {}",
                SUCCESS_SUM,
                FAILED_SUM,
                name,
                dialect.placeholder(1)
            )
        });

        Self {
            insert,
            find_from,
            find_latest,
            sum_from,
        }
    }
}

/// Statements for all tables, indexed by [`Table::ordinal`].
#[derive(Debug, Clone)]
pub struct StatementSet {
    dialect: Dialect,
    tables: Vec<TableStatements>,
}

impl StatementSet {
    pub fn new(dialect: Dialect) -> Self {
        let tables = Table::ALL
            .iter()
            .map(|table| TableStatements::render(*table, dialect))
            .collect();

        Self { dialect, tables }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn for_table(&self, table: Table) -> &TableStatements {
        &self.tables[table.ordinal()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobstats_core::StatisticInterval;

    #[test]
    fn test_postgres_task_result_statements() {
        let set = StatementSet::new(Dialect::Postgres);
        let stmts = set.for_table(Table::TaskResult(StatisticInterval::Minute));

        assert_eq!(
            stmts.insert,
            "INSERT INTO TASK_RESULT_STATISTICS_MINUTE (success_count, failed_count, statistics_time) VALUES ($1, $2, $3)"
        );
        assert_eq!(
            stmts.find_from,
            "SELECT id, success_count, failed_count, statistics_time, creation_time FROM TASK_RESULT_STATISTICS_MINUTE WHERE statistics_time >= $1 ORDER BY statistics_time ASC, id ASC"
        );
        assert_eq!(
            stmts.find_latest,
            "SELECT id, success_count, failed_count, statistics_time, creation_time FROM TASK_RESULT_STATISTICS_MINUTE ORDER BY statistics_time DESC, id DESC LIMIT 1"
        );
        assert!(stmts.sum_from.as_deref().unwrap().ends_with("WHERE statistics_time >= $1"));
    }

    #[test]
    fn test_sqlite_register_statements() {
        let set = StatementSet::new(Dialect::Sqlite);
        let stmts = set.for_table(Table::JobRegister);

        assert_eq!(
            stmts.insert,
            "INSERT INTO JOB_REGISTER_STATISTICS (registered_count, statistics_time) VALUES (?, ?)"
        );
        assert!(stmts.find_from.contains("FROM JOB_REGISTER_STATISTICS WHERE statistics_time >= ?"));
        assert!(stmts.sum_from.is_none());
    }

    #[test]
    fn test_every_table_has_statements() {
        let set = StatementSet::new(Dialect::Sqlite);
        for table in Table::ALL {
            assert!(set.for_table(table).insert.contains(table.name()));
            assert_eq!(set.for_table(table).sum_from.is_some(), table.interval().is_some());
        }
        assert_eq!(set.dialect(), Dialect::Sqlite);
    }
}
