//! Connection source of the repository.
//!
//! Each backend keeps its own typed sqlx pool so values are decoded with the
//! driver's native types. Statement execution is written once and expanded per
//! backend by the `dispatch!` macro.

use sqlx::{postgres::PgPool, sqlite::SqlitePool, Row};

use crate::{
    codec::RawRow,
    query::{FAILED_SUM, SUCCESS_SUM},
    schema::Table,
    Dialect, Result,
};

/// Shared, cloneable pool for one of the supported backends.
#[derive(Debug, Clone)]
pub enum StatisticsPool {
    Postgres(PgPool),
    Sqlite(SqlitePool),
}

/// One bind parameter, in statement order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Bind {
    Int(i32),
    BigInt(i64),
}

macro_rules! dispatch {
    ($pool:expr, $inner:ident, $db:ident => $body:expr) => {
        match $pool {
            StatisticsPool::Postgres($inner) => {
                type $db = sqlx::Postgres;
                $body
            }
            StatisticsPool::Sqlite($inner) => {
                type $db = sqlx::Sqlite;
                $body
            }
        }
    };
    ($pool:expr, $inner:ident => $body:expr) => {
        match $pool {
            StatisticsPool::Postgres($inner) => $body,
            StatisticsPool::Sqlite($inner) => $body,
        }
    };
}

macro_rules! bound_query {
    ($db:ty, $sql:expr, $binds:expr) => {{
        let mut query = sqlx::query::<$db>($sql);
        for bind in $binds {
            query = match *bind {
                Bind::Int(value) => query.bind(value),
                Bind::BigInt(value) => query.bind(value),
            };
        }
        query
    }};
}

impl StatisticsPool {
    pub fn dialect(&self) -> Dialect {
        match self {
            StatisticsPool::Postgres(_) => Dialect::Postgres,
            StatisticsPool::Sqlite(_) => Dialect::Sqlite,
        }
    }

    /// Close every connection; later operations fail with a pool-closed error.
    pub async fn close(&self) {
        dispatch!(self, pool => pool.close().await)
    }

    pub fn is_closed(&self) -> bool {
        dispatch!(self, pool => pool.is_closed())
    }

    /// Run a statement and report the affected row count.
    pub(crate) async fn execute(&self, sql: &str, binds: &[Bind]) -> std::result::Result<u64, sqlx::Error> {
        dispatch!(self, pool, Db => {
            let result = bound_query!(Db, sql, binds).execute(pool).await?;
            Ok(result.rows_affected())
        })
    }

    pub(crate) async fn fetch_rows(&self, table: Table, sql: &str, binds: &[Bind]) -> Result<Vec<RawRow>> {
        dispatch!(self, pool, Db => {
            let rows = bound_query!(Db, sql, binds).fetch_all(pool).await?;
            rows.iter().map(|row| RawRow::read(table, row)).collect()
        })
    }

    pub(crate) async fn fetch_row(&self, table: Table, sql: &str, binds: &[Bind]) -> Result<Option<RawRow>> {
        dispatch!(self, pool, Db => {
            let row = bound_query!(Db, sql, binds).fetch_optional(pool).await?;
            row.map(|row| RawRow::read(table, &row)).transpose()
        })
    }

    /// Both 64-bit sums of the summed task result statement.
    pub(crate) async fn fetch_sums(&self, sql: &str, binds: &[Bind]) -> Result<(i64, i64)> {
        dispatch!(self, pool, Db => {
            let row = bound_query!(Db, sql, binds).fetch_one(pool).await?;
            let success: i64 = row.try_get(SUCCESS_SUM)?;
            let failed: i64 = row.try_get(FAILED_SUM)?;
            Ok((success, failed))
        })
    }
}

impl From<PgPool> for StatisticsPool {
    fn from(pool: PgPool) -> Self {
        StatisticsPool::Postgres(pool)
    }
}

impl From<SqlitePool> for StatisticsPool {
    fn from(pool: SqlitePool) -> Self {
        StatisticsPool::Sqlite(pool)
    }
}
