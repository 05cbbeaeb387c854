//! SQL dialects understood by the statement builder.
//!
//! Statements are rendered once per dialect; the typed pool in
//! [`crate::StatisticsPool`] only binds and runs them.

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Infer the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url.split(':').next().unwrap_or_default();
        match scheme.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(Error::InvalidArgument(format!(
                "unsupported database url scheme: {}",
                scheme
            ))),
        }
    }

    /// Bind placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::Sqlite => "?".to_string(),
        }
    }

    pub(crate) fn id_column(&self) -> &'static str {
        match self {
            Dialect::Postgres => "id BIGSERIAL PRIMARY KEY",
            Dialect::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
        }
    }

    /// Store-side clock in epoch milliseconds, used as the creation time default.
    pub(crate) fn now_millis(&self) -> &'static str {
        match self {
            Dialect::Postgres => "(EXTRACT(EPOCH FROM NOW()) * 1000)::BIGINT",
            Dialect::Sqlite => "(CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))",
        }
    }

    /// Whether a failed DDL statement only lost a race against a concurrent creator.
    pub(crate) fn is_already_exists(&self, err: &sqlx::Error) -> bool {
        let Some(db_err) = err.as_database_error() else {
            return false;
        };
        match self {
            // duplicate_table, or unique_violation on pg_type during concurrent CREATE
            Dialect::Postgres => matches!(db_err.code().as_deref(), Some("42P07") | Some("23505")),
            Dialect::Sqlite => db_err.message().contains("already exists"),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Postgres => write!(f, "postgres"),
            Dialect::Sqlite => write!(f, "sqlite"),
        }
    }
}
