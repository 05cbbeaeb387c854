use serde::Deserialize;
use sqlx::{
    pool::PoolOptions,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous},
    Database, Postgres, Sqlite,
};
use std::str::FromStr;
use std::time::Duration;

use crate::{Dialect, Error, Result, StatisticsPool};

const ENV_PREFIX: &str = "JOBSTATS";

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

/// Connection source settings.
///
/// An in-memory SQLite URL gives every pooled connection its own database, so
/// such pools need `max_connections = 1` and no idle or lifetime expiry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_lifetime_secs: Option<u64>,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            idle_timeout_secs: None,
            max_lifetime_secs: None,
        }
    }

    /// Single-connection in-memory SQLite store.
    pub fn in_memory() -> Self {
        Self {
            max_connections: 1,
            ..Self::new("sqlite::memory:")
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    /// Load from `JOBSTATS_DATABASE__URL`, `JOBSTATS_DATABASE__MAX_CONNECTIONS`, ...
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(
                ::config::Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.get::<Self>("database")?)
    }

    pub fn dialect(&self) -> Result<Dialect> {
        Dialect::from_url(&self.url)
    }

    fn pool_options<DB: Database>(&self) -> PoolOptions<DB> {
        PoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(self.idle_timeout_secs.map(Duration::from_secs))
            .max_lifetime(self.max_lifetime_secs.map(Duration::from_secs))
    }

    /// Open the connection pool. Failure to connect is fatal for the repository.
    ///
    /// SQLite stores are created if missing and run in WAL mode.
    pub async fn connect(&self) -> Result<StatisticsPool> {
        let dialect = self.dialect()?;
        let connected = match dialect {
            Dialect::Postgres => self
                .pool_options::<Postgres>()
                .connect(&self.url)
                .await
                .map(StatisticsPool::Postgres),
            Dialect::Sqlite => {
                let options = SqliteConnectOptions::from_str(&self.url)
                    .map_err(|err| Error::InvalidArgument(format!("invalid sqlite url: {}", err)))?
                    .journal_mode(SqliteJournalMode::Wal)
                    .synchronous(SqliteSynchronous::Normal)
                    .create_if_missing(true);

                self.pool_options::<Sqlite>()
                    .connect_with(options)
                    .await
                    .map(StatisticsPool::Sqlite)
            }
        };

        connected.map_err(|err| {
            tracing::error!(%dialect, error = %err, "Failed to connect statistics store");
            Error::StorageUnavailable(err)
        })
    }
}
