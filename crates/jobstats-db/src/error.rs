use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] sqlx::Error),

    #[error("Transient storage error: {0}")]
    Transient(#[from] sqlx::Error),

    #[error("Row decode error in {table}: {message}")]
    Decode { table: &'static str, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

impl From<jobstats_core::Error> for Error {
    fn from(err: jobstats_core::Error) -> Self {
        Error::InvalidArgument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
