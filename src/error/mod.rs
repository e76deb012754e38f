use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("could not open store at {path}")]
    Connection {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("table `{table}` does not match the expected schema: {reason}")]
    Schema { table: String, reason: String },
    #[error("could not read table `{table}`")]
    Read {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("could not replace table `{table}`")]
    Write {
        table: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("could not render revenue rows as CSV")]
    CsvError(#[from] csv::Error),
    #[error("could not write CSV export")]
    FileError(#[from] std::io::Error),
    #[error(transparent)]
    DomainError(#[from] crate::domain::error::Error),
}

impl Error {
    pub(crate) fn schema(table: &str, reason: impl Into<String>) -> Self {
        Self::Schema {
            table: table.to_owned(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
