use std::path::PathBuf;

use rusqlite::ErrorCode;

use crate::domain::AssetKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[source] rusqlite::Error),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// The catalog's storage could not be reached: its directory could not
    /// be created, or SQLite refused to open or configure the file.
    #[error("cannot open catalog at {}: {}", .path.display(), .source)]
    Connection {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("cannot open external library at {}: {}", .path.display(), .source)]
    ExternalLibrary {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("walkdir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialize error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("config file does not exist: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("{0}")]
    Usage(String),

    #[error("{kind} with id {id} not found")]
    NotFound { kind: AssetKind, id: i64 },

    #[error("{0} has no catalog identity; save it first")]
    MissingIdentity(AssetKind),

    #[error("asset filename must not be empty")]
    EmptyFilename,

    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref code, ref message)
                if code.code == ErrorCode::ConstraintViolation =>
            {
                Error::ConstraintViolation(
                    message.clone().unwrap_or_else(|| code.to_string()),
                )
            }
            other => Error::Database(other),
        }
    }
}

impl Error {
    pub(crate) fn connection(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            path: path.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
