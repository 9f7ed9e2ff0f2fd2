//! Error types for the ilgraph core library.

#[cfg(feature = "python")]
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
#[cfg(feature = "python")]
use pyo3::PyErr;

/// Top-level error enum for the ilgraph core library.
#[derive(Debug, thiserror::Error)]
pub enum IlGraphError {
    #[error("{kind} not found: {name}")]
    SymbolNotFound { kind: &'static str, name: String },

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IlGraphError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        IlGraphError::SymbolNotFound {
            kind,
            name: name.into(),
        }
    }
}

#[cfg(feature = "python")]
impl From<IlGraphError> for PyErr {
    fn from(err: IlGraphError) -> PyErr {
        match &err {
            IlGraphError::SymbolNotFound { .. }
            | IlGraphError::InvalidCursor(_)
            | IlGraphError::InvalidArgument(_)
            | IlGraphError::Snapshot(_)
            | IlGraphError::Json(_) => PyValueError::new_err(err.to_string()),
            IlGraphError::Database(_) | IlGraphError::Sqlite(_) => {
                PyRuntimeError::new_err(err.to_string())
            }
            IlGraphError::Io(_) => PyIOError::new_err(err.to_string()),
        }
    }
}

pub type IlGraphResult<T> = Result<T, IlGraphError>;
