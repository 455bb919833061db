//! Error types for the fallible parts of the core (zone files).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("cannot access zone file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("zone file {path} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("a zone needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("zone vertex ({0}, {1}) is not finite")]
    NonFiniteVertex(f64, f64),
}

pub type ZoneResult<T> = Result<T, ZoneError>;
