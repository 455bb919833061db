//! Fatal run errors and the error document that replaces the summary.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// A failure that aborts the run.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error("cannot read detection log")]
    OpenInput(#[source] anyhow::Error),
    #[error("cannot create {path}")]
    OpenOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("run aborted")]
    Runtime(#[source] anyhow::Error),
}

impl FatalError {
    /// Machine-readable reason written to the error document.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::OpenInput(_) => "failed_to_open_input",
            Self::OpenOutput { .. } => "failed_to_open_output",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Runtime(_) => "runtime_failure",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::OpenOutput { .. } => 2,
            Self::OpenInput(_) => 3,
            Self::Runtime(_) => 4,
            Self::InvalidConfig(_) => 5,
        }
    }

    /// Full cause chain, one line.
    pub fn details(&self) -> String {
        match self {
            Self::OpenInput(err) | Self::Runtime(err) => format!("{self}: {err:#}"),
            Self::OpenOutput { source, .. } => format!("{self}: {source}"),
            Self::InvalidConfig(_) => self.to_string(),
        }
    }

    pub fn document(&self) -> ErrorDocument {
        ErrorDocument {
            error: self.reason(),
            details: self.details(),
        }
    }
}

/// `{"error": reason, "details": ...}` on stdout.
#[derive(Debug, Serialize)]
pub struct ErrorDocument {
    pub error: &'static str,
    pub details: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_and_exit_codes_are_distinct() {
        let errors = [
            FatalError::OpenInput(anyhow::anyhow!("gone")),
            FatalError::OpenOutput {
                path: "/x".into(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            },
            FatalError::InvalidConfig("bad".into()),
            FatalError::Runtime(anyhow::anyhow!("disk full")),
        ];
        let codes: Vec<u8> = errors.iter().map(FatalError::exit_code).collect();
        assert_eq!(codes, vec![3, 2, 5, 4]);
        assert_eq!(errors[0].reason(), "failed_to_open_input");
        assert_eq!(errors[1].reason(), "failed_to_open_output");
        assert_eq!(errors[2].reason(), "invalid_config");
        assert_eq!(errors[3].reason(), "runtime_failure");
    }

    #[test]
    fn document_carries_the_cause_chain() {
        let err = FatalError::OpenInput(anyhow::anyhow!("no such file").context("cannot open a.json"));
        let json = serde_json::to_value(err.document()).unwrap();
        assert_eq!(json["error"], "failed_to_open_input");
        let details = json["details"].as_str().unwrap();
        assert!(details.contains("cannot open a.json"));
        assert!(details.contains("no such file"));
    }
}
