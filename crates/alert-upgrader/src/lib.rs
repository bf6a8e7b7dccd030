pub mod config;
pub mod crd;
pub mod external_id;
pub mod metrics;
pub mod settings;
pub mod store;
pub mod upgrade;

use std::fmt;

use thiserror::Error;

/// The subject a readiness precondition was evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessSubject {
    Cluster,
    Catalog,
}

impl fmt::Display for ReadinessSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessSubject::Cluster => write!(f, "cluster"),
            ReadinessSubject::Catalog => write!(f, "catalog"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Kubernetes error: {0}")]
    Kubernetes(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid external id {id}: {reason}")]
    ExternalId { id: String, reason: String },
    #[error("Lookup error: {0}")]
    Lookup(String),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("{subject} {name} not ready")]
    NotReady {
        subject: ReadinessSubject,
        name: String,
    },
    #[error("JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists(_))
    }

    /// Whether invoking the same operation again later can succeed without
    /// any change to configuration.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::NotReady { .. } | Error::Conflict(_) | Error::Kubernetes(_) | Error::Migration(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_ready_message_names_subject() {
        let err = Error::NotReady {
            subject: ReadinessSubject::Cluster,
            name: "c-abc12".to_string(),
        };
        assert_eq!(err.to_string(), "cluster c-abc12 not ready");
        assert!(err.is_retryable());

        let err = Error::NotReady {
            subject: ReadinessSubject::Catalog,
            name: "system-library".to_string(),
        };
        assert_eq!(err.to_string(), "catalog system-library not ready");
    }

    #[test]
    fn test_configuration_errors_are_not_retryable() {
        assert!(!Error::Config("CLUSTER_NAME is empty".to_string()).is_retryable());
        assert!(!Error::Lookup("template missing".to_string()).is_retryable());
        assert!(Error::Kubernetes("connection refused".to_string()).is_retryable());
    }

    #[test]
    fn test_conflict_classification() {
        assert!(Error::NotFound("x".to_string()).is_not_found());
        assert!(!Error::NotFound("x".to_string()).is_already_exists());
        assert!(Error::AlreadyExists("x".to_string()).is_already_exists());
    }
}
