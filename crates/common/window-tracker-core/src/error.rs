use std::sync::PoisonError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("{0}")]
    Error(String),

    #[error("StdSyncPoisonError {0}")]
    StdSyncPoisonError(String),

    #[error("Unsupported")]
    Unsupported,

    #[error("Access denied")]
    AccessDenied,

    #[error("No display available")]
    NoDisplay,

    #[error("Not running in interactive session")]
    NotInteractiveSession,

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Index {index} out of range for history of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Activation of pid {pid} exhausted after {attempts} attempts")]
    ActivationExhausted { pid: u32, attempts: u32 },

    #[error("Probe '{probe}' timed out after {after:?}")]
    Timeout { probe: String, after: Duration },

    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Platform error: {message}")]
    Platform {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TrackerError {
    pub fn new<S: ToString>(err: S) -> Self {
        TrackerError::Error(err.to_string())
    }

    pub fn platform<S: Into<String>>(message: S) -> Self {
        TrackerError::Platform {
            message: message.into(),
            source: None,
        }
    }

    pub fn platform_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        TrackerError::Platform {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn not_found<S: Into<String>>(what: S) -> Self {
        TrackerError::NotFound { what: what.into() }
    }

    /// Per-window conditions that batch operations skip instead of aborting on.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TrackerError::AccessDenied | TrackerError::NotFound { .. }
        )
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;

impl<T> From<PoisonError<T>> for TrackerError {
    fn from(value: PoisonError<T>) -> Self {
        TrackerError::StdSyncPoisonError(value.to_string())
    }
}
