// Failure taxonomy for handler execution.

use crate::config::ConfigError;
use thiserror::Error;

/// An error signalled by a handler's `execute()` body.
///
/// `Domain` is a deliberate refusal by the step logic. `Fault` is anything
/// the step did not expect: I/O, malformed data, missing configuration. The
/// `From` impls all land on `Fault`, so `?` inside `execute()` reports
/// environmental errors without extra ceremony.
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("{0}")]
    Domain(String),

    #[error(transparent)]
    Fault(anyhow::Error),
}

impl ExecuteError {
    pub fn domain(message: impl Into<String>) -> Self {
        Self::Domain(message.into())
    }

    pub fn fault(err: impl Into<anyhow::Error>) -> Self {
        Self::Fault(err.into())
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain(_))
    }
}

impl From<anyhow::Error> for ExecuteError {
    fn from(err: anyhow::Error) -> Self {
        Self::Fault(err)
    }
}

impl From<std::io::Error> for ExecuteError {
    fn from(err: std::io::Error) -> Self {
        Self::Fault(err.into())
    }
}

impl From<serde_json::Error> for ExecuteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Fault(err.into())
    }
}

impl From<ConfigError> for ExecuteError {
    fn from(err: ConfigError) -> Self {
        Self::Fault(err.into())
    }
}
