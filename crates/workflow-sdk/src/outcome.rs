// Outcome of a handler invocation, plus the process return-code mapping used
// when an outcome has to leave the process as an exit status.

use crate::error::ExecuteError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;

/// Offset added to outcome codes to produce process return codes.
const RETURN_CODE_OFFSET: i32 = 100;

/// What went wrong, structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The step logic decided it cannot complete.
    Domain,
    /// An unexpected fault (error or panic) inside the step.
    Fault,
    /// Synthesized by an orchestrator when a deadline elapsed. The handler
    /// skeleton never produces this kind.
    TimedOut,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Domain => write!(f, "domain"),
            FailureKind::Fault => write!(f, "fault"),
            FailureKind::TimedOut => write!(f, "timed out"),
        }
    }
}

/// The cause carried by a failed outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

impl Failure {
    pub fn domain(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Domain,
            message: message.into(),
            cause: None,
        }
    }

    pub fn fault(message: impl Into<String>, cause: Option<String>) -> Self {
        Self {
            kind: FailureKind::Fault,
            message: message.into(),
            cause,
        }
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::TimedOut,
            message: message.into(),
            cause: None,
        }
    }

    /// Build a fault from a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let panic_msg = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::fault(format!("handler panicked: {panic_msg}"), None)
    }
}

impl From<ExecuteError> for Failure {
    fn from(err: ExecuteError) -> Self {
        match err {
            ExecuteError::Domain(message) => Self::domain(message),
            ExecuteError::Fault(err) => {
                let causes: Vec<String> = err.chain().skip(1).map(|e| e.to_string()).collect();
                let cause = if causes.is_empty() {
                    None
                } else {
                    Some(causes.join(": "))
                };
                Self::fault(err.to_string(), cause)
            }
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failure({}): {}", self.kind, self.message)?;
        if let Some(ref cause) = self.cause {
            write!(f, " (caused by: {cause})")?;
        }
        Ok(())
    }
}

/// The normalized result of one `run()` of an action handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Value>,
    },
    Failure(Failure),
}

impl Outcome {
    pub fn success(output: Option<Value>) -> Self {
        Outcome::Success { output }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Outcome::Failure(failure) => Some(failure),
            Outcome::Success { .. } => None,
        }
    }

    pub fn output(&self) -> Option<&Value> {
        match self {
            Outcome::Success { output } => output.as_ref(),
            Outcome::Failure(_) => None,
        }
    }

    pub fn code(&self) -> OutcomeCode {
        match self {
            Outcome::Success { .. } => OutcomeCode::Succeeded,
            Outcome::Failure(f) if f.kind == FailureKind::TimedOut => OutcomeCode::TimedOut,
            Outcome::Failure(_) => OutcomeCode::Failed,
        }
    }
}

impl From<Result<Option<Value>, ExecuteError>> for Outcome {
    fn from(result: Result<Option<Value>, ExecuteError>) -> Self {
        match result {
            Ok(output) => Outcome::Success { output },
            Err(err) => Outcome::Failure(err.into()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success { .. } => write!(f, "Success"),
            Outcome::Failure(failure) => write!(f, "{failure}"),
        }
    }
}

/// Coarse outcome classification that travels as a process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i32)]
pub enum OutcomeCode {
    Succeeded = 0,
    Failed = 2,
    TimedOut = 3,
}

impl OutcomeCode {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(OutcomeCode::Succeeded),
            2 => Some(OutcomeCode::Failed),
            3 => Some(OutcomeCode::TimedOut),
            _ => None,
        }
    }

    /// Translate to a process return code.
    pub fn to_return_code(self) -> i32 {
        RETURN_CODE_OFFSET + (self as i32)
    }

    /// Translate a process return code back. Unrecognized codes are `Failed`.
    pub fn from_return_code(return_code: i32) -> Self {
        Self::from_i32(return_code - RETURN_CODE_OFFSET).unwrap_or(OutcomeCode::Failed)
    }

    pub fn is_valid_return_code(return_code: i32) -> bool {
        Self::from_i32(return_code - RETURN_CODE_OFFSET).is_some()
    }
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeCode::Succeeded => write!(f, "Succeeded"),
            OutcomeCode::Failed => write!(f, "Failed"),
            OutcomeCode::TimedOut => write!(f, "TimedOut"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use serde_json::json;

    #[test]
    fn domain_error_becomes_domain_failure() {
        let failure: Failure = ExecuteError::domain("cannot proceed").into();
        assert_eq!(failure, Failure::domain("cannot proceed"));
        assert!(failure.cause.is_none());
    }

    #[test]
    fn fault_keeps_source_chain_as_cause() {
        let err: anyhow::Error = Err::<(), _>(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "manifest-md5.txt missing",
        ))
        .context("Failed to copy file manifest")
        .unwrap_err();
        let failure: Failure = ExecuteError::fault(err).into();
        assert_eq!(failure.kind, FailureKind::Fault);
        assert_eq!(failure.message, "Failed to copy file manifest");
        assert_eq!(failure.cause.as_deref(), Some("manifest-md5.txt missing"));
    }

    #[test]
    fn panic_payloads() {
        let failure = Failure::from_panic(Box::new("boom"));
        assert_eq!(failure.message, "handler panicked: boom");
        let failure = Failure::from_panic(Box::new(String::from("index out of bounds")));
        assert_eq!(failure.message, "handler panicked: index out of bounds");
        let failure = Failure::from_panic(Box::new(42_u8));
        assert_eq!(failure.message, "handler panicked: unknown panic");
        assert_eq!(failure.kind, FailureKind::Fault);
    }

    #[test]
    fn display() {
        assert_eq!(Outcome::success(None).to_string(), "Success");
        let outcome = Outcome::Failure(Failure::fault("write failed", Some("disk full".into())));
        assert_eq!(
            outcome.to_string(),
            "Failure(fault): write failed (caused by: disk full)"
        );
    }

    #[test]
    fn serializes_with_status_tag() {
        let outcome = Outcome::Failure(Failure::domain("nope"));
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            value,
            json!({"status": "failure", "kind": "domain", "message": "nope"})
        );

        let outcome = Outcome::success(Some(json!({"files": 3})));
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value, json!({"status": "success", "output": {"files": 3}}));
        let restored: Outcome = serde_json::from_value(value).unwrap();
        assert_eq!(restored.output(), Some(&json!({"files": 3})));
    }

    #[test]
    fn accessors() {
        let ok = Outcome::success(None);
        assert!(ok.is_success());
        assert!(ok.failure().is_none());
        let failed = Outcome::Failure(Failure::timed_out("deadline elapsed"));
        assert!(!failed.is_success());
        assert_eq!(failed.failure().map(|f| f.kind), Some(FailureKind::TimedOut));
        assert!(failed.output().is_none());
    }

    #[test]
    fn return_codes() {
        assert_eq!(Outcome::success(None).code().to_return_code(), 100);
        assert_eq!(
            Outcome::Failure(Failure::domain("x")).code().to_return_code(),
            102
        );
        assert_eq!(
            Outcome::Failure(Failure::timed_out("x")).code().to_return_code(),
            103
        );
        assert_eq!(OutcomeCode::from_return_code(103), OutcomeCode::TimedOut);
        assert_eq!(OutcomeCode::from_return_code(1), OutcomeCode::Failed);
        assert!(OutcomeCode::is_valid_return_code(100));
        assert!(!OutcomeCode::is_valid_return_code(101));
    }
}
