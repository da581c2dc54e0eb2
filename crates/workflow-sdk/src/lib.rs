// workflow-sdk: Foundation layer for workflow action handlers.
// This crate has ZERO dependencies on other workspace crates and provides the
// handler contract, handler configuration and the outcome types every
// orchestrator consumes.

pub mod action_handler;
pub mod config;
pub mod error;
pub mod outcome;

// Re-export commonly used items at crate root
pub use action_handler::{ActionHandler, ActionStep, StepState};
pub use config::{ConfigError, HandlerConfig, HandlerDescriptor};
pub use error::ExecuteError;
pub use outcome::{Failure, FailureKind, Outcome, OutcomeCode};
