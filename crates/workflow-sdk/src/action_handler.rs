// The action handler capability and the shared skeleton that turns whatever
// happens inside `execute()` into an `Outcome` value.

use crate::config::HandlerConfig;
use crate::error::ExecuteError;
use crate::outcome::{Failure, Outcome};
use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use std::fmt;
use std::panic::AssertUnwindSafe;
use tracing::debug;

/// A pluggable unit of workflow-step logic.
///
/// Implementors supply `execute()`. Orchestrators never call it directly;
/// they wrap the handler in an [`ActionStep`] and call [`ActionStep::run`],
/// which guarantees an [`Outcome`] comes back no matter how `execute()` ends.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// The registered type identifier of this handler.
    fn handler_type(&self) -> &str;

    /// The configuration bound at construction.
    fn config(&self) -> &HandlerConfig;

    /// The step body. `Ok` carries optional step output.
    async fn execute(&self) -> Result<Option<Value>, ExecuteError>;
}

/// Run `execute()` once and normalize the result.
///
/// Errors become `Failure` outcomes with their kind preserved, and panics are
/// caught and reported as faults. No retries, no logging. This skips the step
/// lifecycle, so it stays private to the crate; callers use `ActionStep`.
pub(crate) async fn invoke(handler: &dyn ActionHandler) -> Outcome {
    // The call sits inside the async block so a panic while building the
    // future is caught too.
    let result = AssertUnwindSafe(async { handler.execute().await })
        .catch_unwind()
        .await;

    match result {
        Ok(result) => result.into(),
        Err(payload) => Outcome::Failure(Failure::from_panic(payload)),
    }
}

/// Lifecycle of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepState {
    Created,
    Running,
    Succeeded,
    Failed,
}

impl StepState {
    pub fn is_terminal(self) -> bool {
        matches!(self, StepState::Succeeded | StepState::Failed)
    }

    pub fn can_transition_to(self, next: StepState) -> bool {
        matches!(
            (self, next),
            (StepState::Created, StepState::Running)
                | (StepState::Running, StepState::Succeeded)
                | (StepState::Running, StepState::Failed)
        )
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepState::Created => write!(f, "created"),
            StepState::Running => write!(f, "running"),
            StepState::Succeeded => write!(f, "succeeded"),
            StepState::Failed => write!(f, "failed"),
        }
    }
}

/// A one-shot workflow step wrapping a handler.
///
/// `run` consumes the step, so a step that reached a terminal state cannot be
/// run again. Re-execution needs a fresh step built from the same config.
pub struct ActionStep {
    handler: Box<dyn ActionHandler>,
    state: StepState,
}

impl ActionStep {
    pub fn new<H: ActionHandler + 'static>(handler: H) -> Self {
        Self::from_boxed(Box::new(handler))
    }

    pub fn from_boxed(handler: Box<dyn ActionHandler>) -> Self {
        Self {
            handler,
            state: StepState::Created,
        }
    }

    pub fn state(&self) -> StepState {
        self.state
    }

    pub fn handler_type(&self) -> &str {
        self.handler.handler_type()
    }

    pub fn config(&self) -> &HandlerConfig {
        self.handler.config()
    }

    /// Run the step to completion.
    pub async fn run(self) -> Outcome {
        self.run_with_state().await.0
    }

    /// Run the step and also return the terminal state it reached.
    pub async fn run_with_state(mut self) -> (Outcome, StepState) {
        self.transition(StepState::Running);
        let outcome = invoke(self.handler.as_ref()).await;
        let terminal = if outcome.is_success() {
            StepState::Succeeded
        } else {
            StepState::Failed
        };
        self.transition(terminal);
        (outcome, self.state)
    }

    fn transition(&mut self, next: StepState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid step transition {} -> {}",
            self.state,
            next
        );
        debug!(
            handler_type = %self.handler.handler_type(),
            from = %self.state,
            to = %next,
            "Step state transition"
        );
        self.state = next;
    }
}

impl fmt::Debug for ActionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionStep")
            .field("handler_type", &self.handler.handler_type())
            .field("config", self.handler.config())
            .field("state", &self.state)
            .finish()
    }
}
