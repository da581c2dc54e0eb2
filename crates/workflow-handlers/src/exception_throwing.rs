// Diagnostic handler that always fails.
// Used to drive an orchestrator's failure path deterministically.

use async_trait::async_trait;
use serde_json::Value;
use workflow_sdk::{ActionHandler, ExecuteError, HandlerConfig};

/// The message every run of [`ExceptionThrowingActionHandler`] fails with.
pub const FAILURE_MESSAGE: &str = "Oops. An exception occurred.";

/// An action handler with no success path.
///
/// The configuration is accepted and kept but never read. `execute()` has no
/// side effects and always signals the same domain failure.
#[derive(Debug, Clone)]
pub struct ExceptionThrowingActionHandler {
    config: HandlerConfig,
}

impl ExceptionThrowingActionHandler {
    pub const HANDLER_TYPE: &'static str = "exception-throwing";

    pub fn new(config: impl Into<HandlerConfig>) -> Self {
        Self {
            config: config.into(),
        }
    }
}

#[async_trait]
impl ActionHandler for ExceptionThrowingActionHandler {
    fn handler_type(&self) -> &str {
        Self::HANDLER_TYPE
    }

    fn config(&self) -> &HandlerConfig {
        &self.config
    }

    async fn execute(&self) -> Result<Option<Value>, ExecuteError> {
        Err(ExecuteError::domain(FAILURE_MESSAGE))
    }
}
