// workflow-handler-host: Runs one action handler on behalf of an orchestrator.
//
// The host reads a serialized `HandlerDescriptor`, rebuilds the handler through
// the registry, runs it once (optionally under a deadline) and reports the
// outcome. The binary in `main.rs` is a thin CLI over these functions.

use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use workflow_handlers::{HandlerRegistry, RegistryError};
use workflow_sdk::{Failure, HandlerDescriptor, Outcome};

/// Read a descriptor from the first line of `reader`.
pub fn read_descriptor_from<R: BufRead>(mut reader: R) -> Result<HandlerDescriptor> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("Failed to read handler descriptor")?;
    let line = line.trim_end();
    if line.is_empty() {
        anyhow::bail!("Handler descriptor must not be empty");
    }
    HandlerDescriptor::from_json(line)
}

/// Read a descriptor from a file, or from stdin when no path is given.
pub fn read_descriptor(path: Option<&Path>) -> Result<HandlerDescriptor> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| {
                format!("Failed to read handler descriptor '{}'", path.display())
            })?;
            HandlerDescriptor::from_json(text.trim())
        }
        None => read_descriptor_from(std::io::stdin().lock()),
    }
}

/// Build the step for `descriptor` and run it once.
///
/// Construction errors are returned as errors; everything that happens once
/// the step runs is an `Outcome`. When `timeout` elapses first the step is
/// dropped and a `TimedOut` failure is recorded in its place.
pub async fn run_descriptor(
    registry: &HandlerRegistry,
    descriptor: &HandlerDescriptor,
    timeout: Option<Duration>,
) -> Result<Outcome, RegistryError> {
    let step = registry.create_step(descriptor)?;
    let handler_type = step.handler_type().to_string();
    info!(handler_type = %handler_type, config = %step.config(), "Running action handler");

    let outcome = match timeout {
        Some(deadline) => match tokio::time::timeout(deadline, step.run()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(handler_type = %handler_type, ?deadline, "Action handler timed out");
                Outcome::Failure(Failure::timed_out(format!(
                    "Handler '{handler_type}' did not finish within {deadline:?}"
                )))
            }
        },
        None => step.run().await,
    };

    match outcome.failure() {
        None => info!(handler_type = %handler_type, "Action handler succeeded"),
        Some(failure) => warn!(
            handler_type = %handler_type,
            kind = %failure.kind,
            message = %failure.message,
            "Action handler failed"
        ),
    }
    Ok(outcome)
}

/// Render an outcome as JSON for stdout.
pub fn render_outcome(outcome: &Outcome, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(outcome)
    } else {
        serde_json::to_string_pretty(outcome)
    };
    json.context("Failed to serialize outcome")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::io::Cursor;
    use workflow_sdk::{
        ActionHandler, ConfigError, ExecuteError, FailureKind, HandlerConfig, OutcomeCode,
    };

    struct SlowHandler {
        config: HandlerConfig,
    }

    #[async_trait]
    impl ActionHandler for SlowHandler {
        fn handler_type(&self) -> &str {
            "slow"
        }

        fn config(&self) -> &HandlerConfig {
            &self.config
        }

        async fn execute(&self) -> Result<Option<Value>, ExecuteError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }
    }

    fn build_slow(config: HandlerConfig) -> Result<Box<dyn ActionHandler>, ConfigError> {
        Ok(Box::new(SlowHandler { config }))
    }

    #[test]
    fn reads_first_line_only() {
        let input = "{\"handler_type\":\"exception-throwing\",\"config\":\"test-config\"}\nignored\n";
        let descriptor = read_descriptor_from(Cursor::new(input)).unwrap();
        assert_eq!(descriptor.handler_type, "exception-throwing");
        assert_eq!(descriptor.config.as_text(), Some("test-config"));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(read_descriptor_from(Cursor::new("\n")).is_err());
        assert!(read_descriptor_from(Cursor::new("")).is_err());
    }

    #[test]
    fn reads_descriptor_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("step.json");
        std::fs::write(
            &path,
            "{\n  \"handler_type\": \"exception-throwing\",\n  \"config\": {\"bag\": \"b1\"}\n}\n",
        )
        .unwrap();
        let descriptor = read_descriptor(Some(&path)).unwrap();
        assert_eq!(descriptor.config.get_str("bag"), Some("b1"));

        let missing = dir.path().join("missing.json");
        let err = read_descriptor(Some(&missing)).unwrap_err();
        assert!(format!("{err:#}").contains("missing.json"));
    }

    #[tokio::test]
    async fn diagnostic_handler_end_to_end() {
        let registry = HandlerRegistry::with_builtin_handlers();
        let descriptor = HandlerDescriptor::new("exception-throwing", "test-config");
        let outcome = run_descriptor(&registry, &descriptor, None).await.unwrap();
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Domain);
        assert_eq!(failure.message, "Oops. An exception occurred.");
        assert_eq!(outcome.code().to_return_code(), 102);
    }

    #[tokio::test]
    async fn unknown_handler_is_a_host_error() {
        let registry = HandlerRegistry::with_builtin_handlers();
        let descriptor = HandlerDescriptor::new("NoSuchHandler", "test-config");
        let err = run_descriptor(&registry, &descriptor, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownHandlerType(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_produces_timed_out_failure() {
        let mut registry = HandlerRegistry::new();
        registry.register("slow", &[], build_slow);
        let descriptor = HandlerDescriptor::new("slow", HandlerConfig::empty());
        let outcome = run_descriptor(&registry, &descriptor, Some(Duration::from_secs(1)))
            .await
            .unwrap();
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::TimedOut);
        assert!(failure.message.contains("slow"));
        assert_eq!(outcome.code(), OutcomeCode::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_not_hit() {
        let registry = HandlerRegistry::with_builtin_handlers();
        let descriptor = HandlerDescriptor::new("exception-throwing", HandlerConfig::empty());
        let outcome = run_descriptor(&registry, &descriptor, Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Domain);
    }

    #[test]
    fn compact_rendering() {
        let outcome = Outcome::Failure(Failure::domain("Oops. An exception occurred."));
        assert_eq!(
            render_outcome(&outcome, true).unwrap(),
            r#"{"status":"failure","kind":"domain","message":"Oops. An exception occurred."}"#
        );
        assert!(render_outcome(&outcome, false).unwrap().contains('\n'));
    }
}
