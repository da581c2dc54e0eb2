// HandlerRegistry: builds action handlers from a type identifier and a
// configuration payload.

use crate::exception_throwing::ExceptionThrowingActionHandler;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;
use tracing::debug;
use workflow_sdk::{ActionHandler, ActionStep, ConfigError, HandlerConfig, HandlerDescriptor};

/// Constructor for one handler type. Validation of the configuration happens
/// here, not in `HandlerConfig`.
pub type HandlerConstructor = fn(HandlerConfig) -> Result<Box<dyn ActionHandler>, ConfigError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown handler type: {0}")]
    UnknownHandlerType(String),

    #[error("Invalid configuration for handler '{handler_type}'")]
    InvalidConfig {
        handler_type: String,
        #[source]
        source: ConfigError,
    },
}

/// Maps handler type identifiers to constructors.
///
/// Lookups are case-insensitive, and a qualifier after a comma is ignored,
/// so `"ExceptionThrowingActionHandler, handlers"` resolves like
/// `"ExceptionThrowingActionHandler"`.
#[derive(Default)]
pub struct HandlerRegistry {
    // normalized name -> (primary type id, constructor)
    constructors: HashMap<String, (&'static str, HandlerConstructor)>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handler_types", &self.handler_types())
            .finish()
    }
}

fn build_exception_throwing(config: HandlerConfig) -> Result<Box<dyn ActionHandler>, ConfigError> {
    Ok(Box::new(ExceptionThrowingActionHandler::new(config)))
}

fn normalize(type_name: &str) -> String {
    type_name
        .split(',')
        .next()
        .unwrap_or(type_name)
        .trim()
        .to_ascii_lowercase()
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every handler this crate ships.
    pub fn with_builtin_handlers() -> Self {
        let mut registry = Self::new();
        registry.register(
            ExceptionThrowingActionHandler::HANDLER_TYPE,
            &["ExceptionThrowingActionHandler"],
            build_exception_throwing,
        );
        registry
    }

    /// Register a constructor under a primary type id and optional aliases.
    /// A later registration for the same name replaces the earlier one.
    pub fn register(
        &mut self,
        handler_type: &'static str,
        aliases: &[&str],
        constructor: HandlerConstructor,
    ) {
        for name in std::iter::once(handler_type).chain(aliases.iter().copied()) {
            self.constructors
                .insert(normalize(name), (handler_type, constructor));
        }
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.contains_key(&normalize(type_name))
    }

    /// The primary type ids, sorted.
    pub fn handler_types(&self) -> Vec<&'static str> {
        self.constructors
            .values()
            .map(|(primary, _)| *primary)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Build a handler of the given type.
    pub fn create(
        &self,
        type_name: &str,
        config: HandlerConfig,
    ) -> Result<Box<dyn ActionHandler>, RegistryError> {
        let (primary, constructor) = self
            .constructors
            .get(&normalize(type_name))
            .ok_or_else(|| RegistryError::UnknownHandlerType(type_name.to_string()))?;

        debug!(requested = %type_name, handler_type = %primary, "Creating action handler");

        constructor(config).map_err(|source| RegistryError::InvalidConfig {
            handler_type: primary.to_string(),
            source,
        })
    }

    /// Rebuild a handler from its serialized identity.
    pub fn create_from_descriptor(
        &self,
        descriptor: &HandlerDescriptor,
    ) -> Result<Box<dyn ActionHandler>, RegistryError> {
        self.create(&descriptor.handler_type, descriptor.config.clone())
    }

    /// Build a ready-to-run step from a descriptor.
    pub fn create_step(&self, descriptor: &HandlerDescriptor) -> Result<ActionStep, RegistryError> {
        self.create_from_descriptor(descriptor)
            .map(ActionStep::from_boxed)
    }
}
