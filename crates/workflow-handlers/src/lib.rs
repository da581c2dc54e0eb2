// workflow-handlers: Built-in action handlers and the registry that builds
// handlers from a type identifier and configuration.

pub mod exception_throwing;
pub mod registry;

// Re-exports for convenient access
pub use exception_throwing::ExceptionThrowingActionHandler;
pub use registry::{HandlerConstructor, HandlerRegistry, RegistryError};
