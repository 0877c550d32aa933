//! Error types for the application kernel.

use std::fmt;

/// Kernel errors
///
/// Represents the error conditions that can occur during container
/// resolution, route dispatch, validation, and the provider lifecycle.
///
/// Dispatch-time errors are normalized into failure [`Response`](crate::Response)
/// values at the router boundary; a failing command never crashes the
/// process. [`ProviderBoot`](KernelError::ProviderBoot) is the exception:
/// it is fatal to startup and propagates to the bootstrap caller.
///
/// # Examples
///
/// ```rust
/// use launchkit::{Container, KernelError};
///
/// let container = Container::new();
/// match container.resolve("missing") {
///     Err(KernelError::BindingNotFound(key)) => {
///         assert_eq!(key, "missing");
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    /// No binding registered for the key (after alias resolution)
    BindingNotFound(String),
    /// Alias chain revisited a name or exceeded the hop bound (includes path)
    AliasCycle(Vec<String>),
    /// Factories resolved each other in a cycle (includes path)
    Circular(Vec<String>),
    /// Resolved service could not be downcast to the requested type
    TypeMismatch(&'static str),
    /// Key already bound and the container rejects rebinding
    AlreadyBound(String),
    /// Dispatch to a channel with no registered route
    RouteNotFound(String),
    /// An argument failed a validation rule
    Validation {
        /// Index of the failing argument
        index: usize,
        /// Human-readable reason
        reason: String,
    },
    /// A handler reported a failure; displays as the bare message so the
    /// normalized response carries exactly what the handler said
    Handler(String),
    /// A provider's boot failed; fatal to startup
    ProviderBoot {
        /// Name of the failing provider
        provider: String,
        /// The underlying failure
        message: String,
    },
    /// One or more providers failed to shut down (best-effort sweep completed)
    ProviderShutdown(Vec<(String, String)>),
    /// A facade was used before being primed with the active application
    NotBootstrapped(&'static str),
    /// An operation was attempted in the wrong lifecycle state
    Lifecycle(String),
}

impl KernelError {
    /// Convenience constructor for handler failures.
    pub fn handler(message: impl Into<String>) -> Self {
        KernelError::Handler(message.into())
    }

    /// Convenience constructor for lifecycle violations.
    pub fn lifecycle(message: impl Into<String>) -> Self {
        KernelError::Lifecycle(message.into())
    }
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::BindingNotFound(key) => write!(f, "Binding not found: {}", key),
            KernelError::AliasCycle(path) => {
                write!(f, "Alias cycle: {}", path.join(" -> "))
            }
            KernelError::Circular(path) => {
                write!(f, "Circular resolution: {}", path.join(" -> "))
            }
            KernelError::TypeMismatch(name) => write!(f, "Type mismatch for: {}", name),
            KernelError::AlreadyBound(key) => write!(f, "Key already bound: {}", key),
            KernelError::RouteNotFound(channel) => write!(f, "Route not found: {}", channel),
            KernelError::Validation { index, reason } => {
                write!(f, "Invalid argument {}: {}", index, reason)
            }
            KernelError::Handler(message) => write!(f, "{}", message),
            KernelError::ProviderBoot { provider, message } => {
                write!(f, "Provider '{}' failed to boot: {}", provider, message)
            }
            KernelError::ProviderShutdown(failures) => {
                write!(f, "Shutdown failures: ")?;
                for (i, (provider, message)) in failures.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "'{}': {}", provider, message)?;
                }
                Ok(())
            }
            KernelError::NotBootstrapped(accessor) => {
                write!(f, "Facade '{}' used before bootstrap", accessor)
            }
            KernelError::Lifecycle(message) => write!(f, "Lifecycle error: {}", message),
        }
    }
}

impl std::error::Error for KernelError {}

/// Result type for kernel operations
///
/// A convenience alias for `Result<T, KernelError>` used throughout
/// launchkit, following the crate-specific Result pattern.
pub type KernelResult<T> = Result<T, KernelError>;
