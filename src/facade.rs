//! Facade proxies: static-style call sites re-resolved per call.
//!
//! A facade pairs an accessor key with a set of statically enumerated
//! forwarding methods. Each call resolves the accessor from the active
//! application's container at call time, so rebinding the service between
//! calls is observed immediately. Facades are primed once during
//! bootstrap; a call before priming fails with a clear "not bootstrapped"
//! error rather than a null-reference failure.

use std::marker::PhantomData;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::app::{keys, Application};
use crate::error::{KernelError, KernelResult};
use crate::message::Response;
use crate::router::Router;

/// Generic facade over a container-bound service of type `T`.
///
/// Concrete facades ([`RouterFacade`], [`LogFacade`]) wrap one of these and
/// add their forwarding methods. The constructor is `const`, so embedders
/// can declare facades as statics and prime them from `main`.
///
/// # Examples
///
/// ```rust
/// use launchkit::{Application, Facade, KernelResult};
///
/// struct ClipboardHistory {
///     limit: usize,
/// }
///
/// static CLIPBOARD: Facade<ClipboardHistory> = Facade::new("clipboard.history");
///
/// # fn main() -> KernelResult<()> {
/// let app = Application::new();
/// app.container().instance("clipboard.history", ClipboardHistory { limit: 100 })?;
///
/// CLIPBOARD.prime(app.clone())?;
/// assert_eq!(CLIPBOARD.resolve()?.limit, 100);
/// # Ok(())
/// # }
/// ```
pub struct Facade<T> {
    accessor: &'static str,
    app: OnceCell<Arc<Application>>,
    _service: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> Facade<T> {
    /// Creates an unprimed facade for `accessor`.
    pub const fn new(accessor: &'static str) -> Self {
        Self {
            accessor,
            app: OnceCell::new(),
            _service: PhantomData,
        }
    }

    /// The container key this facade resolves.
    pub fn accessor(&self) -> &'static str {
        self.accessor
    }

    /// Primes the facade with the active application. Set once during
    /// bootstrap; a second prime is a lifecycle error.
    pub fn prime(&self, app: Arc<Application>) -> KernelResult<()> {
        self.app
            .set(app)
            .map_err(|_| KernelError::lifecycle(format!("facade '{}' already primed", self.accessor)))
    }

    /// Resolves the backing service from the active application's container.
    /// Called per forwarding call, never cached in the facade.
    pub fn resolve(&self) -> KernelResult<Arc<T>> {
        let app = self
            .app
            .get()
            .ok_or(KernelError::NotBootstrapped(self.accessor))?;
        app.container().resolve_as::<T>(self.accessor)
    }
}

/// Facade over the application's [`Router`].
pub struct RouterFacade {
    inner: Facade<Router>,
}

impl RouterFacade {
    /// Creates an unprimed router facade.
    pub const fn new() -> Self {
        Self {
            inner: Facade::new(keys::ROUTER),
        }
    }

    /// Primes the facade with the active application.
    pub fn prime(&self, app: Arc<Application>) -> KernelResult<()> {
        self.inner.prime(app)
    }

    /// Forwards to [`Router::dispatch`]; an unprimed facade yields a
    /// failure response like any other dispatch-time error.
    pub async fn dispatch(&self, channel: &str, args: Vec<Value>) -> Response {
        match self.inner.resolve() {
            Ok(router) => router.dispatch(channel, args).await,
            Err(err) => Response::failure(err.to_string()),
        }
    }

    /// Forwards to [`Router::has_route`].
    pub fn has_route(&self, channel: &str) -> KernelResult<bool> {
        Ok(self.inner.resolve()?.has_route(channel))
    }
}

impl Default for RouterFacade {
    fn default() -> Self {
        Self::new()
    }
}

/// Severity passed through the logging contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// The logging back end contract: `log(level, message, context)`.
///
/// Concrete drivers (file sinks, devtools consoles) live outside the
/// kernel; [`TracingDriver`] is the in-process default.
pub trait LogDriver: Send + Sync {
    /// Persists one log line.
    fn log(&self, level: LogLevel, message: &str, context: Option<&Value>);
}

/// Default driver emitting `tracing` events.
pub struct TracingDriver;

impl LogDriver for TracingDriver {
    fn log(&self, level: LogLevel, message: &str, context: Option<&Value>) {
        let context = context.map(|c| c.to_string());
        let context = context.as_deref().unwrap_or("");
        match level {
            LogLevel::Debug => tracing::debug!(context, "{}", message),
            LogLevel::Info => tracing::info!(context, "{}", message),
            LogLevel::Warn => tracing::warn!(context, "{}", message),
            LogLevel::Error => tracing::error!(context, "{}", message),
        }
    }
}

/// Container-bound log service delegating to a [`LogDriver`].
pub struct LogService {
    driver: Arc<dyn LogDriver>,
}

impl LogService {
    /// Creates a log service around `driver`.
    pub fn new(driver: Arc<dyn LogDriver>) -> Self {
        Self { driver }
    }

    /// Logs at an explicit level with optional structured context.
    pub fn log(&self, level: LogLevel, message: &str, context: Option<&Value>) {
        self.driver.log(level, message, context);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, None);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, None);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, None);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, None);
    }
}

impl Default for LogService {
    fn default() -> Self {
        Self::new(Arc::new(TracingDriver))
    }
}

/// Facade over the application's [`LogService`].
pub struct LogFacade {
    inner: Facade<LogService>,
}

impl LogFacade {
    /// Creates an unprimed log facade.
    pub const fn new() -> Self {
        Self {
            inner: Facade::new(keys::LOG),
        }
    }

    /// Primes the facade with the active application.
    pub fn prime(&self, app: Arc<Application>) -> KernelResult<()> {
        self.inner.prime(app)
    }

    /// Forwards to [`LogService::log`].
    pub fn log(&self, level: LogLevel, message: &str, context: Option<&Value>) -> KernelResult<()> {
        self.inner.resolve()?.log(level, message, context);
        Ok(())
    }

    pub fn debug(&self, message: &str) -> KernelResult<()> {
        self.log(LogLevel::Debug, message, None)
    }

    pub fn info(&self, message: &str) -> KernelResult<()> {
        self.log(LogLevel::Info, message, None)
    }

    pub fn warn(&self, message: &str) -> KernelResult<()> {
        self.log(LogLevel::Warn, message, None)
    }

    pub fn error(&self, message: &str) -> KernelResult<()> {
        self.log(LogLevel::Error, message, None)
    }
}

impl Default for LogFacade {
    fn default() -> Self {
        Self::new()
    }
}
