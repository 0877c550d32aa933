//! Service provider contract consumed by the application lifecycle.

use async_trait::async_trait;

use crate::app::Application;
use crate::error::KernelResult;

/// A unit of registration, boot, and shutdown logic contributed by a
/// feature module (plugins, AI chat, marketplace, shortcuts, windows).
///
/// Providers are structural: any type implementing this trait can be handed
/// to [`Application::add_provider`](crate::Application::add_provider); there
/// is no base type to inherit from. They hold no container state of their
/// own except through the bindings they install.
///
/// The application drives the phases strictly in registration order:
/// every `register` runs synchronously before any `boot`, and `shutdown`
/// runs in exact reverse order.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use launchkit::{Application, KernelResult, Response, ServiceProvider};
/// use serde_json::json;
///
/// struct ShortcutRegistry;
///
/// struct ShortcutProvider;
///
/// #[async_trait]
/// impl ServiceProvider for ShortcutProvider {
///     fn name(&self) -> &'static str {
///         "shortcuts"
///     }
///
///     fn register(&self, app: &Application) -> KernelResult<()> {
///         app.container().instance("shortcut.registry", ShortcutRegistry)
///     }
///
///     async fn boot(&self, app: &Application) -> KernelResult<()> {
///         app.router().register("shortcuts/list", |_req| async {
///             Ok(Response::ok(json!([])))
///         });
///         Ok(())
///     }
///
///     fn provides(&self) -> &[&'static str] {
///         &["shortcut.registry"]
///     }
/// }
/// ```
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    /// Stable provider name used in boot/shutdown diagnostics.
    fn name(&self) -> &'static str;

    /// Installs container bindings. Runs synchronously during the
    /// `Registering` phase and must not perform I/O.
    fn register(&self, app: &Application) -> KernelResult<()>;

    /// Initializes the provider after every provider has registered.
    /// Earlier providers' singletons are already booted; a failure here is
    /// fatal to startup.
    async fn boot(&self, app: &Application) -> KernelResult<()> {
        let _ = app;
        Ok(())
    }

    /// Releases resources during shutdown. Failures are collected and
    /// reported after the sweep; they do not stop later (earlier-registered)
    /// providers from shutting down.
    async fn shutdown(&self, app: &Application) -> KernelResult<()> {
        let _ = app;
        Ok(())
    }

    /// Container keys this provider declares, informational only.
    fn provides(&self) -> &[&'static str] {
        &[]
    }
}
