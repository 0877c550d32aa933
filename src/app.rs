//! Application lifecycle: one container, one router, an ordered provider
//! list, and the state machine that drives them.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::container::{Container, RebindPolicy};
use crate::error::{KernelError, KernelResult};
use crate::facade::LogService;
use crate::provider::ServiceProvider;
use crate::router::Router;

/// Well-known container keys installed by the application itself.
pub mod keys {
    /// The application's [`Router`](crate::Router)
    pub const ROUTER: &str = "router";
    /// The application's [`LogService`](crate::LogService)
    pub const LOG: &str = "log";
}

/// Lifecycle states, transitioning only forward.
///
/// A boot (or register) failure moves directly to the terminal `Failed`
/// state instead of `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Created,
    Registering,
    Booting,
    Running,
    ShuttingDown,
    Stopped,
    Failed,
}

/// The application: owns one [`Container`] and one [`Router`] and drives
/// register → boot → run → shutdown across its providers.
///
/// Created once per process run and shared as `Arc<Application>`. The
/// container and route table are mutated only before [`AppState::Running`];
/// afterwards they are read-only for the life of the process.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use launchkit::{Application, AppState, KernelResult, Response, ServiceProvider};
/// use serde_json::json;
///
/// struct MarketplaceProvider;
///
/// #[async_trait]
/// impl ServiceProvider for MarketplaceProvider {
///     fn name(&self) -> &'static str {
///         "marketplace"
///     }
///
///     fn register(&self, app: &Application) -> KernelResult<()> {
///         app.container().instance("marketplace.catalog", vec!["clipboard"])
///     }
///
///     async fn boot(&self, app: &Application) -> KernelResult<()> {
///         app.router().register("marketplace/list", |_req| async {
///             Ok(Response::ok(json!(["clipboard"])))
///         });
///         Ok(())
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> KernelResult<()> {
/// let app = Application::new();
/// app.add_provider(Arc::new(MarketplaceProvider))?;
/// app.bootstrap().await?;
/// assert_eq!(app.state(), AppState::Running);
///
/// let response = app.router().dispatch("marketplace/list", vec![]).await;
/// assert!(response.success);
///
/// app.shutdown().await?;
/// # Ok(())
/// # }
/// # use std::sync::Arc;
/// ```
pub struct Application {
    container: Container,
    router: Arc<Router>,
    log: Arc<LogService>,
    providers: RwLock<Vec<Arc<dyn ServiceProvider>>>,
    state: RwLock<AppState>,
}

impl Application {
    /// Creates an application with the default container rebind policy.
    pub fn new() -> Arc<Self> {
        Self::with_rebind_policy(RebindPolicy::default())
    }

    /// Creates an application whose container uses `rebind`.
    pub fn with_rebind_policy(rebind: RebindPolicy) -> Arc<Self> {
        let container = Container::with_rebind_policy(rebind);
        let router = Arc::new(Router::new());
        let log = Arc::new(LogService::default());

        // Core services are bound up front so facades can resolve them by
        // their well-known keys. `instance_arc` cannot fail on a fresh
        // container regardless of rebind policy.
        let _ = container.instance_arc(keys::ROUTER, router.clone());
        let _ = container.instance_arc(keys::LOG, log.clone());

        Arc::new(Self {
            container,
            router,
            log,
            providers: RwLock::new(Vec::new()),
            state: RwLock::new(AppState::Created),
        })
    }

    /// The application's container.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The application's router.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The application's log service.
    pub fn log(&self) -> &LogService {
        &self.log
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AppState {
        *self.state.read()
    }

    /// Adds a provider. Only legal before [`bootstrap`](Application::bootstrap);
    /// registration order is boot order and reverse shutdown order.
    pub fn add_provider(&self, provider: Arc<dyn ServiceProvider>) -> KernelResult<()> {
        let state = self.state.read();
        if *state != AppState::Created {
            return Err(KernelError::lifecycle(format!(
                "cannot add provider '{}' in state {:?}",
                provider.name(),
                *state
            )));
        }
        drop(state);
        self.providers.write().push(provider);
        Ok(())
    }

    /// Drives the startup sequence: every provider's `register` in order,
    /// then every `boot` in order, awaiting each before the next so a later
    /// provider can rely on an earlier provider's singletons.
    ///
    /// A failure in either phase aborts the remainder, moves the
    /// application to [`AppState::Failed`], and propagates; the caller is
    /// expected to terminate with a non-zero outcome.
    pub async fn bootstrap(&self) -> KernelResult<()> {
        self.transition(AppState::Created, AppState::Registering)?;
        let providers = self.providers.read().clone();

        for provider in &providers {
            tracing::debug!(provider = provider.name(), "registering");
            if let Err(err) = provider.register(self) {
                *self.state.write() = AppState::Failed;
                return Err(KernelError::ProviderBoot {
                    provider: provider.name().to_string(),
                    message: err.to_string(),
                });
            }
        }

        self.transition(AppState::Registering, AppState::Booting)?;
        for provider in &providers {
            tracing::debug!(provider = provider.name(), "booting");
            if let Err(err) = provider.boot(self).await {
                *self.state.write() = AppState::Failed;
                return Err(KernelError::ProviderBoot {
                    provider: provider.name().to_string(),
                    message: err.to_string(),
                });
            }
        }

        self.transition(AppState::Booting, AppState::Running)?;
        tracing::info!(providers = providers.len(), "application running");
        Ok(())
    }

    /// Shuts providers down in exact reverse registration order, best
    /// effort: a failure is logged and recorded but does not stop the
    /// sweep. After every provider has had its chance the application is
    /// [`AppState::Stopped`] and collected failures are surfaced as one
    /// [`KernelError::ProviderShutdown`].
    pub async fn shutdown(&self) -> KernelResult<()> {
        self.transition(AppState::Running, AppState::ShuttingDown)?;
        let providers = self.providers.read().clone();

        let mut failures = Vec::new();
        for provider in providers.iter().rev() {
            tracing::debug!(provider = provider.name(), "shutting down");
            if let Err(err) = provider.shutdown(self).await {
                tracing::error!(
                    provider = provider.name(),
                    error = %err,
                    "provider shutdown failed"
                );
                failures.push((provider.name().to_string(), err.to_string()));
            }
        }

        *self.state.write() = AppState::Stopped;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(KernelError::ProviderShutdown(failures))
        }
    }

    fn transition(&self, from: AppState, to: AppState) -> KernelResult<()> {
        let mut state = self.state.write();
        if *state != from {
            return Err(KernelError::lifecycle(format!(
                "expected state {:?}, found {:?}",
                from, *state
            )));
        }
        *state = to;
        Ok(())
    }
}
