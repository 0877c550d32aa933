//! # launchkit
//!
//! In-process application kernel for a desktop launcher: a string-keyed
//! service container, a provider-driven application lifecycle, and a
//! command router with a composable, short-circuiting middleware pipeline.
//!
//! Feature modules (plugins, AI chat, marketplace, keyboard shortcuts,
//! window management) are external consumers: each contributes a
//! [`ServiceProvider`] that installs bindings and routes, and the kernel
//! sequences startup, resolves dependencies, and dispatches commands.
//!
//! ## Features
//!
//! - **Container**: singleton and transient factories, pre-resolved
//!   instances, alias chains with cycle detection
//! - **Lifecycle**: deterministic register → boot → run → shutdown across
//!   independent providers, reverse-order best-effort teardown
//! - **Router**: exact-match channels finalized at registration time,
//!   nested groups composing prefixes and middleware
//! - **Pipeline**: continuation-passing middleware with type-enforced
//!   "call next at most once", plus error-normalizing, logging,
//!   validation, and timeout middleware
//! - **Facades**: call sites that re-resolve their backing service from
//!   the active application on every call
//!
//! ## Quick Start
//!
//! ```rust
//! use async_trait::async_trait;
//! use launchkit::{
//!     Application, ArgType, KernelResult, Response, Rule, RuleSet,
//!     ServiceProvider, ValidationMiddleware,
//! };
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct PluginProvider;
//!
//! #[async_trait]
//! impl ServiceProvider for PluginProvider {
//!     fn name(&self) -> &'static str {
//!         "plugins"
//!     }
//!
//!     fn register(&self, app: &Application) -> KernelResult<()> {
//!         app.container()
//!             .instance("plugin.names", vec!["clipboard".to_string()])
//!     }
//!
//!     async fn boot(&self, app: &Application) -> KernelResult<()> {
//!         let container = app.container();
//!         let names = container.resolve_as::<Vec<String>>("plugin.names")?;
//!         app.router()
//!             .register("plugins/enable", move |req| {
//!                 let names = names.clone();
//!                 async move {
//!                     let wanted = req.args[0].as_str().unwrap_or_default();
//!                     if names.iter().any(|n| n == wanted) {
//!                         Ok(Response::ok(json!({ "enabled": wanted })))
//!                     } else {
//!                         Err(launchkit::KernelError::handler("unknown plugin"))
//!                     }
//!                 }
//!             })
//!             .middleware(Arc::new(ValidationMiddleware::new(
//!                 RuleSet::new().rule(0, Rule::new().required().of_type(ArgType::String)),
//!             )));
//!         Ok(())
//!     }
//!
//!     fn provides(&self) -> &[&'static str] {
//!         &["plugin.names"]
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> KernelResult<()> {
//!     let app = Application::new();
//!     app.add_provider(Arc::new(PluginProvider))?;
//!     app.bootstrap().await?;
//!
//!     let ok = app.router().dispatch("plugins/enable", vec![json!("clipboard")]).await;
//!     assert!(ok.success);
//!
//!     let rejected = app.router().dispatch("plugins/enable", vec![]).await;
//!     assert!(!rejected.success); // validation short-circuited the handler
//!
//!     app.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! Everything runs under cooperative async scheduling. Container and route
//! table writes happen only before the application reaches `Running`;
//! dispatch-time reads take no lock across an await point. The kernel adds
//! no implicit locking around handler state and no built-in cancellation;
//! timeouts are an outer [`TimeoutMiddleware`].

// Module declarations
pub mod app;
pub mod container;
pub mod error;
pub mod facade;
pub mod message;
pub mod pipeline;
pub mod provider;
pub mod router;
pub mod validate;

// Re-export core types
pub use app::{keys, AppState, Application};
pub use container::{Container, Factory, RebindPolicy, Service};
pub use error::{KernelError, KernelResult};
pub use facade::{Facade, LogDriver, LogFacade, LogLevel, LogService, RouterFacade, TracingDriver};
pub use message::{Request, Response};
pub use pipeline::{
    handler, ErrorHandlingMiddleware, Handler, HandlerFuture, LoggingMiddleware, Middleware, Next,
    Pipeline, TimeoutMiddleware, ValidationMiddleware,
};
pub use provider::ServiceProvider;
pub use router::{GroupConfig, Route, RouteRegistrar, Router};
pub use validate::{ArgType, Rule, RuleSet};
