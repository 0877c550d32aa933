//! Middleware pipeline wrapping route handlers.
//!
//! A middleware receives the request and a [`Next`] continuation over the
//! remainder of the chain. Calling `next.run(request).await` invokes the
//! rest of the chain; returning without calling it short-circuits. `Next`
//! is consumed by value, so a middleware cannot run the downstream chain
//! twice.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::KernelResult;
use crate::message::{Request, Response};
use crate::validate::RuleSet;

/// Boxed future returned by route handlers.
pub type HandlerFuture = Pin<Box<dyn Future<Output = KernelResult<Response>> + Send>>;

/// Type-erased route handler, the terminal step of every pipeline.
pub type Handler = Arc<dyn Fn(Request) -> HandlerFuture + Send + Sync>;

/// Wraps an async closure into a type-erased [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = KernelResult<Response>> + Send + 'static,
{
    Arc::new(move |request| Box::pin(f(request)))
}

/// A request interceptor in the dispatch chain.
///
/// Implementations either call `next.run(request).await` exactly once
/// (optionally post-processing its result) or return their own response
/// without calling it, short-circuiting everything downstream including
/// the handler.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Processes the request, with `next` standing for the rest of the chain.
    async fn handle(&self, request: Request, next: Next) -> KernelResult<Response>;
}

/// Continuation over the remaining middleware chain plus the terminal handler.
pub struct Next {
    chain: Arc<[Arc<dyn Middleware>]>,
    index: usize,
    handler: Handler,
}

impl Next {
    /// Builds the continuation for a full chain.
    pub fn new(chain: Arc<[Arc<dyn Middleware>]>, handler: Handler) -> Self {
        Self {
            chain,
            index: 0,
            handler,
        }
    }

    /// Runs the remainder of the chain and returns its eventual response.
    pub async fn run(mut self, request: Request) -> KernelResult<Response> {
        if self.index < self.chain.len() {
            let middleware = self.chain[self.index].clone();
            self.index += 1;
            middleware.handle(request, self).await
        } else {
            (self.handler)(request).await
        }
    }
}

/// Ordered list of global middleware applied to every dispatch.
///
/// Routes contribute their own (group + route) middleware after these, so
/// the effective order is pipeline, then group outer-to-inner, then route,
/// then the handler.
#[derive(Default)]
pub struct Pipeline {
    middleware: RwLock<Vec<Arc<dyn Middleware>>>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware to the global chain.
    pub fn push(&self, middleware: Arc<dyn Middleware>) {
        self.middleware.write().push(middleware);
    }

    /// Snapshot of the current global chain, in installation order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Middleware>> {
        self.middleware.read().clone()
    }

    /// Executes `chain` around `handler` for `request`.
    pub async fn execute(
        chain: Vec<Arc<dyn Middleware>>,
        handler: Handler,
        request: Request,
    ) -> KernelResult<Response> {
        Next::new(chain.into(), handler).run(request).await
    }
}

/// Converts downstream errors into failure responses.
///
/// Placed outermost by convention so no handler or middleware error ever
/// crosses the dispatch boundary as anything but `{success: false, error}`.
pub struct ErrorHandlingMiddleware;

#[async_trait]
impl Middleware for ErrorHandlingMiddleware {
    async fn handle(&self, request: Request, next: Next) -> KernelResult<Response> {
        match next.run(request).await {
            Ok(response) => Ok(response),
            Err(err) => Ok(Response::failure(err.to_string())),
        }
    }
}

/// Logs each dispatch with its elapsed time and outcome.
///
/// Errors are logged and returned unchanged so an outer
/// [`ErrorHandlingMiddleware`] still sees and normalizes them.
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    async fn handle(&self, request: Request, next: Next) -> KernelResult<Response> {
        let channel = request.channel.clone();
        let argc = request.args.len();
        let started = Instant::now();
        tracing::debug!(channel = %channel, argc, "dispatching");

        match next.run(request).await {
            Ok(response) => {
                tracing::debug!(
                    channel = %channel,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    success = response.success,
                    "dispatch complete"
                );
                Ok(response)
            }
            Err(err) => {
                tracing::warn!(
                    channel = %channel,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %err,
                    "dispatch failed"
                );
                Err(err)
            }
        }
    }
}

/// Validates request arguments against a [`RuleSet`] before the handler runs.
///
/// The first failing rule short-circuits with a failure response; the
/// handler is never invoked.
pub struct ValidationMiddleware {
    rules: RuleSet,
}

impl ValidationMiddleware {
    /// Creates the middleware around a rule set.
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }
}

#[async_trait]
impl Middleware for ValidationMiddleware {
    async fn handle(&self, request: Request, next: Next) -> KernelResult<Response> {
        if let Err(err) = self.rules.check(&request.args) {
            return Ok(Response::failure(err.to_string()));
        }
        next.run(request).await
    }
}

/// Races the rest of the chain against a timer.
///
/// The kernel builds no cancellation into the container or router; a caller
/// wanting a timeout installs this as outer middleware and gets a failure
/// response when the deadline passes.
pub struct TimeoutMiddleware {
    timeout: Duration,
}

impl TimeoutMiddleware {
    /// Creates the middleware with the given deadline per dispatch.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Middleware for TimeoutMiddleware {
    async fn handle(&self, request: Request, next: Next) -> KernelResult<Response> {
        let channel = request.channel.clone();
        match tokio::time::timeout(self.timeout, next.run(request)).await {
            Ok(result) => result,
            Err(_) => Ok(Response::failure(format!(
                "command '{}' timed out after {}ms",
                channel,
                self.timeout.as_millis()
            ))),
        }
    }
}
