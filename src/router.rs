//! Command router: channel registration, grouping, and dispatch.
//!
//! Channels are finalized at registration time (group prefixes and the
//! registrar's own prefix are joined into the stored key), so dispatch is
//! an exact-match lookup. The route table is written only while providers
//! register and boot; once the application is running it is read-only.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{KernelError, KernelResult};
use crate::message::{Request, Response};
use crate::pipeline::{handler, Handler, Middleware, Next, Pipeline};

/// A finalized channel-to-handler binding with its middleware and metadata.
#[derive(Clone)]
pub struct Route {
    /// Fully resolved channel string
    pub channel: String,
    /// Optional route name for reverse lookup
    pub name: Option<String>,
    handler: Handler,
    /// Group middleware (outer-to-inner) followed by route-specific middleware
    middleware: Vec<Arc<dyn Middleware>>,
}

struct GroupFrame {
    prefix: Option<String>,
    middleware: Vec<Arc<dyn Middleware>>,
}

/// Configuration for a registration group.
///
/// Routes registered inside the group's callback inherit the prefix
/// (path-joined with any enclosing groups) and the middleware (concatenated
/// outer-to-inner).
#[derive(Default)]
pub struct GroupConfig {
    /// Prefix joined onto channels registered inside the group
    pub prefix: Option<String>,
    /// Middleware applied to every route registered inside the group
    pub middleware: Vec<Arc<dyn Middleware>>,
}

impl GroupConfig {
    /// Group with just a prefix.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            middleware: Vec::new(),
        }
    }

    /// Adds a middleware to the group.
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }
}

/// Maps channel names to [`Route`]s and dispatches requests through the
/// middleware pipeline.
///
/// # Examples
///
/// ```rust
/// use launchkit::{GroupConfig, Response, Router};
/// use serde_json::json;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let router = Router::new();
///
/// router.group(GroupConfig::prefix("plugins"), |r| {
///     r.register("list", |_req| async {
///         Ok(Response::ok(json!(["clipboard", "calculator"])))
///     });
/// });
///
/// let response = router.dispatch("plugins/list", vec![]).await;
/// assert!(response.success);
///
/// let missing = router.dispatch("plugins/remove", vec![]).await;
/// assert!(!missing.success);
/// # }
/// ```
#[derive(Default)]
pub struct Router {
    routes: RwLock<HashMap<String, Route>>,
    groups: RwLock<Vec<GroupFrame>>,
    pipeline: Pipeline,
}

impl Router {
    /// Creates an empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware to the global pipeline, applied to every
    /// dispatch ahead of group and route middleware.
    pub fn middleware(&self, middleware: Arc<dyn Middleware>) {
        self.pipeline.push(middleware);
    }

    /// Begins registering `channel`. Fluent calls on the returned registrar
    /// (`middleware`, `prefix`, `name`) apply before the route is finalized
    /// when the registrar drops.
    pub fn register<F, Fut>(&self, channel: impl Into<String>, f: F) -> RouteRegistrar<'_>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = KernelResult<Response>> + Send + 'static,
    {
        RouteRegistrar {
            router: self,
            suffix: channel.into(),
            prefix: None,
            name: None,
            middleware: Vec::new(),
            handler: Some(handler(f)),
        }
    }

    /// Alias of [`register`](Router::register). Channels are in-process
    /// command names, so the verbs all finalize the same way.
    pub fn handle<F, Fut>(&self, channel: impl Into<String>, f: F) -> RouteRegistrar<'_>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = KernelResult<Response>> + Send + 'static,
    {
        self.register(channel, f)
    }

    /// Alias of [`register`](Router::register) for read-style commands.
    pub fn get<F, Fut>(&self, channel: impl Into<String>, f: F) -> RouteRegistrar<'_>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = KernelResult<Response>> + Send + 'static,
    {
        self.register(channel, f)
    }

    /// Alias of [`register`](Router::register) for create-style commands.
    pub fn post<F, Fut>(&self, channel: impl Into<String>, f: F) -> RouteRegistrar<'_>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = KernelResult<Response>> + Send + 'static,
    {
        self.register(channel, f)
    }

    /// Alias of [`register`](Router::register) for update-style commands.
    pub fn put<F, Fut>(&self, channel: impl Into<String>, f: F) -> RouteRegistrar<'_>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = KernelResult<Response>> + Send + 'static,
    {
        self.register(channel, f)
    }

    /// Alias of [`register`](Router::register) for delete-style commands.
    pub fn delete<F, Fut>(&self, channel: impl Into<String>, f: F) -> RouteRegistrar<'_>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = KernelResult<Response>> + Send + 'static,
    {
        self.register(channel, f)
    }

    /// Pushes a group frame, runs `f` synchronously (nested `register` and
    /// `group` calls resolve against the combined stack), and pops the frame
    /// on the way out.
    pub fn group<F: FnOnce(&Router)>(&self, config: GroupConfig, f: F) {
        self.groups.write().push(GroupFrame {
            prefix: config.prefix,
            middleware: config.middleware,
        });
        let _guard = FrameGuard(self);
        f(self);
    }

    /// Dispatches `(channel, args)` through the effective middleware chain
    /// to the route's handler.
    ///
    /// An unknown channel and any error escaping the chain both come back as
    /// failure responses; dispatch never propagates an error to its caller.
    pub async fn dispatch(&self, channel: &str, args: Vec<Value>) -> Response {
        // Snapshot under the read lock, then run with no lock held so the
        // chain can suspend freely.
        let plan = {
            let routes = self.routes.read();
            routes.get(channel).map(|route| {
                let mut chain = self.pipeline.snapshot();
                chain.extend(route.middleware.iter().cloned());
                (route.handler.clone(), chain)
            })
        };

        let Some((route_handler, chain)) = plan else {
            return Response::failure(KernelError::RouteNotFound(channel.to_string()).to_string());
        };

        let request = Request::new(channel, args);
        match Next::new(chain.into(), route_handler).run(request).await {
            Ok(response) => response,
            Err(err) => Response::failure(err.to_string()),
        }
    }

    /// True if a route is registered for exactly `channel`.
    pub fn has_route(&self, channel: &str) -> bool {
        self.routes.read().contains_key(channel)
    }

    /// Registered channels, for diagnostics.
    pub fn channels(&self) -> Vec<String> {
        self.routes.read().keys().cloned().collect()
    }

    /// Reverse lookup: the channel registered under a route name.
    pub fn channel_for(&self, name: &str) -> Option<String> {
        self.routes
            .read()
            .values()
            .find(|route| route.name.as_deref() == Some(name))
            .map(|route| route.channel.clone())
    }

    fn finalize(
        &self,
        prefix: Option<String>,
        suffix: String,
        name: Option<String>,
        route_middleware: Vec<Arc<dyn Middleware>>,
        route_handler: Handler,
    ) {
        let (channel, middleware) = {
            let groups = self.groups.read();
            let mut segments: Vec<String> =
                groups.iter().filter_map(|g| g.prefix.clone()).collect();
            if let Some(prefix) = prefix {
                segments.push(prefix);
            }
            segments.push(suffix);

            let mut middleware: Vec<Arc<dyn Middleware>> = groups
                .iter()
                .flat_map(|g| g.middleware.iter().cloned())
                .collect();
            middleware.extend(route_middleware);

            (join_channel(&segments), middleware)
        };

        let route = Route {
            channel: channel.clone(),
            name,
            handler: route_handler,
            middleware,
        };

        let mut routes = self.routes.write();
        if routes.contains_key(&channel) {
            tracing::warn!(channel = %channel, "re-registering channel, last write wins");
        }
        routes.insert(channel, route);
    }
}

struct FrameGuard<'r>(&'r Router);

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.0.groups.write().pop();
    }
}

/// Fluent registrar returned by [`Router::register`].
///
/// Accumulates prefix, name, and middleware; the route is finalized (its
/// channel computed against the active group stack and inserted into the
/// table) when the registrar goes out of scope.
pub struct RouteRegistrar<'r> {
    router: &'r Router,
    suffix: String,
    prefix: Option<String>,
    name: Option<String>,
    middleware: Vec<Arc<dyn Middleware>>,
    handler: Option<Handler>,
}

impl RouteRegistrar<'_> {
    /// Appends a route-specific middleware, innermost in the chain.
    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Prefixes the channel, inside any group prefixes.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Names the route for reverse lookup via [`Router::channel_for`].
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Drop for RouteRegistrar<'_> {
    fn drop(&mut self) {
        if let Some(route_handler) = self.handler.take() {
            self.router.finalize(
                self.prefix.take(),
                std::mem::take(&mut self.suffix),
                self.name.take(),
                std::mem::take(&mut self.middleware),
                route_handler,
            );
        }
    }
}

fn join_channel(segments: &[String]) -> String {
    let parts: Vec<&str> = segments
        .iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect();
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_channel_trims_separators() {
        let segments = vec![
            "plugins/".to_string(),
            "/store".to_string(),
            "list".to_string(),
        ];
        assert_eq!(join_channel(&segments), "plugins/store/list");
    }

    #[test]
    fn test_join_channel_skips_empty_segments() {
        let segments = vec!["".to_string(), "list".to_string()];
        assert_eq!(join_channel(&segments), "list");
    }
}
