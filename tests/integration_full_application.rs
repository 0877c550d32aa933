//! End-to-end wiring of a launcher-shaped application: multiple providers
//! installing bindings and routes, global and scoped middleware, validation,
//! and facades, driven through the full lifecycle.

use async_trait::async_trait;
use launchkit::{
    AppState, Application, ArgType, ErrorHandlingMiddleware, GroupConfig, KernelError,
    KernelResult, LoggingMiddleware, Response, RouterFacade, Rule, RuleSet, ServiceProvider,
    ValidationMiddleware,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

/// In-memory stand-in for the plugin registry a real launcher would manage.
struct PluginRegistry {
    installed: Mutex<Vec<String>>,
}

impl PluginRegistry {
    fn new() -> Self {
        Self {
            installed: Mutex::new(vec!["clipboard".to_string()]),
        }
    }

    fn list(&self) -> Vec<String> {
        self.installed.lock().unwrap().clone()
    }

    fn install(&self, name: &str) -> Result<(), String> {
        let mut installed = self.installed.lock().unwrap();
        if installed.iter().any(|p| p == name) {
            return Err(format!("plugin '{}' already installed", name));
        }
        installed.push(name.to_string());
        Ok(())
    }
}

struct CoreProvider;

#[async_trait]
impl ServiceProvider for CoreProvider {
    fn name(&self) -> &'static str {
        "core"
    }

    fn register(&self, _app: &Application) -> KernelResult<()> {
        Ok(())
    }

    async fn boot(&self, app: &Application) -> KernelResult<()> {
        // Outermost first: errors from any later middleware or handler are
        // normalized before they reach the transport.
        app.router().middleware(Arc::new(ErrorHandlingMiddleware));
        app.router().middleware(Arc::new(LoggingMiddleware));
        Ok(())
    }
}

struct PluginProvider;

#[async_trait]
impl ServiceProvider for PluginProvider {
    fn name(&self) -> &'static str {
        "plugins"
    }

    fn register(&self, app: &Application) -> KernelResult<()> {
        app.container()
            .bind_singleton("plugin.registry", |_| Ok(PluginRegistry::new()))?;
        app.container().alias("plugins", "plugin.registry")
    }

    async fn boot(&self, app: &Application) -> KernelResult<()> {
        let registry = app.container().resolve_as::<PluginRegistry>("plugins")?;

        let list_registry = registry.clone();
        let install_registry = registry;

        app.router().group(GroupConfig::prefix("plugins"), |r| {
            r.register("list", move |_req| {
                let registry = list_registry.clone();
                async move { Ok(Response::ok(json!(registry.list()))) }
            });

            r.register("install", move |req| {
                let registry = install_registry.clone();
                async move {
                    let name = req.args[0].as_str().unwrap_or_default();
                    registry
                        .install(name)
                        .map_err(KernelError::handler)?;
                    Ok(Response::ok(json!({ "installed": name })))
                }
            })
            .middleware(Arc::new(ValidationMiddleware::new(
                RuleSet::new().rule(0, Rule::new().required().of_type(ArgType::String)),
            )))
            .name("install-plugin");
        });

        Ok(())
    }

    fn provides(&self) -> &[&'static str] {
        &["plugin.registry"]
    }
}

#[tokio::test]
async fn test_full_application_flow() {
    let app = Application::new();
    app.add_provider(Arc::new(CoreProvider)).unwrap();
    app.add_provider(Arc::new(PluginProvider)).unwrap();
    app.bootstrap().await.unwrap();
    assert_eq!(app.state(), AppState::Running);

    let router_facade = RouterFacade::new();
    router_facade.prime(app.clone()).unwrap();

    // List through the facade.
    let listed = router_facade.dispatch("plugins/list", vec![]).await;
    assert_eq!(listed.data, Some(json!(["clipboard"])));

    // Install with a valid argument.
    let installed = router_facade
        .dispatch("plugins/install", vec![json!("calculator")])
        .await;
    assert!(installed.success);

    // Singleton registry: the earlier install is visible.
    let listed = router_facade.dispatch("plugins/list", vec![]).await;
    assert_eq!(listed.data, Some(json!(["clipboard", "calculator"])));

    // Validation failure: handler untouched, structured failure returned.
    let rejected = router_facade.dispatch("plugins/install", vec![]).await;
    assert!(!rejected.success);
    assert!(rejected.error.unwrap().contains("required"));

    // Handler failure: normalized, never crosses the dispatch boundary.
    let duplicate = router_facade
        .dispatch("plugins/install", vec![json!("calculator")])
        .await;
    assert!(!duplicate.success);
    assert_eq!(
        duplicate.error.as_deref(),
        Some("plugin 'calculator' already installed")
    );

    // Reverse lookup of the named route.
    assert_eq!(
        app.router().channel_for("install-plugin").as_deref(),
        Some("plugins/install")
    );

    app.shutdown().await.unwrap();
    assert_eq!(app.state(), AppState::Stopped);
}
