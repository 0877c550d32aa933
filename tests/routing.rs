use async_trait::async_trait;
use launchkit::{
    GroupConfig, KernelResult, Middleware, Next, Request, Response, Router,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

fn ok_handler(_req: Request) -> impl std::future::Future<Output = KernelResult<Response>> {
    async { Ok(Response::ok(json!("ok"))) }
}

#[tokio::test]
async fn test_dispatch_exact_match() {
    let router = Router::new();
    router.register("ping", |_req| async { Ok(Response::ok(json!("pong"))) });

    let response = router.dispatch("ping", vec![]).await;
    assert!(response.success);
    assert_eq!(response.data, Some(json!("pong")));
}

#[tokio::test]
async fn test_dispatch_unknown_channel_is_not_found_response() {
    let router = Router::new();
    let response = router.dispatch("nonexistent", vec![]).await;

    assert!(!response.success);
    let error = response.error.unwrap();
    assert!(error.contains("not found"), "got: {}", error);
}

#[tokio::test]
async fn test_group_prefix_composes_channel() {
    let router = Router::new();
    router.group(GroupConfig::prefix("plugins"), |r| {
        r.register("list", ok_handler);
    });
    router.register("list", ok_handler);

    assert!(router.has_route("plugins/list"));
    assert!(router.has_route("list"));
    assert!(router.dispatch("plugins/list", vec![]).await.success);
    assert!(router.dispatch("list", vec![]).await.success);
}

#[tokio::test]
async fn test_nested_groups_path_join() {
    let router = Router::new();
    router.group(GroupConfig::prefix("marketplace"), |r| {
        r.group(GroupConfig::prefix("extensions"), |r| {
            r.register("install", ok_handler);
        });
        r.register("search", ok_handler);
    });

    assert!(router.has_route("marketplace/extensions/install"));
    assert!(router.has_route("marketplace/search"));
    // Frames popped: registrations after the group are unprefixed.
    router.register("about", ok_handler);
    assert!(router.has_route("about"));
}

#[tokio::test]
async fn test_registrar_prefix_applies_inside_group_prefixes() {
    let router = Router::new();
    router.group(GroupConfig::prefix("ai"), |r| {
        r.register("send", ok_handler).prefix("chat");
    });
    assert!(router.has_route("ai/chat/send"));
}

#[tokio::test]
async fn test_route_name_reverse_lookup() {
    let router = Router::new();
    router
        .register("windows/focus", ok_handler)
        .name("focus-window");

    assert_eq!(
        router.channel_for("focus-window").as_deref(),
        Some("windows/focus")
    );
    assert_eq!(router.channel_for("unknown"), None);
}

#[tokio::test]
async fn test_verb_aliases_register_channels() {
    let router = Router::new();
    router.get("settings/read", ok_handler);
    router.post("settings/write", ok_handler);
    router.put("settings/replace", ok_handler);
    router.delete("settings/clear", ok_handler);
    router.handle("settings/sync", ok_handler);

    for channel in [
        "settings/read",
        "settings/write",
        "settings/replace",
        "settings/clear",
        "settings/sync",
    ] {
        assert!(router.has_route(channel), "missing {}", channel);
    }
}

/// Tags responses so middleware ordering is observable.
struct TagMiddleware {
    tag: &'static str,
    seen: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl Middleware for TagMiddleware {
    async fn handle(&self, request: Request, next: Next) -> KernelResult<Response> {
        self.seen.lock().unwrap().push(self.tag);
        next.run(request).await
    }
}

#[tokio::test]
async fn test_middleware_order_global_then_group_then_route() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let tag = |tag| {
        Arc::new(TagMiddleware {
            tag,
            seen: seen.clone(),
        })
    };

    let router = Router::new();
    router.middleware(tag("global"));
    router.group(
        GroupConfig::prefix("outer").middleware(tag("outer-group")),
        |r| {
            r.group(GroupConfig::prefix("inner").middleware(tag("inner-group")), |r| {
                r.register("go", ok_handler).middleware(tag("route"));
            });
        },
    );

    let response = router.dispatch("outer/inner/go", vec![]).await;
    assert!(response.success);
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["global", "outer-group", "inner-group", "route"]
    );
}

#[tokio::test]
async fn test_reregistering_channel_last_write_wins() {
    let router = Router::new();
    router.register("version", |_req| async { Ok(Response::ok(json!(1))) });
    router.register("version", |_req| async { Ok(Response::ok(json!(2))) });

    let response = router.dispatch("version", vec![]).await;
    assert_eq!(response.data, Some(json!(2)));
}

#[tokio::test]
async fn test_handler_receives_channel_and_args() {
    let router = Router::new();
    router.register("echo", |req: Request| async move {
        Ok(Response::ok(json!({
            "channel": req.channel,
            "args": req.args,
        })))
    });

    let response = router.dispatch("echo", vec![json!(1), json!("two")]).await;
    assert_eq!(
        response.data,
        Some(json!({"channel": "echo", "args": [1, "two"]}))
    );
}
