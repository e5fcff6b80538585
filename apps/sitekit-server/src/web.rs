//! HTTP host: mounts the composed route table on an axum router.
//!
//! Page rendering is not part of the server; every route answers with a JSON
//! placeholder naming the module and endpoint that owns it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::Path;
use axum::routing::{MethodFilter, MethodRouter, get};
use axum::{Json, Router};
use http::Method;
use modkit::{PublishedApp, RouteDefinition};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

pub const DEBUG_PATH: &str = "/debug";

fn placeholder(route: &RouteDefinition, params: HashMap<String, String>) -> Value {
    json!({
        "module": route.module(),
        "endpoint": route.endpoint(),
        "handler": route.handler_id(),
        "params": params,
    })
}

fn method_router(routes: &[&RouteDefinition]) -> anyhow::Result<MethodRouter> {
    let mut router = MethodRouter::new();
    for &route in routes {
        for method in route.methods() {
            let filter = MethodFilter::try_from(method.clone())
                .map_err(|e| anyhow::anyhow!("cannot route method {method}: {e}"))?;
            let def = route.clone();
            router = if route.pattern().has_params() {
                router.on(
                    filter,
                    move |Path(params): Path<HashMap<String, String>>| async move {
                        Json(placeholder(&def, params))
                    },
                )
            } else {
                router.on(filter, move || async move {
                    Json(placeholder(&def, HashMap::new()))
                })
            };
        }
    }
    Ok(router)
}

/// Build the router for the currently published application.
///
/// `GET /debug` serves the inspection document unless a module owns that route.
///
/// # Errors
/// Returns an error if a route uses a method axum cannot dispatch.
pub fn build_router(published: &Arc<PublishedApp>) -> anyhow::Result<Router> {
    let app = published.load();
    let mut router = Router::new();

    for (pattern, routes) in app.routes().by_path() {
        let path = pattern.canonical();
        tracing::debug!(path = %path, routes = routes.len(), "Mounting path");
        router = router.route(&path, method_router(&routes)?);
    }

    if app.routes().find(&Method::GET, DEBUG_PATH).is_none() {
        let published = Arc::clone(published);
        router = router.route(
            DEBUG_PATH,
            get(move || async move { Json(published.load().inspect()) }),
        );
    } else {
        tracing::info!("A module owns {DEBUG_PATH}; inspection endpoint not mounted");
    }

    Ok(router.layer(TraceLayer::new_for_http()))
}

fn parse_bind_address(bind_addr: &str) -> anyhow::Result<SocketAddr> {
    bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{bind_addr}': {e}"))
}

/// Bind, then serve until Ctrl-C or SIGTERM.
///
/// # Errors
/// Returns an error if the address is invalid, binding fails or the server stops abnormally.
pub async fn serve(published: Arc<PublishedApp>, bind_addr: &str) -> anyhow::Result<()> {
    let addr = parse_bind_address(bind_addr)?;
    let router = build_router(&published)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server bound on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(crate::signals::shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!(e))
}
