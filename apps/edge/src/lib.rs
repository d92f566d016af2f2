//! Parley edge server.
//!
//! Host-based tenant routing runs in front of the axum router, so route
//! matching always sees the rewritten `/{slug}/...` path.

use axum::{
    Json, Router,
    extract::{Path, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, future::Future};
use tenant::TenantRouter;
use tokio::net::TcpListener;
use tower::{Service, ServiceBuilder};
use types::Tenant;

/// Body of a tenant page response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantPage {
    /// Resolved tenant slug.
    pub tenant: CompactString,
    /// Deployment environment, if any.
    pub environment: Option<CompactString>,
    /// The page below the tenant root.
    pub page: String,
}

/// Logical routes, as seen after the rewrite.
pub fn app() -> Router {
    Router::new()
        .route("/api/health", get(|| async { "ok" }))
        .route("/{slug}/chat", get(chat))
        .route("/{slug}/{*rest}", get(page))
}

/// The logical routes behind the tenant rewrite.
pub fn service(
    router: TenantRouter,
) -> impl Service<Request, Response = Response, Error = Infallible, Future: Send> + Clone + Send + 'static
{
    ServiceBuilder::new()
        .map_request(move |req: Request| router.rewrite(req))
        .service(app())
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    router: TenantRouter,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let service = axum::ServiceExt::<Request>::into_make_service(service(router));
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn chat(Path(slug): Path<String>, req: Request) -> Response {
    respond(&slug, "chat", &req)
}

async fn page(Path((slug, rest)): Path<(String, String)>, req: Request) -> Response {
    respond(&slug, &rest, &req)
}

fn respond(slug: &str, page: &str, req: &Request) -> Response {
    match req.extensions().get::<Tenant>() {
        Some(tenant) if tenant.slug == slug => Json(TenantPage {
            tenant: tenant.slug.clone(),
            environment: tenant.environment.clone(),
            page: page.to_owned(),
        })
        .into_response(),
        _ => (StatusCode::NOT_FOUND, "unknown tenant").into_response(),
    }
}
