//! Request-level tenant routing.
//!
//! [`TenantRouter::rewrite`] is a plain `Request -> Request` function so it
//! can sit in front of any router (e.g. `tower::ServiceBuilder::map_request`)
//! and run before route matching.

use crate::{EdgeConfig, resolve, rewrite_path};
use http::{Request, Uri, header, uri::PathAndQuery};
use std::sync::Arc;
use types::Tenant;

/// Outcome of routing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    /// The resolved tenant.
    pub tenant: Tenant,
    /// The rewritten logical path.
    pub path: String,
}

/// Resolves tenants from host names and rewrites request paths.
#[derive(Debug, Clone)]
pub struct TenantRouter {
    config: Arc<EdgeConfig>,
}

impl TenantRouter {
    /// Create a router from edge configuration.
    pub fn new(config: EdgeConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Access the edge configuration.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Route a host/path pair.
    ///
    /// Returns `None` when the path is excluded or the host names no tenant.
    pub fn route(&self, host: &str, path: &str) -> Option<Routed> {
        let tenant = resolve(host)?;
        let path = rewrite_path(path, &tenant.slug, &self.config)?;
        Some(Routed { tenant, path })
    }

    /// Rewrite the URI of a request.
    ///
    /// On success the path is rooted under `/{slug}` (query preserved) and
    /// the [`Tenant`] is inserted as a request extension. Otherwise the
    /// request passes through untouched.
    pub fn rewrite<B>(&self, mut req: Request<B>) -> Request<B> {
        let Some(host) = request_host(&req) else {
            return req;
        };
        let Some(routed) = self.route(&host, req.uri().path()) else {
            return req;
        };

        let path_and_query = match req.uri().query() {
            Some(query) => format!("{}?{query}", routed.path),
            None => routed.path.clone(),
        };
        let mut parts = req.uri().clone().into_parts();
        match path_and_query.parse::<PathAndQuery>() {
            Ok(pq) => parts.path_and_query = Some(pq),
            Err(e) => {
                tracing::warn!("cannot rewrite path to '{path_and_query}': {e}");
                return req;
            }
        }
        match Uri::from_parts(parts) {
            Ok(uri) => {
                tracing::debug!(
                    "routed {host}{} to {} for tenant {}",
                    req.uri().path(),
                    uri.path(),
                    routed.tenant
                );
                *req.uri_mut() = uri;
                req.extensions_mut().insert(routed.tenant);
            }
            Err(e) => tracing::warn!("cannot rebuild uri for '{path_and_query}': {e}"),
        }
        req
    }
}

fn request_host<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| req.uri().authority().map(|a| a.as_str().to_owned()))
}
