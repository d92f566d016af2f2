//! Tenant resolution at the edge.
//!
//! Derives a [`Tenant`] from an inbound host name across local and
//! production topologies, and rewrites the request path so the rest of the
//! application sees it rooted under `/{slug}`.

pub use config::EdgeConfig;
pub use resolver::{ENVIRONMENT_TAGS, LOCAL_HOSTS, MIN_SLUG_LEN, RESERVED_SLUGS, resolve};
pub use rewrite::{is_excluded, rewrite_path};
pub use router::{Routed, TenantRouter};
pub use types::Tenant;

pub mod config;
mod resolver;
mod rewrite;
mod router;
