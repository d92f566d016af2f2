//! Host name → tenant resolution.
//!
//! Local topology (`*.localhost`):
//! - `acme.localhost` → `acme`
//! - `dev.acme.localhost`, `acme.dev.localhost` → `acme` in `dev`; the slug
//!   is whichever label is not an environment tag.
//!
//! Production topology (anything else):
//! - `acme.example.com` → `acme`
//! - `dev.acme.example.com` → `acme` in `dev`; position decides, the first
//!   label is taken as the environment without checking it.

use compact_str::CompactString;
use types::Tenant;

/// Loopback names that mark a local deployment.
pub const LOCAL_HOSTS: &[&str] = &["localhost"];

/// Environment tags recognised in local host names.
pub const ENVIRONMENT_TAGS: &[&str] = &["dev", "staging", "local"];

/// Labels that are never a tenant.
pub const RESERVED_SLUGS: &[&str] = &[
    "www",
    "api",
    "admin",
    "dashboard",
    "app",
    "dev",
    "staging",
    "local",
    "test",
];

/// Minimum slug length.
pub const MIN_SLUG_LEN: usize = 3;

/// Resolve a raw `Host` header value (port allowed) to a tenant.
///
/// Returns `None` when the host does not name a tenant; the request should
/// then fall through to default routing.
pub fn resolve(host: &str) -> Option<Tenant> {
    let host = strip_port(host.trim()).trim_end_matches('.').to_ascii_lowercase();
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 {
        return None;
    }

    let (slug, environment) = if is_local(&labels) {
        local(&labels)?
    } else {
        production(&labels)?
    };

    if !is_valid_slug(slug) {
        tracing::debug!("rejected tenant slug '{slug}' from host '{host}'");
        return None;
    }

    Some(Tenant {
        slug: CompactString::from(slug),
        environment: environment.map(CompactString::from),
    })
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            name
        }
        _ => host,
    }
}

fn is_local(labels: &[&str]) -> bool {
    let n = labels.len();
    LOCAL_HOSTS.contains(&labels[n - 1]) || (n >= 2 && LOCAL_HOSTS.contains(&labels[n - 2]))
}

fn is_environment(label: &str) -> bool {
    ENVIRONMENT_TAGS.contains(&label)
}

fn local<'a>(labels: &[&'a str]) -> Option<(&'a str, Option<&'a str>)> {
    match labels {
        [slug, _] => Some((*slug, None)),
        [first, second, _] if is_environment(first) => Some((*second, Some(*first))),
        [first, second, _] if is_environment(second) => Some((*first, Some(*second))),
        [first, _, _] => Some((*first, None)),
        _ => None,
    }
}

fn production<'a>(labels: &[&'a str]) -> Option<(&'a str, Option<&'a str>)> {
    match labels {
        [slug, _, _] => Some((*slug, None)),
        [environment, slug, _, _] => Some((*slug, Some(*environment))),
        _ => None,
    }
}

fn is_valid_slug(slug: &str) -> bool {
    slug.len() >= MIN_SLUG_LEN
        && !RESERVED_SLUGS.contains(&slug)
        && !LOCAL_HOSTS.contains(&slug)
        && slug.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}
