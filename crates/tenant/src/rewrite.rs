//! Logical path rewriting for resolved tenants.

use crate::EdgeConfig;

/// Whether `path` falls under one of the excluded prefixes.
///
/// Matching is segment-aware: `/api` excludes `/api` and `/api/chat` but
/// not `/apiary`.
pub fn is_excluded(path: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| {
        let prefix = prefix.trim_end_matches('/');
        !prefix.is_empty()
            && path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Rewrite `path` so it is rooted under `/{slug}`.
///
/// Returns `None` when the path is excluded and must be left alone. The
/// bare root maps to `/{slug}/{default_path}`; paths already under
/// `/{slug}` are returned unchanged.
pub fn rewrite_path(path: &str, slug: &str, config: &EdgeConfig) -> Option<String> {
    if is_excluded(path, &config.excluded_prefixes) {
        return None;
    }

    if path.is_empty() || path == "/" {
        let default = config.default_path.trim_matches('/');
        return Some(if default.is_empty() {
            format!("/{slug}")
        } else {
            format!("/{slug}/{default}")
        });
    }

    let rest = path.strip_prefix('/').unwrap_or(path);
    let already_rooted = rest
        .strip_prefix(slug)
        .is_some_and(|tail| tail.is_empty() || tail.starts_with('/'));
    if already_rooted {
        return Some(format!("/{rest}"));
    }

    Some(format!("/{slug}/{rest}"))
}
