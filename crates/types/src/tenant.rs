//! Tenant identity resolved at the edge.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A customer's chat surface.
///
/// Resolved once per inbound request and never cached across requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tenant {
    /// URL-safe tenant identifier.
    pub slug: CompactString,
    /// Deployment environment tag (e.g. `dev`), if the host carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<CompactString>,
}

impl Tenant {
    /// Create a tenant without an environment tag.
    pub fn new(slug: impl Into<CompactString>) -> Self {
        Self {
            slug: slug.into(),
            environment: None,
        }
    }

    /// Attach an environment tag.
    pub fn with_environment(mut self, environment: impl Into<CompactString>) -> Self {
        self.environment = Some(environment.into());
        self
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.environment {
            Some(env) => write!(f, "{}@{env}", self.slug),
            None => f.write_str(&self.slug),
        }
    }
}
