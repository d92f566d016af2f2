//! Caller identities and their bearer credentials.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A short-lived bearer token.
///
/// `Debug` output is redacted so credentials never reach the logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(CompactString);

impl Credential {
    /// Wrap a raw bearer token.
    pub fn new(token: impl Into<CompactString>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the token is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Profile of an authenticated visitor, as returned by the login endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Server-side user identifier.
    #[serde(default)]
    pub id: CompactString,
    /// Login email.
    #[serde(default)]
    pub email: CompactString,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<CompactString>,
}

/// The single active caller identity of a chat surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Anonymous, tenant-scoped visitor.
    Guest {
        /// Guest bearer token.
        token: Credential,
    },
    /// Logged-in visitor.
    Authenticated {
        /// Access token.
        token: Credential,
        /// Token used to obtain a fresh access token.
        refresh_token: Credential,
        /// Who is logged in.
        profile: Profile,
    },
}

impl Identity {
    /// The bearer credential of this identity.
    pub fn token(&self) -> &Credential {
        match self {
            Self::Guest { token } | Self::Authenticated { token, .. } => token,
        }
    }

    /// Whether this is a guest identity.
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest { .. })
    }

    /// Whether this is an authenticated identity.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// The profile, if authenticated.
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Self::Authenticated { profile, .. } => Some(profile),
            Self::Guest { .. } => None,
        }
    }
}

/// Login form input.
#[derive(Clone, Serialize)]
pub struct LoginCredentials {
    /// Login email.
    pub email: CompactString,
    /// Plain-text password, sent once over TLS.
    pub password: String,
}

impl LoginCredentials {
    /// Create login input from an email and password.
    pub fn new(email: impl Into<CompactString>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}
