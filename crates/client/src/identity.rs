//! The single active caller identity of a chat surface.

use crate::{Error, Result, api::IdentityApi};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use types::{Credential, Identity, LoginCredentials, Tenant};

/// Identity manager shared between the chat client and the history store.
pub type SharedIdentity<A> = Arc<Mutex<IdentityManager<A>>>;

/// Owns the current [`Identity`] and the identity generation.
///
/// The generation increases whenever the caller changes (login, logout or a
/// tenant switch). Subscribers compare generations to drop state that
/// belongs to a previous caller. Adopting the first guest credential and
/// rotating an access token keep the generation.
pub struct IdentityManager<A> {
    api: A,
    tenant: Tenant,
    current: Option<Identity>,
    generation: watch::Sender<u64>,
}

impl<A: IdentityApi> IdentityManager<A> {
    /// Create a manager with no identity for `tenant`.
    pub fn new(api: A, tenant: Tenant) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            api,
            tenant,
            current: None,
            generation,
        }
    }

    /// Wrap the manager for sharing.
    pub fn shared(self) -> SharedIdentity<A> {
        Arc::new(Mutex::new(self))
    }

    /// The remote collaborator.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// The tenant the current identity is scoped to.
    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }

    /// The current identity, if one has been established.
    pub fn current(&self) -> Option<&Identity> {
        self.current.as_ref()
    }

    /// Whether an authenticated identity is active.
    pub fn is_authenticated(&self) -> bool {
        self.current.as_ref().is_some_and(Identity::is_authenticated)
    }

    /// The current identity generation.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Watch identity generation changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    /// The credential of the authenticated identity.
    pub fn member_credential(&self) -> Result<Credential> {
        match &self.current {
            Some(identity @ Identity::Authenticated { .. }) => Ok(identity.token().clone()),
            _ => Err(Error::NotAuthenticated),
        }
    }

    /// Make sure a credential exists for `tenant`, issuing a guest when
    /// nothing is established yet.
    ///
    /// An existing credential for the same tenant is returned as is. An
    /// identity scoped to another tenant is discarded first.
    pub async fn ensure_guest(&mut self, tenant: &Tenant) -> Result<Credential> {
        if self.tenant != *tenant {
            tracing::info!("tenant changed from {} to {tenant}", self.tenant);
            let had_identity = self.current.take().is_some();
            self.tenant = tenant.clone();
            if had_identity {
                self.advance();
            }
        }
        if let Some(identity) = &self.current {
            return Ok(identity.token().clone());
        }

        let token = self
            .api
            .issue_guest(tenant)
            .await
            .map_err(Error::Identity)?;
        tracing::info!("adopted guest identity for {tenant}");
        self.current = Some(Identity::Guest {
            token: token.clone(),
        });
        Ok(token)
    }

    /// Log in, replacing the current identity.
    ///
    /// On failure the current identity is left untouched.
    pub async fn authenticate(&mut self, credentials: &LoginCredentials) -> Result<&Identity> {
        let tokens = self
            .api
            .login(&self.tenant, credentials)
            .await
            .map_err(Error::Identity)?;
        let identity = Identity::Authenticated {
            token: tokens.access_token,
            refresh_token: tokens.refresh_token.unwrap_or_else(|| Credential::new("")),
            profile: tokens.profile.unwrap_or_default(),
        };
        tracing::info!("authenticated as {}", credentials.email);
        self.advance();
        Ok(&*self.current.insert(identity))
    }

    /// Log out and re-establish a fresh guest identity.
    ///
    /// A failed guest issuance leaves no identity behind; the next
    /// [`ensure_guest`](Self::ensure_guest) retries.
    pub async fn release(&mut self) -> Result<Credential> {
        if self.is_authenticated() {
            self.current = None;
            tracing::info!("released authenticated identity for {}", self.tenant);
            self.advance();
        }
        let tenant = self.tenant.clone();
        self.ensure_guest(&tenant).await
    }

    /// Rotate the access token of the authenticated identity.
    pub async fn refresh(&mut self) -> Result<Credential> {
        let Some(Identity::Authenticated {
            refresh_token,
            profile,
            ..
        }) = &self.current
        else {
            return Err(Error::NotAuthenticated);
        };
        if refresh_token.is_empty() {
            return Err(Error::Identity(anyhow::anyhow!("no refresh token was issued")));
        }
        let (refresh_token, profile) = (refresh_token.clone(), profile.clone());

        let tokens = self
            .api
            .refresh(&self.tenant, &refresh_token)
            .await
            .map_err(Error::Identity)?;
        let token = tokens.access_token.clone();
        self.current = Some(Identity::Authenticated {
            token: tokens.access_token,
            refresh_token: tokens.refresh_token.unwrap_or(refresh_token),
            profile: tokens.profile.unwrap_or(profile),
        });
        tracing::debug!("rotated access token for {}", self.tenant);
        Ok(token)
    }

    fn advance(&self) {
        self.generation.send_modify(|generation| *generation += 1);
        tracing::debug!("identity generation {}", *self.generation.borrow());
    }
}
