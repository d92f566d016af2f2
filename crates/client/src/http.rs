//! HTTP implementation of the collaborator traits.
//!
//! `HttpBackend` wraps a `reqwest::Client` with pre-built headers and the
//! route table from [`ClientConfig`]. Chat turns come back as the raw byte
//! stream of the response body; decoding happens in the chat client.

use crate::{
    ClientConfig, Error,
    api::{ChatRoute, ChatTransport, HistoryApi, IdentityApi, TurnResponse},
};
use anyhow::{Context, Result, anyhow, bail};
use compact_str::CompactString;
use futures_util::StreamExt;
use reqwest::{
    Client, Method, RequestBuilder, StatusCode, Url,
    header::{self, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::sync::Arc;
use types::{
    AuthTokens, ChatRequest, ChatSession, ClientMetadata, Credential, GuestSession,
    GuestSessionRequest, LoginCredentials, Message, RemoteChat, RemoteMessage, RenameRequest,
    Tenant,
};

/// Chat backend reached over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    headers: HeaderMap,
    config: Arc<ClientConfig>,
    metadata: ClientMetadata,
}

impl HttpBackend {
    /// Create a backend over an existing `reqwest::Client`.
    pub fn new(client: Client, config: ClientConfig) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(concat!("parley/", env!("CARGO_PKG_VERSION"))),
        );
        let metadata = ClientMetadata {
            client: config.client_name.clone(),
            version: env!("CARGO_PKG_VERSION").into(),
            device_id: uuid::Uuid::new_v4().to_string().into(),
        };
        Self {
            client,
            headers,
            config: Arc::new(config),
            metadata,
        }
    }

    /// Create a backend with a fresh `reqwest::Client`.
    pub fn from_config(config: ClientConfig) -> crate::Result<Self> {
        Url::parse(&config.base_url)
            .with_context(|| format!("invalid base url {}", config.base_url))
            .map_err(Error::Config)?;
        let client = Client::builder()
            .build()
            .context("failed to build http client")
            .map_err(Error::Config)?;
        Ok(Self::new(client, config))
    }

    /// The configuration this backend was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Headers sent with every request.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Metadata reported when requesting a guest session.
    pub fn metadata(&self) -> &ClientMetadata {
        &self.metadata
    }

    /// The chat endpoint for `tenant` on `route`.
    pub fn chat_endpoint(&self, tenant: &Tenant, route: ChatRoute) -> String {
        let template = match route {
            ChatRoute::Member => &self.config.member_chat_path,
            ChatRoute::Public => &self.config.public_chat_path,
        };
        self.config.url(template, &tenant.slug)
    }

    /// The URL of one conversation under the history route.
    pub fn chat_url(&self, tenant: &Tenant, chat_id: &str, suffix: Option<&str>) -> Result<Url> {
        let base = self.config.url(&self.config.chats_path, &tenant.slug);
        let mut url = Url::parse(&base).with_context(|| format!("invalid history url {base}"))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| anyhow!("history url {base} cannot carry a path"))?;
            segments.pop_if_empty().push(chat_id);
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: impl reqwest::IntoUrl) -> RequestBuilder {
        self.client
            .request(method, url)
            .headers(self.headers.clone())
    }

    fn authorized(
        &self,
        method: Method,
        url: impl reqwest::IntoUrl,
        credential: &Credential,
    ) -> RequestBuilder {
        self.request(method, url)
            .header(header::AUTHORIZATION, format!("Bearer {}", credential.expose()))
    }

    async fn json<T: DeserializeOwned>(builder: RequestBuilder, what: &str) -> Result<T> {
        let response = builder
            .send()
            .await
            .with_context(|| format!("{what} request failed"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("{what} rejected with status {status}");
        }
        let text = response.text().await?;
        tracing::trace!("{what} response: {text}");
        serde_json::from_str(&text).with_context(|| format!("malformed {what} response"))
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    tenant_id: &'a str,
    #[serde(flatten)]
    credentials: &'a LoginCredentials,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    tenant_id: &'a str,
    refresh_token: &'a Credential,
}

/// History listings arrive either bare or wrapped in an object.
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Chats { chats: Vec<T> },
    Messages { messages: Vec<T> },
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Chats { chats: items } | Self::Messages { messages: items } => {
                items
            }
        }
    }
}

impl IdentityApi for HttpBackend {
    async fn issue_guest(&self, tenant: &Tenant) -> Result<Credential> {
        let url = self.config.url(&self.config.guest_session_path, &tenant.slug);
        let body = GuestSessionRequest {
            tenant_id: tenant.slug.clone(),
            client_metadata: self.metadata.clone(),
        };
        let session: GuestSession =
            Self::json(self.request(Method::POST, url).json(&body), "guest session").await?;
        if session.credential.is_empty() {
            bail!("guest session response carried no credential");
        }
        Ok(session.credential)
    }

    async fn login(&self, tenant: &Tenant, credentials: &LoginCredentials) -> Result<AuthTokens> {
        let url = self.config.url(&self.config.login_path, &tenant.slug);
        let body = LoginRequest {
            tenant_id: &tenant.slug,
            credentials,
        };
        let tokens: AuthTokens = Self::json(self.request(Method::POST, url).json(&body), "login").await?;
        if tokens.access_token.is_empty() {
            bail!("login response carried no access token");
        }
        Ok(tokens)
    }

    async fn refresh(&self, tenant: &Tenant, refresh_token: &Credential) -> Result<AuthTokens> {
        let url = self.config.url(&self.config.refresh_path, &tenant.slug);
        let body = RefreshRequest {
            tenant_id: &tenant.slug,
            refresh_token,
        };
        Self::json(self.request(Method::POST, url).json(&body), "token refresh").await
    }
}

impl ChatTransport for HttpBackend {
    async fn open_turn(
        &self,
        tenant: &Tenant,
        route: ChatRoute,
        credential: &Credential,
        request: &ChatRequest,
    ) -> Result<TurnResponse> {
        let url = self.chat_endpoint(tenant, route);
        if let Ok(body) = serde_json::to_string(request) {
            tracing::trace!("chat request to {url}: {body}");
        }
        let response = self
            .authorized(Method::POST, &url, credential)
            .header(header::ACCEPT, "text/event-stream")
            .json(request)
            .send()
            .await
            .context("chat request failed")?;
        let status = response.status();
        if !status.is_success() {
            bail!("chat request rejected with status {status}");
        }

        let chat_id = response
            .headers()
            .get(self.config.chat_id_header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(CompactString::from);
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(anyhow::Error::from));
        Ok(TurnResponse {
            chat_id,
            body: Box::pin(body),
        })
    }
}

impl HistoryApi for HttpBackend {
    async fn list_chats(&self, tenant: &Tenant, credential: &Credential) -> Result<Vec<ChatSession>> {
        let url = self.config.url(&self.config.chats_path, &tenant.slug);
        let listing: Listing<RemoteChat> =
            Self::json(self.authorized(Method::GET, url, credential), "chat list").await?;
        Ok(listing.into_vec().into_iter().map(Into::into).collect())
    }

    async fn chat_messages(
        &self,
        tenant: &Tenant,
        credential: &Credential,
        chat_id: &str,
    ) -> Result<Vec<Message>> {
        let url = self.chat_url(tenant, chat_id, Some("messages"))?;
        let listing: Listing<RemoteMessage> =
            Self::json(self.authorized(Method::GET, url, credential), "chat messages").await?;
        Ok(listing.into_vec().into_iter().map(Into::into).collect())
    }

    async fn rename_chat(
        &self,
        tenant: &Tenant,
        credential: &Credential,
        chat_id: &str,
        title: &str,
    ) -> Result<()> {
        let url = self.chat_url(tenant, chat_id, None)?;
        let body = RenameRequest {
            title: title.to_owned(),
        };
        let status = self
            .authorized(Method::PATCH, url, credential)
            .json(&body)
            .send()
            .await
            .context("rename request failed")?
            .status();
        if !status.is_success() {
            bail!("rename rejected with status {status}");
        }
        Ok(())
    }

    async fn delete_chat(&self, tenant: &Tenant, credential: &Credential, chat_id: &str) -> Result<()> {
        let url = self.chat_url(tenant, chat_id, None)?;
        let status = self
            .authorized(Method::DELETE, url, credential)
            .send()
            .await
            .context("delete request failed")?
            .status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!("chat {chat_id} already gone");
            return Ok(());
        }
        if !status.is_success() {
            bail!("delete rejected with status {status}");
        }
        Ok(())
    }
}
