//! # dpm_api_client
//!
//! Typed HTTP client for the DPM REST API.
//!
//! A [`Client`] carries the access token and the [`SessionContext`] it keeps
//! up to date: `login` and `refresh_session` populate it from token
//! introspection, `logout` and any 401 response clear it.

pub mod config;
pub mod error;
pub mod permissions;
pub mod resources;
pub mod view;

use std::sync::Arc;

use dpm_core::SessionContext;
use dpm_core::models::{
    LoginRequest, LoginResponse, Page, Profile, SearchHit, SearchRequest, TokenInfo,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use permissions::PermissionsClient;
pub use resources::{
    Applications, EntityClient, GroupScoped, Groups, ListParams, Resource, SuperUsers, Topics,
    Ungrouped, Users,
};
pub use view::{ListView, RefreshOutcome};

#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    config: ClientConfig,
    session: SessionContext,
    token: Arc<RwLock<Option<String>>>,
}

impl Client {
    pub fn new(config: ClientConfig, session: SessionContext) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;
        Ok(Self {
            http,
            config,
            session,
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    /// Use a previously issued access token (e.g. one persisted by a CLI).
    pub async fn set_token(&self, token: Option<String>) {
        *self.token.write().await = token;
    }

    // -- session ------------------------------------------------------------

    /// `POST /api/login`, then introspect the new token into the session.
    pub async fn login(&self, username: &str, password: &str) -> ClientResult<Profile> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp: LoginResponse = self
            .send_json(self.request(Method::POST, "/api/login").await?.json(&body))
            .await?;
        self.set_token(Some(resp.access_token)).await;
        info!(username = %resp.username, "logged in");
        self.refresh_session().await?.ok_or(ClientError::Auth)
    }

    /// `GET /api/token_info` into the session context. A 204 means there is no
    /// session; the context is cleared and `None` returned.
    pub async fn refresh_session(&self) -> ClientResult<Option<Profile>> {
        let resp = self
            .execute(self.request(Method::GET, "/api/token_info").await?)
            .await?;
        if resp.status() == StatusCode::NO_CONTENT {
            debug!("token_info: no session");
            self.session.clear();
            return Ok(None);
        }
        let info: TokenInfo = decode(resp).await?;
        let profile = info.into_profile();
        self.session.set_profile(profile.clone());
        Ok(profile)
    }

    /// `GET /api/logout`. The local session and token are dropped even when
    /// the request fails.
    pub async fn logout(&self) -> ClientResult<()> {
        let result = match self.request(Method::GET, "/api/logout").await {
            Ok(rb) => self.execute(rb).await.map(|_| ()),
            Err(e) => Err(e),
        };
        self.set_token(None).await;
        self.session.clear();
        info!("logged out");
        result
    }

    // -- resources ----------------------------------------------------------

    pub fn entities<R: Resource>(&self) -> EntityClient<'_, R> {
        EntityClient::new(self)
    }

    pub fn groups(&self) -> EntityClient<'_, Groups> {
        self.entities()
    }

    pub fn users(&self) -> EntityClient<'_, Users> {
        self.entities()
    }

    pub fn super_users(&self) -> EntityClient<'_, SuperUsers> {
        self.entities()
    }

    pub fn topics(&self) -> EntityClient<'_, Topics> {
        self.entities()
    }

    pub fn applications(&self) -> EntityClient<'_, Applications> {
        self.entities()
    }

    pub fn application_permissions(&self) -> PermissionsClient<'_> {
        PermissionsClient::new(self)
    }

    /// `GET /api/search` across public groups, topics and applications. Every
    /// page from `request.page` on is read.
    pub async fn search(&self, request: &SearchRequest) -> ClientResult<Vec<SearchHit>> {
        let mut request = request.clone();
        let mut hits = Vec::new();
        let mut page_number = request.page.unwrap_or(0);
        loop {
            request.page = Some(page_number);
            let rb = self
                .request(Method::GET, "/api/search")
                .await?
                .query(&request);
            let page: Page<SearchHit> = self.send_json(rb).await?;
            let total = page.total_size;
            if page.is_empty() {
                break;
            }
            hits.extend(page.content);
            if page_number.saturating_add(1).saturating_mul(page.size) >= total {
                break;
            }
            page_number += 1;
        }
        debug!(hits = hits.len(), "search");
        Ok(hits)
    }

    // -- plumbing -----------------------------------------------------------

    pub(crate) async fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let url = self.config.endpoint(path)?;
        let mut rb = self.http.request(method, url);
        if let Some(token) = self.token.read().await.as_deref() {
            rb = rb.bearer_auth(token);
        }
        Ok(rb)
    }

    /// Send and sort out failures. Only a 401 clears the session; a 403 is a
    /// refused action and leaves it alone.
    pub(crate) async fn execute(&self, rb: RequestBuilder) -> ClientResult<Response> {
        let resp = rb.send().await.map_err(|e| {
            warn!(error = %e, "request failed to complete");
            ClientError::Network(e)
        })?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let err = ClientError::from_status(status, body);
        if err.is_auth() {
            warn!(status = status.as_u16(), "session rejected, clearing");
            self.set_token(None).await;
            self.session.clear();
        } else {
            debug!(status = status.as_u16(), error = %err, "request rejected");
        }
        Err(err)
    }

    pub(crate) async fn send_json<T: DeserializeOwned>(&self, rb: RequestBuilder) -> ClientResult<T> {
        decode(self.execute(rb).await?).await
    }

    pub(crate) async fn send_text(&self, rb: RequestBuilder) -> ClientResult<String> {
        self.execute(rb)
            .await?
            .text()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub(crate) async fn send_empty(&self, rb: RequestBuilder) -> ClientResult<()> {
        self.execute(rb).await.map(|_| ())
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> ClientResult<T> {
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| ClientError::Decode(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
}
