//! HTTP implementation of the backend collaborators.
//!
//! [`SupabaseClient`] wraps one pooled [`reqwest::Client`] and talks to the
//! hosted backend's auth (`/auth/v1`), row store (`/rest/v1`) and storage
//! (`/storage/v1`) endpoints.

mod auth;
mod rest;
mod storage;

use std::sync::Arc;

use dinodex_events::EventBus;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;

use crate::backend::Session;
use crate::config::BackendConfig;
use crate::error::RemoteError;

/// HTTP client for one hosted backend project.
pub struct SupabaseClient {
    client: reqwest::Client,
    config: BackendConfig,
    session: RwLock<Option<Session>>,
    events: Arc<EventBus>,
}

impl SupabaseClient {
    /// Create a client. Session changes are published on `events`.
    pub fn new(config: BackendConfig, events: Arc<EventBus>) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self::with_client(client, config, events))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: BackendConfig, events: Arc<EventBus>) -> Self {
        Self {
            client,
            config,
            session: RwLock::new(None),
            events,
        }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Adopt a session persisted elsewhere (e.g. restored from disk).
    pub async fn restore_session(&self, session: Session) {
        let user = session.user.clone();
        *self.session.write().await = Some(session);
        self.events.publish(dinodex_events::SessionEvent::signed_in(user));
    }

    // ---- private helpers ----

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url, path.trim_start_matches('/'))
    }

    /// Attach the API key and bearer token. The bearer is the user's access
    /// token when signed in, otherwise the anon key.
    async fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = match self.session.read().await.as_ref() {
            Some(session) => session.access_token.clone(),
            None => self.config.anon_key.clone(),
        };
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
    }

    /// Ensure the response has a success status code. 409 maps to
    /// [`RemoteError::Conflict`], other failures to [`RemoteError::Api`].
    async fn ensure_success(response: Response) -> Result<Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        if status == StatusCode::CONFLICT {
            return Err(RemoteError::Conflict(body));
        }
        Err(RemoteError::Api {
            status: status.as_u16(),
            body,
        })
    }

    /// Check the status and decode the JSON body.
    async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T, RemoteError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
