//! `/auth/v1` endpoints.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dinodex_core::types::AuthUser;
use dinodex_events::SessionEvent;
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::broadcast;

use super::SupabaseClient;
use crate::backend::{AuthBackend, Session};
use crate::error::RemoteError;

/// Token grant response from the auth service.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
            user: self.user,
        }
    }
}

impl SupabaseClient {
    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, RemoteError> {
        let request = self
            .client
            .post(self.endpoint("auth/v1/token"))
            .query(&[("grant_type", grant_type)])
            .json(&body);
        let response = self.authorized(request).await.send().await?;

        if matches!(response.status(), StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED) {
            return Err(RemoteError::InvalidCredentials);
        }
        let token: TokenResponse = Self::parse_response(response).await?;
        Ok(token.into_session())
    }

    async fn store_session(&self, session: &Session, event: SessionEvent) {
        *self.session.write().await = Some(session.clone());
        self.events.publish(event);
    }
}

#[async_trait]
impl AuthBackend for SupabaseClient {
    async fn current_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, RemoteError> {
        let session = self
            .token_grant(
                "password",
                serde_json::json!({ "email": email, "password": password }),
            )
            .await?;
        tracing::info!(user_id = %session.user.id, "Signed in");
        self.store_session(&session, SessionEvent::signed_in(session.user.clone()))
            .await;
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, RemoteError> {
        let request = self
            .client
            .post(self.endpoint("auth/v1/signup"))
            .json(&serde_json::json!({ "email": email, "password": password }));
        let response = self.authorized(request).await.send().await?;
        let body: serde_json::Value = Self::parse_response(response).await?;

        // Without auto-confirm the service returns the bare user and no tokens.
        if body.get("access_token").is_none() {
            tracing::info!(email, "Sign-up pending confirmation");
            return Ok(None);
        }

        let session = serde_json::from_value::<TokenResponse>(body)?.into_session();
        tracing::info!(user_id = %session.user.id, "Signed up");
        self.store_session(&session, SessionEvent::signed_in(session.user.clone()))
            .await;
        Ok(Some(session))
    }

    async fn refresh_session(&self) -> Result<Session, RemoteError> {
        let refresh_token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|s| s.refresh_token.clone())
            .ok_or(RemoteError::NotSignedIn)?;

        let session = self
            .token_grant(
                "refresh_token",
                serde_json::json!({ "refresh_token": refresh_token }),
            )
            .await?;
        self.store_session(&session, SessionEvent::token_refreshed(session.user.clone()))
            .await;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), RemoteError> {
        if self.session.read().await.is_some() {
            let request = self.client.post(self.endpoint("auth/v1/logout"));
            let result = match self.authorized(request).await.send().await {
                Ok(response) => Self::ensure_success(response).await.map(|_| ()),
                Err(e) => Err(e.into()),
            };
            if let Err(e) = result {
                tracing::warn!(error = %e, "Remote logout failed, clearing local session anyway");
            }
        }

        *self.session.write().await = None;
        self.events.publish(SessionEvent::signed_out());
        tracing::info!("Signed out");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
