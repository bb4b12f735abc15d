//! HTTP implementation of the auth collaborator.
//!
//! Single attempt per call: no retries and no client-side timeout. A
//! request left in flight when the caller moves on simply completes into
//! the void; the store guards against applying its result.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::providers::{rejection_from, Ack, AuthProvider, AuthSession, ProviderResult};

#[derive(Clone)]
pub struct HttpAuthProvider {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    full_name: &'a str,
}

#[derive(Debug, Serialize)]
struct PromptSeenRequest {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

impl HttpAuthProvider {
    pub fn new(base_url: String, api_key: String) -> Self {
        HttpAuthProvider {
            http: Client::new(),
            base_url,
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url.trim_end_matches('/'))
    }

    async fn get_session_from(&self, path: &str) -> ProviderResult<AuthSession> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection_from(response).await);
        }
        Ok(response.json::<AuthSession>().await?)
    }

    async fn post_session(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> ProviderResult<AuthSession> {
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection_from(response).await);
        }
        Ok(response.json::<AuthSession>().await?)
    }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn get_session(&self) -> ProviderResult<AuthSession> {
        let session = self.get_session_from("session").await?;
        debug!("Session fetched (authenticated: {})", session.authenticated);
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<AuthSession> {
        self.post_session("sign-in", &SignInRequest { email, password })
            .await
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ProviderResult<AuthSession> {
        self.post_session(
            "sign-up",
            &SignUpRequest {
                email,
                password,
                full_name,
            },
        )
        .await
    }

    async fn sign_out(&self) -> ProviderResult<()> {
        let response = self
            .http
            .post(self.url("sign-out"))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection_from(response).await);
        }
        Ok(())
    }

    async fn mark_profile_prompt_seen(&self, user_id: Uuid) -> ProviderResult<()> {
        let response = self
            .http
            .post(self.url("profile-prompt-seen"))
            .bearer_auth(&self.api_key)
            .json(&PromptSeenRequest { user_id })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection_from(response).await);
        }
        response.json::<Ack>().await?.into_result()
    }

    async fn get_access_token(&self) -> ProviderResult<Option<String>> {
        let response = self
            .http
            .get(self.url("token"))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection_from(response).await);
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

impl std::fmt::Debug for HttpAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAuthProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}
