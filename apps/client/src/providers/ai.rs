//! HTTP implementation of the AI generation collaborator. The response
//! document is passed through as opaque JSON; this flow only cares whether
//! generation succeeded.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::providers::{rejection_from, GeneratedResume, GenerationRequest, ProviderResult, ResumeAi};

#[derive(Clone)]
pub struct HttpResumeAi {
    http: Client,
    base_url: String,
    api_key: String,
}

impl HttpResumeAi {
    pub fn new(base_url: String, api_key: String) -> Self {
        HttpResumeAi {
            http: Client::new(),
            base_url,
            api_key,
        }
    }

    fn url(&self) -> String {
        format!("{}/ai/v1/resume/generate", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ResumeAi for HttpResumeAi {
    async fn generate(&self, request: &GenerationRequest) -> ProviderResult<GeneratedResume> {
        let response = self
            .http
            .post(self.url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection_from(response).await);
        }
        let document: serde_json::Value = response.json().await?;
        debug!(
            "Resume generation completed ({} input chars)",
            request.resume_text.len()
        );
        Ok(GeneratedResume(document))
    }
}

impl std::fmt::Debug for HttpResumeAi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResumeAi")
            .field("base_url", &self.base_url)
            .finish()
    }
}
