//! Collaborator seams. The flow talks to three external services through
//! these traits: the auth backend (session and profile), the billing
//! backend (plans, wallet, coupons, credits, payments), and the AI
//! generation backend.
//!
//! HTTP implementations live in the sibling modules; `memory` carries
//! in-memory implementations used by tests and local development. None of
//! the implementations retry: every failure is terminal for that attempt
//! and the user retries by hand.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::builder::ExperienceLevel;
use crate::errors::ProviderError;
use crate::models::payment::{CouponApplication, FreeActivation, PaymentSubmission, WalletTransaction};
use crate::models::subscription::{AddOn, CreditKind, Plan, SubscriptionSnapshot};
use crate::models::user::User;

pub mod ai;
pub mod auth;
pub mod billing;
pub mod memory;

pub use ai::HttpResumeAi;
pub use auth::HttpAuthProvider;
pub use billing::HttpBillingProvider;
pub use memory::{InMemoryAuthProvider, InMemoryBillingProvider, InMemoryResumeAi};

pub type ProviderResult<T> = Result<T, ProviderError>;

/// What the auth backend reports for the current visitor. The store wraps
/// this into its own session state; `loading` is a store concern, not a
/// wire field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub authenticated: bool,
    pub user: Option<User>,
}

impl AuthSession {
    pub fn signed_out() -> Self {
        AuthSession {
            authenticated: false,
            user: None,
        }
    }
}

/// Input to the AI generation backend. Contact fields ride along so the
/// generated document carries them verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub resume_text: String,
    pub target_description: String,
    pub experience_level: ExperienceLevel,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
}

/// Structured result from the AI backend. Opaque to this flow: the
/// document gets handed to presentation unexamined, only success or
/// failure matters here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedResume(pub serde_json::Value);

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn get_session(&self) -> ProviderResult<AuthSession>;

    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<AuthSession>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ProviderResult<AuthSession>;

    async fn sign_out(&self) -> ProviderResult<()>;

    /// Idempotent; flips `has_seen_profile_prompt` to true server-side.
    async fn mark_profile_prompt_seen(&self, user_id: Uuid) -> ProviderResult<()>;

    /// Current access token, `None` when there is no live session. Fetched
    /// immediately before payment submission, never cached by the flow.
    async fn get_access_token(&self) -> ProviderResult<Option<String>>;
}

#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn get_plans(&self) -> ProviderResult<Vec<Plan>>;

    async fn get_add_ons(&self) -> ProviderResult<Vec<AddOn>>;

    /// `None` when the user has no active plan.
    async fn get_user_subscription(
        &self,
        user_id: Uuid,
    ) -> ProviderResult<Option<SubscriptionSnapshot>>;

    async fn get_wallet_transactions(
        &self,
        user_id: Uuid,
    ) -> ProviderResult<Vec<WalletTransaction>>;

    /// Server-authoritative coupon math. A rejection comes back as
    /// `ProviderError::Rejected` carrying the server's reason when it gave
    /// one.
    async fn apply_coupon(
        &self,
        plan_id: &str,
        code: &str,
        user_id: Option<Uuid>,
    ) -> ProviderResult<CouponApplication>;

    /// Consumes one credit of `kind`. Failure means the credit was not
    /// consumed and generation must not start.
    async fn use_credit(&self, user_id: Uuid, kind: CreditKind) -> ProviderResult<()>;

    async fn process_free_subscription(&self, activation: &FreeActivation) -> ProviderResult<()>;

    async fn process_payment(&self, submission: &PaymentSubmission) -> ProviderResult<()>;
}

#[async_trait]
pub trait ResumeAi: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> ProviderResult<GeneratedResume>;
}

// ────────────────────────────────────────────────────────────────────────────
// Shared wire plumbing for the HTTP implementations
// ────────────────────────────────────────────────────────────────────────────

/// Mutation acknowledgement shape used across the backends.
#[derive(Debug, Deserialize)]
pub(crate) struct Ack {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl Ack {
    pub(crate) fn into_result(self) -> ProviderResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(ProviderError::rejected(self.error.unwrap_or_default()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Maps a non-2xx response to a rejection, preferring the server's own
/// `{"error": "..."}` message over the raw body.
pub(crate) async fn rejection_from(response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.error)
        .unwrap_or(body);
    if message.is_empty() {
        ProviderError::rejected(format!("request failed with status {status}"))
    } else {
        ProviderError::rejected(message)
    }
}
