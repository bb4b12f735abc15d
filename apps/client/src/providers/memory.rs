//! In-memory collaborator implementations. Tests drive the store through
//! these, and they double as a local-development backend: seed state in,
//! inspect the calls that came out. Handles are cheap clones sharing one
//! inner store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::ProviderError;
use crate::models::payment::{
    CouponApplication, FreeActivation, PaymentSubmission, WalletTransaction,
};
use crate::models::subscription::{AddOn, CreditKind, Plan, SubscriptionSnapshot};
use crate::models::user::User;
use crate::providers::{
    AuthProvider, AuthSession, BillingProvider, GeneratedResume, GenerationRequest,
    ProviderResult, ResumeAi,
};

// ────────────────────────────────────────────────────────────────────────────
// Auth
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct InMemoryAuthProvider {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    session: RwLock<AuthSession>,
    access_token: RwLock<Option<String>>,
    accounts: RwLock<HashMap<String, (String, User)>>,
    prompt_seen_calls: RwLock<Vec<Uuid>>,
    prompt_seen_failure: RwLock<Option<String>>,
    token_failure: RwLock<Option<String>>,
}

impl Default for AuthInner {
    fn default() -> Self {
        AuthInner {
            session: RwLock::new(AuthSession::signed_out()),
            access_token: RwLock::new(None),
            accounts: RwLock::new(HashMap::new()),
            prompt_seen_calls: RwLock::new(Vec::new()),
            prompt_seen_failure: RwLock::new(None),
            token_failure: RwLock::new(None),
        }
    }
}

impl InMemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a signed-in session with a live access token.
    pub fn seed_signed_in(&self, user: User) {
        *self.inner.session.write().unwrap() = AuthSession {
            authenticated: true,
            user: Some(user),
        };
        *self.inner.access_token.write().unwrap() = Some(format!("token-{}", Uuid::new_v4()));
    }

    /// Seed a credentialed account for the sign-in path.
    pub fn seed_account(&self, email: &str, password: &str, user: User) {
        self.inner
            .accounts
            .write()
            .unwrap()
            .insert(email.to_string(), (password.to_string(), user));
    }

    pub fn set_access_token(&self, token: Option<String>) {
        *self.inner.access_token.write().unwrap() = token;
    }

    /// Force the next prompt-seen mutations to fail with `message`.
    pub fn fail_prompt_seen(&self, message: &str) {
        *self.inner.prompt_seen_failure.write().unwrap() = Some(message.to_string());
    }

    /// Force subsequent access-token fetches to fail with `message`.
    pub fn fail_token_fetch(&self, message: &str) {
        *self.inner.token_failure.write().unwrap() = Some(message.to_string());
    }

    /// User ids the prompt-seen mutation was invoked for.
    pub fn prompt_seen_calls(&self) -> Vec<Uuid> {
        self.inner.prompt_seen_calls.read().unwrap().clone()
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuthProvider {
    async fn get_session(&self) -> ProviderResult<AuthSession> {
        Ok(self.inner.session.read().unwrap().clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> ProviderResult<AuthSession> {
        let accounts = self.inner.accounts.read().unwrap();
        match accounts.get(email) {
            Some((stored_password, user)) if stored_password == password => {
                let session = AuthSession {
                    authenticated: true,
                    user: Some(user.clone()),
                };
                drop(accounts);
                *self.inner.session.write().unwrap() = session.clone();
                *self.inner.access_token.write().unwrap() =
                    Some(format!("token-{}", Uuid::new_v4()));
                Ok(session)
            }
            _ => Err(ProviderError::rejected("Invalid login credentials")),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> ProviderResult<AuthSession> {
        if self.inner.accounts.read().unwrap().contains_key(email) {
            return Err(ProviderError::rejected("An account with this email already exists"));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: full_name.to_string(),
            phone: None,
            linkedin: None,
            github: None,
            referral_code: None,
            has_seen_profile_prompt: Some(false),
        };
        self.seed_account(email, password, user.clone());
        let session = AuthSession {
            authenticated: true,
            user: Some(user),
        };
        *self.inner.session.write().unwrap() = session.clone();
        *self.inner.access_token.write().unwrap() = Some(format!("token-{}", Uuid::new_v4()));
        Ok(session)
    }

    async fn sign_out(&self) -> ProviderResult<()> {
        *self.inner.session.write().unwrap() = AuthSession::signed_out();
        *self.inner.access_token.write().unwrap() = None;
        Ok(())
    }

    async fn mark_profile_prompt_seen(&self, user_id: Uuid) -> ProviderResult<()> {
        self.inner.prompt_seen_calls.write().unwrap().push(user_id);
        if let Some(message) = self.inner.prompt_seen_failure.read().unwrap().clone() {
            return Err(ProviderError::rejected(message));
        }
        let mut session = self.inner.session.write().unwrap();
        if let Some(user) = session.user.as_mut() {
            if user.id == user_id {
                user.has_seen_profile_prompt = Some(true);
            }
        }
        Ok(())
    }

    async fn get_access_token(&self) -> ProviderResult<Option<String>> {
        if let Some(message) = self.inner.token_failure.read().unwrap().clone() {
            return Err(ProviderError::rejected(message));
        }
        Ok(self.inner.access_token.read().unwrap().clone())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Billing
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct InMemoryBillingProvider {
    inner: Arc<BillingInner>,
}

#[derive(Default)]
struct BillingInner {
    plans: RwLock<Vec<Plan>>,
    add_ons: RwLock<Vec<AddOn>>,
    subscriptions: RwLock<HashMap<Uuid, SubscriptionSnapshot>>,
    transactions: RwLock<HashMap<Uuid, Vec<WalletTransaction>>>,
    coupons: RwLock<HashMap<String, CouponApplication>>,
    credit_failure: RwLock<Option<String>>,
    payment_failure: RwLock<Option<String>>,
    credit_calls: RwLock<Vec<(Uuid, CreditKind)>>,
    free_activations: RwLock<Vec<FreeActivation>>,
    payments: RwLock<Vec<PaymentSubmission>>,
}

impl InMemoryBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_plans(&self, plans: Vec<Plan>) {
        *self.inner.plans.write().unwrap() = plans;
    }

    pub fn seed_add_ons(&self, add_ons: Vec<AddOn>) {
        *self.inner.add_ons.write().unwrap() = add_ons;
    }

    pub fn seed_subscription(&self, snapshot: SubscriptionSnapshot) {
        self.inner
            .subscriptions
            .write()
            .unwrap()
            .insert(snapshot.user_id, snapshot);
    }

    pub fn seed_transactions(&self, user_id: Uuid, rows: Vec<WalletTransaction>) {
        self.inner.transactions.write().unwrap().insert(user_id, rows);
    }

    /// Register a coupon code accepted for any plan.
    pub fn seed_coupon(&self, coupon: CouponApplication) {
        self.inner
            .coupons
            .write()
            .unwrap()
            .insert(coupon.code.clone(), coupon);
    }

    /// Force subsequent consume-credit calls to fail with `message`.
    pub fn fail_credit_use(&self, message: &str) {
        *self.inner.credit_failure.write().unwrap() = Some(message.to_string());
    }

    /// Force subsequent payment and free-activation calls to fail.
    pub fn fail_payments(&self, message: &str) {
        *self.inner.payment_failure.write().unwrap() = Some(message.to_string());
    }

    pub fn credit_calls(&self) -> Vec<(Uuid, CreditKind)> {
        self.inner.credit_calls.read().unwrap().clone()
    }

    pub fn free_activations(&self) -> Vec<FreeActivation> {
        self.inner.free_activations.read().unwrap().clone()
    }

    pub fn payments(&self) -> Vec<PaymentSubmission> {
        self.inner.payments.read().unwrap().clone()
    }
}

#[async_trait]
impl BillingProvider for InMemoryBillingProvider {
    async fn get_plans(&self) -> ProviderResult<Vec<Plan>> {
        Ok(self.inner.plans.read().unwrap().clone())
    }

    async fn get_add_ons(&self) -> ProviderResult<Vec<AddOn>> {
        Ok(self.inner.add_ons.read().unwrap().clone())
    }

    async fn get_user_subscription(
        &self,
        user_id: Uuid,
    ) -> ProviderResult<Option<SubscriptionSnapshot>> {
        Ok(self.inner.subscriptions.read().unwrap().get(&user_id).cloned())
    }

    async fn get_wallet_transactions(
        &self,
        user_id: Uuid,
    ) -> ProviderResult<Vec<WalletTransaction>> {
        Ok(self
            .inner
            .transactions
            .read()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn apply_coupon(
        &self,
        _plan_id: &str,
        code: &str,
        _user_id: Option<Uuid>,
    ) -> ProviderResult<CouponApplication> {
        match self.inner.coupons.read().unwrap().get(code) {
            Some(coupon) => Ok(coupon.clone()),
            None => Err(ProviderError::rejected(
                "Invalid coupon code or not applicable to selected plan",
            )),
        }
    }

    async fn use_credit(&self, user_id: Uuid, kind: CreditKind) -> ProviderResult<()> {
        self.inner.credit_calls.write().unwrap().push((user_id, kind));
        if let Some(message) = self.inner.credit_failure.read().unwrap().clone() {
            return Err(ProviderError::rejected(message));
        }
        let mut subscriptions = self.inner.subscriptions.write().unwrap();
        let snapshot = subscriptions
            .get_mut(&user_id)
            .ok_or_else(|| ProviderError::rejected("No active subscription"))?;
        if snapshot.remaining_for(kind) == 0 {
            return Err(ProviderError::rejected("No credits remaining"));
        }
        match kind {
            CreditKind::Optimization => snapshot.optimizations_used += 1,
            CreditKind::ScoreCheck => snapshot.score_checks_used += 1,
            CreditKind::GuidedBuild => snapshot.guided_builds_used += 1,
            CreditKind::LinkedinMessage => snapshot.linkedin_messages_used += 1,
        }
        Ok(())
    }

    async fn process_free_subscription(&self, activation: &FreeActivation) -> ProviderResult<()> {
        if let Some(message) = self.inner.payment_failure.read().unwrap().clone() {
            return Err(ProviderError::rejected(message));
        }
        self.inner
            .free_activations
            .write()
            .unwrap()
            .push(activation.clone());
        Ok(())
    }

    async fn process_payment(&self, submission: &PaymentSubmission) -> ProviderResult<()> {
        if let Some(message) = self.inner.payment_failure.read().unwrap().clone() {
            return Err(ProviderError::rejected(message));
        }
        self.inner.payments.write().unwrap().push(submission.clone());
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// AI generation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct InMemoryResumeAi {
    inner: Arc<AiInner>,
}

struct AiInner {
    failure: RwLock<Option<String>>,
    calls: RwLock<Vec<GenerationRequest>>,
    document: RwLock<serde_json::Value>,
}

impl Default for InMemoryResumeAi {
    fn default() -> Self {
        InMemoryResumeAi {
            inner: Arc::new(AiInner {
                failure: RwLock::new(None),
                calls: RwLock::new(Vec::new()),
                document: RwLock::new(serde_json::json!({ "sections": [] })),
            }),
        }
    }
}

impl InMemoryResumeAi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_document(&self, document: serde_json::Value) {
        *self.inner.document.write().unwrap() = document;
    }

    /// Force subsequent generate calls to fail with `message`.
    pub fn fail_generation(&self, message: &str) {
        *self.inner.failure.write().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.inner.calls.read().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.calls.read().unwrap().len()
    }
}

#[async_trait]
impl ResumeAi for InMemoryResumeAi {
    async fn generate(&self, request: &GenerationRequest) -> ProviderResult<GeneratedResume> {
        self.inner.calls.write().unwrap().push(request.clone());
        if let Some(message) = self.inner.failure.read().unwrap().clone() {
            return Err(ProviderError::rejected(message));
        }
        Ok(GeneratedResume(self.inner.document.read().unwrap().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::make_user;

    #[tokio::test]
    async fn test_sign_in_requires_matching_password() {
        let auth = InMemoryAuthProvider::new();
        auth.seed_account("ada@example.com", "hunter2", make_user(Some(true)));

        assert!(auth.sign_in("ada@example.com", "wrong").await.is_err());
        let session = auth.sign_in("ada@example.com", "hunter2").await.unwrap();
        assert!(session.authenticated);
        assert!(auth.get_access_token().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sign_out_clears_session_and_token() {
        let auth = InMemoryAuthProvider::new();
        auth.seed_signed_in(make_user(Some(true)));
        auth.sign_out().await.unwrap();
        assert!(!auth.get_session().await.unwrap().authenticated);
        assert_eq!(auth.get_access_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_prompt_seen_flips_session_flag() {
        let auth = InMemoryAuthProvider::new();
        let user = make_user(Some(false));
        let user_id = user.id;
        auth.seed_signed_in(user);

        auth.mark_profile_prompt_seen(user_id).await.unwrap();
        let session = auth.get_session().await.unwrap();
        assert_eq!(
            session.user.unwrap().has_seen_profile_prompt,
            Some(true)
        );
        assert_eq!(auth.prompt_seen_calls(), vec![user_id]);
    }

    #[tokio::test]
    async fn test_use_credit_increments_used_counter() {
        let billing = InMemoryBillingProvider::new();
        let user = make_user(Some(true));
        billing.seed_subscription(SubscriptionSnapshot {
            user_id: user.id,
            plan_id: "starter".to_string(),
            optimizations_total: 0,
            optimizations_used: 0,
            score_checks_total: 0,
            score_checks_used: 0,
            guided_builds_total: 2,
            guided_builds_used: 1,
            linkedin_messages_total: 0,
            linkedin_messages_used: 0,
        });

        billing.use_credit(user.id, CreditKind::GuidedBuild).await.unwrap();
        let snap = billing.get_user_subscription(user.id).await.unwrap().unwrap();
        assert_eq!(snap.guided_builds_used, 2);

        let err = billing
            .use_credit(user.id, CreditKind::GuidedBuild)
            .await
            .unwrap_err();
        assert_eq!(err.message_or("fallback"), "No credits remaining");
    }

    #[tokio::test]
    async fn test_generation_failure_still_records_call() {
        let ai = InMemoryResumeAi::new();
        ai.fail_generation("model overloaded");
        let request = GenerationRequest {
            resume_text: "Name: Ada\n".to_string(),
            target_description: "generic".to_string(),
            experience_level: crate::builder::ExperienceLevel::Fresher,
            full_name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: String::new(),
            linkedin: String::new(),
            github: String::new(),
        };
        assert!(ai.generate(&request).await.is_err());
        assert_eq!(ai.call_count(), 1);
    }
}
