//! The application store. Owns session, entitlement snapshot, navigation,
//! the alert slot, and checkout state, with one async entry point per user
//! operation.
//!
//! Flow for gated tools: auth check → remaining-credit check → consume
//! credit → snapshot re-fetch → generate. The consume call strictly
//! completes before generation starts, and a generation failure after a
//! consumed credit does not restore it.
//!
//! Every failure terminates in the alert slot; nothing here panics or
//! returns an error to the caller.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::alert::{AlertAction, AlertDescriptor, AlertSlot};
use crate::checkout::CheckoutState;
use crate::errors::FlowError;
use crate::features::{
    decide_feature_access, is_feature_available, remaining_for_display, FeatureDecision,
    FeatureId, FEATURES,
};
use crate::models::payment::{
    CouponApplication, FreeActivation, PaymentRequest, PaymentSubmission, WalletTransaction,
};
use crate::models::subscription::{CreditKind, SubscriptionSnapshot};
use crate::nav::{AuthView, NavState, Page, ProfileMode};
use crate::providers::{
    AuthProvider, BillingProvider, GeneratedResume, GenerationRequest, ProviderResult, ResumeAi,
};
use crate::session::{reconcile_auth_gate, SessionState};
use crate::wallet::{self, WalletSummary};

pub struct App {
    auth: Arc<dyn AuthProvider>,
    billing: Arc<dyn BillingProvider>,
    ai: Arc<dyn ResumeAi>,

    pub session: SessionState,
    pub snapshot: Option<SubscriptionSnapshot>,
    pub wallet: Vec<WalletTransaction>,
    pub nav: NavState,
    pub alerts: AlertSlot,
    pub checkout: Option<CheckoutState>,
    /// Inline error for the auth modal's form, mirrored from the last failed
    /// sign-in/sign-up attempt.
    pub auth_error: Option<String>,
    /// Monotonic purchase-success counter the presentation layer watches to
    /// flash its transient notice.
    pub purchase_success_notices: u64,

    checkout_epoch: u64,
}

impl App {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        billing: Arc<dyn BillingProvider>,
        ai: Arc<dyn ResumeAi>,
    ) -> Self {
        App {
            auth,
            billing,
            ai,
            session: SessionState::default(),
            snapshot: None,
            wallet: Vec::new(),
            nav: NavState::default(),
            alerts: AlertSlot::default(),
            checkout: None,
            auth_error: None,
            purchase_success_notices: 0,
            checkout_epoch: 0,
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ────────────────────────────────────────────────────────────────────

    /// Pulls the current session from the auth collaborator. A fetch failure
    /// reads as signed out; the visitor can always retry by signing in.
    pub async fn refresh_session(&mut self) {
        match self.auth.get_session().await {
            Ok(auth_session) => {
                self.session = SessionState {
                    loading: false,
                    authenticated: auth_session.authenticated,
                    user: auth_session.user,
                };
            }
            Err(e) => {
                warn!("Session fetch failed, treating visitor as signed out: {e}");
                self.session = SessionState {
                    loading: false,
                    authenticated: false,
                    user: None,
                };
            }
        }
        self.after_session_change().await;
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> bool {
        match self.auth.sign_in(email, password).await {
            Ok(auth_session) => {
                info!("Signed in as {email}");
                self.auth_error = None;
                self.session = SessionState {
                    loading: false,
                    authenticated: auth_session.authenticated,
                    user: auth_session.user,
                };
                self.nav.close_auth();
                self.after_session_change().await;
                true
            }
            Err(e) => {
                let message = e.message_or("Invalid login credentials");
                warn!("Sign-in failed for {email}: {message}");
                self.auth_error = Some(message);
                false
            }
        }
    }

    pub async fn sign_up(&mut self, email: &str, password: &str, full_name: &str) -> bool {
        match self.auth.sign_up(email, password, full_name).await {
            Ok(auth_session) => {
                info!("Account created for {email}");
                self.auth_error = None;
                self.session = SessionState {
                    loading: false,
                    authenticated: auth_session.authenticated,
                    user: auth_session.user,
                };
                self.after_session_change().await;
                true
            }
            Err(e) => {
                let message = e.message_or("Could not create your account. Please try again.");
                warn!("Sign-up failed for {email}: {message}");
                self.auth_error = Some(message);
                false
            }
        }
    }

    /// Clears local state even when the collaborator call fails; a user who
    /// asked to leave is signed out locally no matter what.
    pub async fn log_out(&mut self) {
        if let Err(e) = self.auth.sign_out().await {
            warn!("Sign-out call failed, clearing local session anyway: {e}");
        }
        self.session = SessionState {
            loading: false,
            authenticated: false,
            user: None,
        };
        self.snapshot = None;
        self.wallet.clear();
        self.checkout = None;
        self.auth_error = None;

        // Overlays all reset; gated pages bounce back to home.
        let page = self.nav.page;
        self.nav = NavState::default();
        let gated = FEATURES
            .iter()
            .any(|f| f.page() == page && f.requires_auth());
        if !gated {
            self.nav.page = page;
        }
        info!("Signed out");
    }

    async fn after_session_change(&mut self) {
        reconcile_auth_gate(&self.session, &mut self.nav);
        if self.session.current_user().is_some() {
            self.refresh_subscription().await;
            self.refresh_wallet().await;
        } else {
            self.snapshot = None;
            self.wallet.clear();
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Auth modal and profile prompt
    // ────────────────────────────────────────────────────────────────────

    pub fn request_sign_in(&mut self) {
        self.auth_error = None;
        self.nav.open_auth(AuthView::Login);
        self.nav.mobile_menu_open = false;
    }

    /// "Skip for now" on the post-signup prompt.
    pub async fn dismiss_prompt(&mut self) {
        self.complete_profile_prompt().await;
    }

    pub fn request_profile_edit(&mut self, mode: ProfileMode, is_post_signup_context: bool) {
        self.nav.open_profile(mode, is_post_signup_context);
    }

    /// Closing a panel entered from the post-signup prompt also completes
    /// the prompt; otherwise the gate reconciliation would reopen the prompt
    /// the user just acted on.
    pub async fn close_profile_panel(&mut self) {
        if let Some(panel) = self.nav.close_profile() {
            if panel.post_signup_context {
                self.complete_profile_prompt().await;
            }
        }
    }

    /// Marks the prompt seen. The collaborator write is best-effort: its
    /// failure is reported through the alert slot, but the local flag flips
    /// regardless so the modal never traps the user.
    async fn complete_profile_prompt(&mut self) {
        if let Some(user_id) = self.session.user_id() {
            if let Err(e) = self.auth.mark_profile_prompt_seen(user_id).await {
                warn!("Profile-prompt flag update failed for user {user_id}: {e}");
                self.alerts.show(FlowError::Provider(e).to_alert());
            }
        }
        if let Some(user) = self.session.user.as_mut() {
            user.has_seen_profile_prompt = Some(true);
        }
        reconcile_auth_gate(&self.session, &mut self.nav);
    }

    // ────────────────────────────────────────────────────────────────────
    // Feature dispatch
    // ────────────────────────────────────────────────────────────────────

    /// Feature-card click. Signed-out visitors are sent to the login modal
    /// for gated tools; credit exhaustion never blocks navigation.
    pub fn open_feature(&mut self, feature: FeatureId) {
        match decide_feature_access(feature, &self.session) {
            FeatureDecision::Navigate(page) => self.nav.set_page(page),
            FeatureDecision::PromptSignIn => self.request_sign_in(),
        }
    }

    pub fn feature_available(&self, feature: FeatureId) -> bool {
        is_feature_available(feature, &self.session, self.snapshot.as_ref())
    }

    pub fn feature_remaining(&self, feature: FeatureId) -> Option<u32> {
        remaining_for_display(feature, &self.session, self.snapshot.as_ref())
    }

    // ────────────────────────────────────────────────────────────────────
    // Credit consumption and generation
    // ────────────────────────────────────────────────────────────────────

    /// Runs the point-of-use pipeline for one tool invocation:
    ///
    /// 1. require a signed-in user
    /// 2. require remaining credits in the current snapshot
    /// 3. consume one credit (failure aborts, generation never starts)
    /// 4. re-fetch the snapshot and surface the consumption notice
    /// 5. call the AI collaborator
    ///
    /// A generation failure after step 3 does not restore the credit; the
    /// refreshed snapshot keeps the server's count.
    pub async fn start_generation(
        &mut self,
        kind: CreditKind,
        request: &GenerationRequest,
    ) -> Option<GeneratedResume> {
        let Some(user) = self.session.current_user() else {
            self.alerts.show(FlowError::AuthRequired { kind }.to_alert());
            return None;
        };
        let user_id = user.id;

        let remaining = self
            .snapshot
            .as_ref()
            .map(|s| s.remaining_for(kind))
            .unwrap_or(0);
        if remaining == 0 {
            self.alerts
                .show(FlowError::EntitlementExhausted { kind }.to_alert());
            return None;
        }

        info!("Consuming one {} credit for user {user_id}", kind.display_name());
        if let Err(e) = self.billing.use_credit(user_id, kind).await {
            warn!("Credit consumption rejected for user {user_id}: {e}");
            self.alerts.show(AlertDescriptor::error(
                "Credit Error",
                &e.message_or("Failed to use credit. Please try again."),
            ));
            return None;
        }

        self.refresh_subscription().await;
        self.alerts.show(AlertDescriptor::success(
            "Success!",
            &format!(
                "One {} credit has been used. Generation is starting.",
                kind.display_name()
            ),
        ));

        match self.ai.generate(request).await {
            Ok(document) => {
                info!("Generation finished for user {user_id}");
                Some(document)
            }
            Err(e) => {
                warn!("Generation failed for user {user_id} after credit consumption: {e}");
                self.alerts.show(AlertDescriptor::error(
                    "Generation Failed",
                    "Failed to generate resume. Please try again.",
                ));
                None
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Snapshot and wallet refresh
    // ────────────────────────────────────────────────────────────────────

    /// Full snapshot re-fetch. Entitlements are server-authoritative; the
    /// flow never decrements counters locally.
    pub async fn refresh_subscription(&mut self) {
        let Some(user_id) = self.session.user_id() else {
            self.snapshot = None;
            return;
        };
        let fetched = match self.billing.get_user_subscription(user_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Subscription fetch failed for user {user_id}: {e}");
                None
            }
        };
        self.apply_subscription_snapshot(user_id, fetched);
    }

    /// Guarded write: a refresh that raced a sign-out or an account switch
    /// is dropped rather than applied to the wrong session.
    pub fn apply_subscription_snapshot(
        &mut self,
        for_user: Uuid,
        snapshot: Option<SubscriptionSnapshot>,
    ) {
        if self.session.user_id() != Some(for_user) {
            warn!("Dropping subscription snapshot for user {for_user}: session changed");
            return;
        }
        self.snapshot = snapshot;
    }

    pub async fn refresh_wallet(&mut self) {
        let Some(user_id) = self.session.user_id() else {
            self.wallet.clear();
            return;
        };
        let rows = match self.billing.get_wallet_transactions(user_id).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!("Wallet fetch failed for user {user_id}: {e}");
                Vec::new()
            }
        };
        self.apply_wallet_rows(user_id, rows);
    }

    pub fn apply_wallet_rows(&mut self, for_user: Uuid, rows: Vec<WalletTransaction>) {
        if self.session.user_id() != Some(for_user) {
            warn!("Dropping wallet rows for user {for_user}: session changed");
            return;
        }
        self.wallet = rows;
    }

    pub fn wallet_summary(&self) -> WalletSummary {
        wallet::summarize(&self.wallet)
    }

    // ────────────────────────────────────────────────────────────────────
    // Checkout
    // ────────────────────────────────────────────────────────────────────

    /// Opens the plans overlay: plan catalog, add-on catalog, and wallet
    /// balance. The plan fetch is load-bearing; add-ons and wallet degrade
    /// to empty on failure.
    pub async fn open_checkout(&mut self) {
        self.checkout_epoch += 1;
        let epoch = self.checkout_epoch;

        let plans = match self.billing.get_plans().await {
            Ok(plans) => plans,
            Err(e) => {
                error!("Plan catalog fetch failed: {e}");
                self.alerts.show(FlowError::Provider(e).to_alert());
                return;
            }
        };
        let add_ons = match self.billing.get_add_ons().await {
            Ok(add_ons) => add_ons,
            Err(e) => {
                warn!("Add-on catalog fetch failed, continuing without add-ons: {e}");
                Vec::new()
            }
        };
        self.refresh_wallet().await;
        let balance = wallet::balance_paise(&self.wallet);

        self.checkout = Some(CheckoutState::new(plans, add_ons, balance, epoch));
        info!("Checkout opened (epoch {epoch})");
    }

    /// Navigating away abandons selections.
    pub fn close_checkout(&mut self) {
        if self.checkout.take().is_some() {
            debug!("Checkout discarded");
        }
    }

    pub fn select_plan(&mut self, plan_id: &str) {
        if let Some(checkout) = self.checkout.as_mut() {
            checkout.select_plan(plan_id);
        }
    }

    pub fn set_add_on_quantity(&mut self, add_on_id: &str, quantity: u32) {
        if let Some(checkout) = self.checkout.as_mut() {
            checkout.set_add_on_quantity(add_on_id, quantity);
        }
    }

    pub fn set_use_wallet(&mut self, on: bool) {
        if let Some(checkout) = self.checkout.as_mut() {
            checkout.set_use_wallet(on);
        }
    }

    pub fn proceed_to_review(&mut self) {
        if let Some(checkout) = self.checkout.as_mut() {
            checkout.proceed_to_review();
        }
    }

    pub fn back_to_plans(&mut self) {
        if let Some(checkout) = self.checkout.as_mut() {
            checkout.back_to_plans();
        }
    }

    pub fn remove_coupon(&mut self) {
        if let Some(checkout) = self.checkout.as_mut() {
            checkout.remove_coupon();
        }
    }

    /// Submits the raw code for the selected plan. No-op without an open
    /// checkout, a selected plan, or a non-empty code.
    pub async fn apply_coupon(&mut self, raw_code: &str) {
        let code = raw_code.trim().to_string();
        if code.is_empty() {
            return;
        }
        let Some(checkout) = self.checkout.as_ref() else {
            return;
        };
        let Some(plan) = checkout.selected_plan() else {
            return;
        };
        let epoch = checkout.epoch;
        let plan_id = plan.id.clone();
        let user_id = self.session.user_id();

        let result = self.billing.apply_coupon(&plan_id, &code, user_id).await;
        self.apply_coupon_outcome(epoch, result);
    }

    /// Epoch-guarded half of coupon application: a response that arrives for
    /// a checkout the user already discarded is dropped, never applied to a
    /// newer one.
    pub fn apply_coupon_outcome(
        &mut self,
        epoch: u64,
        result: ProviderResult<CouponApplication>,
    ) {
        let Some(checkout) = self.checkout.as_mut() else {
            warn!("Dropping coupon response: checkout closed");
            return;
        };
        if checkout.epoch != epoch {
            warn!(
                "Dropping coupon response for epoch {epoch}: current epoch is {}",
                checkout.epoch
            );
            return;
        }
        match result {
            Ok(coupon) => {
                let message = format!(
                    "Coupon \"{}\" applied successfully. You saved ₹{:.2}!",
                    coupon.code,
                    coupon.discount as f64 / 100.0
                );
                info!("Coupon {} applied: final amount {} paise", coupon.code, coupon.final_amount);
                checkout.apply_coupon_result(coupon);
                self.alerts
                    .show(AlertDescriptor::success("Coupon Applied!", &message));
            }
            Err(e) => {
                let message =
                    e.message_or("Invalid coupon code or not applicable to selected plan");
                checkout.reject_coupon(message.clone());
                self.alerts
                    .show(AlertDescriptor::warning("Coupon Error", &message));
            }
        }
    }

    /// Payment submission from the review step. A zero grand total routes to
    /// the free-activation mutation; anything else goes through the payment
    /// mutation in INR with an access token fetched immediately beforehand.
    /// Failures leave the review step intact for another attempt.
    pub async fn submit_payment(&mut self) {
        let Some(checkout) = self.checkout.as_ref() else {
            return;
        };
        let Some(plan) = checkout.selected_plan() else {
            return;
        };

        let epoch = checkout.epoch;
        let pricing = checkout.pricing();
        let plan_id = plan.id.clone();
        let plan_price = plan.price_paise();
        let coupon_code = checkout.coupon.as_ref().map(|c| c.code.clone());
        let selected_add_ons = checkout.add_on_quantities.clone();

        let Some(user) = self.session.current_user() else {
            self.alerts.show(FlowError::StaleSession.to_alert());
            return;
        };
        let user_id = user.id;
        let email = user.email.clone();
        let name = user.name.clone();

        let access_token = match self.auth.get_access_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("Payment blocked: no live access token for user {user_id}");
                self.alerts.show(FlowError::StaleSession.to_alert());
                return;
            }
            Err(e) => {
                error!("Access token fetch failed for user {user_id}: {e}");
                self.alerts.show(FlowError::StaleSession.to_alert());
                return;
            }
        };

        let outcome = if pricing.grand_total == 0 {
            info!("Submitting free activation of plan {plan_id} for user {user_id}");
            let activation = FreeActivation {
                plan_id,
                user_id,
                coupon_code,
                add_ons_total: pricing.add_ons_total,
                selected_add_ons,
                plan_price,
                wallet_deduction: pricing.wallet_deduction,
            };
            self.billing
                .process_free_subscription(&activation)
                .await
                .map(|()| {
                    AlertDescriptor::success(
                        "Subscription Activated!",
                        "Your free plan has been activated successfully.",
                    )
                })
                .map_err(|e| {
                    AlertDescriptor::error(
                        "Activation Failed",
                        &e.message_or("Failed to activate free plan."),
                    )
                })
        } else {
            info!(
                "Submitting payment of {} paise for plan {plan_id} by user {user_id}",
                pricing.grand_total
            );
            let submission = PaymentSubmission {
                payment: PaymentRequest {
                    plan_id,
                    amount: pricing.grand_total,
                    currency: "INR".to_string(),
                },
                email,
                name,
                access_token,
                coupon_code,
                wallet_deduction: pricing.wallet_deduction,
                add_ons_total: pricing.add_ons_total,
                selected_add_ons,
            };
            self.billing
                .process_payment(&submission)
                .await
                .map(|()| {
                    AlertDescriptor::success(
                        "Payment Successful!",
                        "Your subscription has been activated.",
                    )
                })
                .map_err(|e| {
                    AlertDescriptor::error(
                        "Payment Failed",
                        &e.message_or("Payment processing failed. Please try again."),
                    )
                })
        };

        match outcome {
            Ok(alert) => {
                self.alerts.show(alert);
                self.finish_purchase(epoch).await;
            }
            Err(alert) => {
                self.alerts.show(alert);
            }
        }
    }

    /// Post-purchase effects: the checkout that produced the purchase is
    /// discarded (epoch-guarded so a newer one survives), the success notice
    /// counter bumps, and both server-derived views re-fetch.
    async fn finish_purchase(&mut self, epoch: u64) {
        if self.checkout.as_ref().map(|c| c.epoch) == Some(epoch) {
            self.checkout = None;
        } else {
            warn!("Purchase completed for a discarded checkout (epoch {epoch})");
        }
        self.purchase_success_notices += 1;
        self.refresh_subscription().await;
        self.refresh_wallet().await;
    }

    // ────────────────────────────────────────────────────────────────────
    // Navigation and alerts
    // ────────────────────────────────────────────────────────────────────

    pub fn change_page(&mut self, page: Page) {
        self.nav.set_page(page);
    }

    pub fn toggle_mobile_menu(&mut self) {
        self.nav.toggle_mobile_menu();
    }

    pub fn open_tutorial(&mut self, tool: FeatureId) {
        self.nav.open_tutorial(tool);
    }

    pub fn close_tutorial(&mut self) {
        self.nav.close_tutorial();
    }

    pub fn acknowledge_alert(&mut self) {
        self.alerts.acknowledge();
    }

    /// Runs the live alert's action button. The alert closes as part of
    /// taking the action.
    pub async fn run_alert_action(&mut self) {
        match self.alerts.take_action() {
            Some(AlertAction::ShowSignIn) => self.request_sign_in(),
            Some(AlertAction::ShowPlans) => self.open_checkout().await,
            None => {}
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::AlertSeverity;
    use crate::builder::GuidedBuilderForm;
    use crate::checkout::CheckoutStep;
    use crate::models::payment::{TransactionKind, TransactionStatus};
    use crate::models::subscription::Plan;
    use crate::models::user::User;
    use crate::providers::memory::{
        InMemoryAuthProvider, InMemoryBillingProvider, InMemoryResumeAi,
    };
    use crate::session::test_support::make_user;
    use chrono::Utc;

    struct Harness {
        app: App,
        auth: InMemoryAuthProvider,
        billing: InMemoryBillingProvider,
        ai: InMemoryResumeAi,
    }

    fn harness() -> Harness {
        let auth = InMemoryAuthProvider::new();
        let billing = InMemoryBillingProvider::new();
        let ai = InMemoryResumeAi::new();
        let app = App::new(
            Arc::new(auth.clone()),
            Arc::new(billing.clone()),
            Arc::new(ai.clone()),
        );
        Harness {
            app,
            auth,
            billing,
            ai,
        }
    }

    async fn sign_in_app(h: &mut Harness, user: &User) {
        h.auth.seed_signed_in(user.clone());
        h.app.refresh_session().await;
    }

    fn snapshot_for(user_id: Uuid, kind: CreditKind, total: u32, used: u32) -> SubscriptionSnapshot {
        let mut snap = SubscriptionSnapshot {
            user_id,
            plan_id: "career_boost_plus".to_string(),
            optimizations_total: 0,
            optimizations_used: 0,
            score_checks_total: 0,
            score_checks_used: 0,
            guided_builds_total: 0,
            guided_builds_used: 0,
            linkedin_messages_total: 0,
            linkedin_messages_used: 0,
        };
        match kind {
            CreditKind::Optimization => {
                snap.optimizations_total = total;
                snap.optimizations_used = used;
            }
            CreditKind::ScoreCheck => {
                snap.score_checks_total = total;
                snap.score_checks_used = used;
            }
            CreditKind::GuidedBuild => {
                snap.guided_builds_total = total;
                snap.guided_builds_used = used;
            }
            CreditKind::LinkedinMessage => {
                snap.linkedin_messages_total = total;
                snap.linkedin_messages_used = used;
            }
        }
        snap
    }

    fn make_plan(id: &str, price: f64) -> Plan {
        Plan {
            id: id.to_string(),
            name: id.to_string(),
            price,
            duration: "1 month".to_string(),
            optimizations: 10,
            score_checks: 5,
            guided_builds: 3,
            linkedin_messages: 5,
            popular: false,
        }
    }

    fn make_request() -> GenerationRequest {
        GuidedBuilderForm::new(None).generation_request()
    }

    fn completed_row(user_id: Uuid, amount: f64) -> WalletTransaction {
        WalletTransaction {
            id: Uuid::new_v4(),
            user_id,
            amount,
            status: TransactionStatus::Completed,
            kind: TransactionKind::Bonus,
            created_at: Utc::now(),
        }
    }

    async fn open_review_for_plan(h: &mut Harness, plan_id: &str) {
        h.app.open_checkout().await;
        h.app.select_plan(plan_id);
        h.app.proceed_to_review();
    }

    // ── feature dispatch ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_gated_feature_signed_out_opens_login_instead_of_navigating() {
        let mut h = harness();
        h.app.refresh_session().await;

        h.app.open_feature(FeatureId::ScoreChecker);

        assert_eq!(h.app.nav.page, Page::Home);
        assert!(h.app.nav.auth_modal_open);
        assert_eq!(h.app.nav.auth_view, AuthView::Login);
        assert!(!h.app.alerts.is_open());
        assert!(h.billing.credit_calls().is_empty());
        assert_eq!(h.ai.call_count(), 0);
    }

    #[tokio::test]
    async fn test_optimizer_navigates_while_signed_out() {
        let mut h = harness();
        h.app.refresh_session().await;

        h.app.open_feature(FeatureId::Optimizer);

        assert_eq!(h.app.nav.page, Page::Optimizer);
        assert!(!h.app.alerts.is_open());
    }

    #[tokio::test]
    async fn test_sign_in_alert_action_opens_login_modal() {
        let mut h = harness();
        h.app.refresh_session().await;
        let result = h
            .app
            .start_generation(CreditKind::GuidedBuild, &make_request())
            .await;
        assert!(result.is_none());
        assert_eq!(
            h.app.alerts.current().map(|a| a.action),
            Some(Some(AlertAction::ShowSignIn))
        );

        h.app.run_alert_action().await;

        assert!(h.app.nav.auth_modal_open);
        assert_eq!(h.app.nav.auth_view, AuthView::Login);
        assert!(!h.app.alerts.is_open());
    }

    // ── credit consumption pipeline ─────────────────────────────────────

    #[tokio::test]
    async fn test_generation_consumes_credit_then_generates() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing
            .seed_subscription(snapshot_for(user.id, CreditKind::GuidedBuild, 3, 0));
        sign_in_app(&mut h, &user).await;

        let result = h
            .app
            .start_generation(CreditKind::GuidedBuild, &make_request())
            .await;

        assert!(result.is_some());
        assert_eq!(
            h.billing.credit_calls(),
            vec![(user.id, CreditKind::GuidedBuild)]
        );
        assert_eq!(h.ai.call_count(), 1);
        // Snapshot shows the server's count, re-fetched rather than locally
        // decremented.
        assert_eq!(h.app.snapshot.as_ref().unwrap().guided_builds_used, 1);
        let alert = h.app.alerts.current().unwrap();
        assert_eq!(alert.title, "Success!");
        assert!(alert.message.contains("guided build"));
    }

    #[tokio::test]
    async fn test_generation_requires_authentication() {
        let mut h = harness();
        h.app.refresh_session().await;

        let result = h
            .app
            .start_generation(CreditKind::ScoreCheck, &make_request())
            .await;

        assert!(result.is_none());
        assert_eq!(h.ai.call_count(), 0);
        assert_eq!(
            h.app.alerts.current().unwrap().action,
            Some(AlertAction::ShowSignIn)
        );
    }

    #[tokio::test]
    async fn test_exhausted_credits_block_before_consume_call() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing
            .seed_subscription(snapshot_for(user.id, CreditKind::GuidedBuild, 3, 3));
        sign_in_app(&mut h, &user).await;

        let result = h
            .app
            .start_generation(CreditKind::GuidedBuild, &make_request())
            .await;

        assert!(result.is_none());
        assert!(h.billing.credit_calls().is_empty());
        assert_eq!(h.ai.call_count(), 0);
        let alert = h.app.alerts.current().unwrap();
        assert_eq!(alert.title, "Credits Exhausted");
        assert_eq!(alert.action, Some(AlertAction::ShowPlans));
    }

    #[tokio::test]
    async fn test_failed_consume_aborts_without_generation() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing
            .seed_subscription(snapshot_for(user.id, CreditKind::GuidedBuild, 3, 0));
        h.billing.fail_credit_use("Credit deduction failed");
        sign_in_app(&mut h, &user).await;

        let result = h
            .app
            .start_generation(CreditKind::GuidedBuild, &make_request())
            .await;

        assert!(result.is_none());
        assert_eq!(h.ai.call_count(), 0, "generation must never start");
        let alert = h.app.alerts.current().unwrap();
        assert_eq!(alert.title, "Credit Error");
        assert_eq!(alert.message, "Credit deduction failed");
    }

    #[tokio::test]
    async fn test_generation_failure_keeps_credit_spent() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing
            .seed_subscription(snapshot_for(user.id, CreditKind::GuidedBuild, 3, 0));
        h.ai.fail_generation("model overloaded");
        sign_in_app(&mut h, &user).await;

        let result = h
            .app
            .start_generation(CreditKind::GuidedBuild, &make_request())
            .await;

        assert!(result.is_none());
        let alert = h.app.alerts.current().unwrap();
        assert_eq!(alert.title, "Generation Failed");
        assert_eq!(alert.message, "Failed to generate resume. Please try again.");
        // No rollback: the consumed credit stays consumed.
        assert_eq!(h.billing.credit_calls().len(), 1);
        assert_eq!(h.app.snapshot.as_ref().unwrap().guided_builds_used, 1);
    }

    #[tokio::test]
    async fn test_exhausted_alert_action_opens_plans_overlay() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing
            .seed_subscription(snapshot_for(user.id, CreditKind::Optimization, 1, 1));
        h.billing.seed_plans(vec![make_plan("starter", 499.0)]);
        sign_in_app(&mut h, &user).await;

        h.app
            .start_generation(CreditKind::Optimization, &make_request())
            .await;
        h.app.run_alert_action().await;

        assert!(h.app.checkout.is_some());
        assert!(!h.app.alerts.is_open());
    }

    // ── stale-state guards ──────────────────────────────────────────────

    #[tokio::test]
    async fn test_snapshot_refresh_after_sign_out_is_dropped() {
        let mut h = harness();
        let user = make_user(Some(true));
        sign_in_app(&mut h, &user).await;
        h.app.log_out().await;

        h.app.apply_subscription_snapshot(
            user.id,
            Some(snapshot_for(user.id, CreditKind::Optimization, 10, 0)),
        );

        assert!(h.app.snapshot.is_none(), "stale refresh must not resurrect entitlements");
    }

    #[tokio::test]
    async fn test_wallet_rows_for_another_user_are_dropped() {
        let mut h = harness();
        let user = make_user(Some(true));
        sign_in_app(&mut h, &user).await;

        let stranger = Uuid::new_v4();
        h.app
            .apply_wallet_rows(stranger, vec![completed_row(stranger, 500.0)]);

        assert_eq!(h.app.wallet_summary().balance_paise, 0);
    }

    #[tokio::test]
    async fn test_stale_coupon_response_is_dropped() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing.seed_plans(vec![make_plan("starter", 499.0)]);
        sign_in_app(&mut h, &user).await;

        h.app.open_checkout().await;
        let stale_epoch = h.app.checkout.as_ref().unwrap().epoch;
        h.app.close_checkout();
        h.app.open_checkout().await;
        h.app.select_plan("starter");

        h.app.apply_coupon_outcome(
            stale_epoch,
            Ok(CouponApplication {
                code: "SAVE200".to_string(),
                discount: 20000,
                final_amount: 29900,
            }),
        );

        let checkout = h.app.checkout.as_ref().unwrap();
        assert_eq!(checkout.coupon, None);
        assert!(!h.app.alerts.is_open());
    }

    // ── checkout and payment ────────────────────────────────────────────

    #[tokio::test]
    async fn test_payment_success_discards_checkout_and_notifies() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing
            .seed_plans(vec![make_plan("career_boost_plus", 999.0)]);
        sign_in_app(&mut h, &user).await;

        open_review_for_plan(&mut h, "career_boost_plus").await;
        h.app.submit_payment().await;

        let submissions = h.billing.payments();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].payment.amount, 99900);
        assert_eq!(submissions[0].payment.currency, "INR");
        assert!(!submissions[0].access_token.is_empty());
        assert_eq!(submissions[0].email, user.email);

        assert!(h.app.checkout.is_none(), "success exits checkout");
        assert_eq!(h.app.purchase_success_notices, 1);
        assert_eq!(h.app.alerts.current().unwrap().title, "Payment Successful!");
    }

    #[tokio::test]
    async fn test_zero_grand_total_routes_to_free_activation() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing
            .seed_plans(vec![make_plan("career_boost_plus", 999.0)]);
        h.billing.seed_coupon(CouponApplication {
            code: "FREE100".to_string(),
            discount: 99900,
            final_amount: 0,
        });
        sign_in_app(&mut h, &user).await;

        h.app.open_checkout().await;
        h.app.select_plan("career_boost_plus");
        h.app.apply_coupon("FREE100").await;
        h.app.proceed_to_review();
        h.app.submit_payment().await;

        assert!(h.billing.payments().is_empty());
        let activations = h.billing.free_activations();
        assert_eq!(activations.len(), 1);
        assert_eq!(activations[0].coupon_code.as_deref(), Some("FREE100"));
        assert_eq!(activations[0].plan_price, 99900);
        assert_eq!(
            h.app.alerts.current().unwrap().title,
            "Subscription Activated!"
        );
        assert!(h.app.checkout.is_none());
    }

    #[tokio::test]
    async fn test_missing_token_is_auth_failure_not_payment_failure() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing.seed_plans(vec![make_plan("starter", 499.0)]);
        sign_in_app(&mut h, &user).await;

        open_review_for_plan(&mut h, "starter").await;
        h.auth.set_access_token(None);
        h.app.submit_payment().await;

        assert!(h.billing.payments().is_empty());
        let alert = h.app.alerts.current().unwrap();
        assert_eq!(alert.title, "Authentication Required");
        assert_eq!(alert.severity, AlertSeverity::Error);
        // Still in review, ready for a retry after re-login.
        let checkout = h.app.checkout.as_ref().unwrap();
        assert_eq!(checkout.step, CheckoutStep::PaymentReview);
    }

    #[tokio::test]
    async fn test_token_fetch_error_reads_as_auth_failure() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing.seed_plans(vec![make_plan("starter", 499.0)]);
        sign_in_app(&mut h, &user).await;

        open_review_for_plan(&mut h, "starter").await;
        h.auth.fail_token_fetch("session lookup failed");
        h.app.submit_payment().await;

        // No token could be produced, so this is an auth problem, not a
        // payment one.
        assert!(h.billing.payments().is_empty());
        let alert = h.app.alerts.current().unwrap();
        assert_eq!(alert.title, "Authentication Required");
        assert_eq!(alert.message, "Please log in to complete your purchase.");
        let checkout = h.app.checkout.as_ref().unwrap();
        assert_eq!(checkout.step, CheckoutStep::PaymentReview);
    }

    #[tokio::test]
    async fn test_payment_failure_stays_in_review_with_state_intact() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing.seed_plans(vec![make_plan("starter", 499.0)]);
        h.billing.fail_payments("Card declined");
        sign_in_app(&mut h, &user).await;

        open_review_for_plan(&mut h, "starter").await;
        h.app.submit_payment().await;

        let alert = h.app.alerts.current().unwrap();
        assert_eq!(alert.title, "Payment Failed");
        assert_eq!(alert.message, "Card declined");
        let checkout = h.app.checkout.as_ref().unwrap();
        assert_eq!(checkout.step, CheckoutStep::PaymentReview);
        assert_eq!(checkout.selected_plan_id.as_deref(), Some("starter"));
        assert_eq!(h.app.purchase_success_notices, 0);
    }

    #[tokio::test]
    async fn test_wallet_deduction_rides_along_on_payment() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing.seed_plans(vec![make_plan("starter", 499.0)]);
        h.billing
            .seed_transactions(user.id, vec![completed_row(user.id, 300.0)]);
        sign_in_app(&mut h, &user).await;

        h.app.open_checkout().await;
        h.app.select_plan("starter");
        h.app.set_use_wallet(true);
        h.app.proceed_to_review();
        h.app.submit_payment().await;

        let submissions = h.billing.payments();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].wallet_deduction, 30000);
        assert_eq!(submissions[0].payment.amount, 49900 - 30000);
    }

    #[tokio::test]
    async fn test_coupon_success_alert_reports_rupee_savings() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing
            .seed_plans(vec![make_plan("career_boost_plus", 999.0)]);
        h.billing.seed_coupon(CouponApplication {
            code: "SAVE200".to_string(),
            discount: 20000,
            final_amount: 79900,
        });
        sign_in_app(&mut h, &user).await;

        h.app.open_checkout().await;
        h.app.select_plan("career_boost_plus");
        h.app.apply_coupon("SAVE200").await;

        let checkout = h.app.checkout.as_ref().unwrap();
        assert!(checkout.coupon.is_some());
        let alert = h.app.alerts.current().unwrap();
        assert_eq!(alert.title, "Coupon Applied!");
        assert!(alert.message.contains("₹200.00"), "message: {}", alert.message);
    }

    #[tokio::test]
    async fn test_coupon_rejection_warns_and_keeps_checkout() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing.seed_plans(vec![make_plan("starter", 499.0)]);
        sign_in_app(&mut h, &user).await;

        h.app.open_checkout().await;
        h.app.select_plan("starter");
        h.app.apply_coupon("BOGUS").await;

        let checkout = h.app.checkout.as_ref().unwrap();
        assert_eq!(checkout.coupon, None);
        assert_eq!(
            checkout.coupon_error.as_deref(),
            Some("Invalid coupon code or not applicable to selected plan")
        );
        let alert = h.app.alerts.current().unwrap();
        assert_eq!(alert.title, "Coupon Error");
        assert_eq!(alert.severity, AlertSeverity::Warning);
    }

    #[tokio::test]
    async fn test_blank_coupon_code_is_ignored() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing.seed_plans(vec![make_plan("starter", 499.0)]);
        sign_in_app(&mut h, &user).await;

        h.app.open_checkout().await;
        h.app.select_plan("starter");
        h.app.apply_coupon("   ").await;

        assert!(!h.app.alerts.is_open());
        assert_eq!(h.app.checkout.as_ref().unwrap().coupon_error, None);
    }

    // ── session lifecycle ───────────────────────────────────────────────

    #[tokio::test]
    async fn test_refresh_session_loads_snapshot_and_wallet() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing
            .seed_subscription(snapshot_for(user.id, CreditKind::Optimization, 10, 2));
        h.billing
            .seed_transactions(user.id, vec![completed_row(user.id, 150.0)]);
        sign_in_app(&mut h, &user).await;

        assert!(h.app.session.authenticated);
        assert_eq!(h.app.snapshot.as_ref().unwrap().optimizations_used, 2);
        assert_eq!(h.app.wallet_summary().balance_paise, 15000);
    }

    #[tokio::test]
    async fn test_sign_up_forces_post_signup_prompt() {
        let mut h = harness();
        h.app.refresh_session().await;

        let ok = h.app.sign_up("new@example.com", "hunter2", "New Person").await;

        assert!(ok);
        assert!(h.app.nav.auth_modal_open);
        assert_eq!(h.app.nav.auth_view, AuthView::PostSignupPrompt);
    }

    #[tokio::test]
    async fn test_sign_in_failure_sets_inline_error() {
        let mut h = harness();
        h.auth
            .seed_account("ada@example.com", "right", make_user(Some(true)));
        h.app.refresh_session().await;

        let ok = h.app.sign_in("ada@example.com", "wrong").await;

        assert!(!ok);
        assert!(!h.app.session.authenticated);
        assert_eq!(
            h.app.auth_error.as_deref(),
            Some("Invalid login credentials")
        );
    }

    #[tokio::test]
    async fn test_dismiss_prompt_marks_seen_and_closes_modal() {
        let mut h = harness();
        let user = make_user(Some(false));
        sign_in_app(&mut h, &user).await;
        assert_eq!(h.app.nav.auth_view, AuthView::PostSignupPrompt);

        h.app.dismiss_prompt().await;

        assert!(!h.app.nav.auth_modal_open);
        assert_eq!(h.auth.prompt_seen_calls(), vec![user.id]);
        assert_eq!(
            h.app.session.user.as_ref().unwrap().has_seen_profile_prompt,
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_prompt_dismissal_survives_collaborator_failure() {
        let mut h = harness();
        let user = make_user(Some(false));
        h.auth.fail_prompt_seen("update rejected");
        sign_in_app(&mut h, &user).await;

        h.app.dismiss_prompt().await;

        // The failure is reported, but the modal still closes; the user is
        // never trapped behind the prompt.
        assert!(!h.app.nav.auth_modal_open);
        assert_eq!(h.app.alerts.current().unwrap().title, "Request Failed");
        assert_eq!(
            h.app.session.user.as_ref().unwrap().has_seen_profile_prompt,
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_profile_close_in_post_signup_context_completes_prompt() {
        let mut h = harness();
        let user = make_user(Some(false));
        sign_in_app(&mut h, &user).await;

        h.app.request_profile_edit(ProfileMode::Profile, true);
        h.app.close_profile_panel().await;

        assert_eq!(h.app.nav.profile_panel, None);
        assert!(!h.app.nav.auth_modal_open);
        assert_eq!(h.auth.prompt_seen_calls(), vec![user.id]);
    }

    #[tokio::test]
    async fn test_plain_profile_close_leaves_prompt_flag_alone() {
        let mut h = harness();
        let user = make_user(Some(true));
        sign_in_app(&mut h, &user).await;

        h.app.request_profile_edit(ProfileMode::Wallet, false);
        h.app.close_profile_panel().await;

        assert_eq!(h.app.nav.profile_panel, None);
        assert!(h.auth.prompt_seen_calls().is_empty());
    }

    #[tokio::test]
    async fn test_log_out_clears_entitlements_and_leaves_gated_page() {
        let mut h = harness();
        let user = make_user(Some(true));
        h.billing
            .seed_subscription(snapshot_for(user.id, CreditKind::ScoreCheck, 5, 0));
        sign_in_app(&mut h, &user).await;
        h.app.open_feature(FeatureId::ScoreChecker);
        assert_eq!(h.app.nav.page, Page::ScoreChecker);

        h.app.log_out().await;

        assert!(!h.app.session.authenticated);
        assert!(h.app.snapshot.is_none());
        assert_eq!(h.app.wallet_summary().balance_paise, 0);
        assert_eq!(h.app.nav.page, Page::Home);
    }

    #[tokio::test]
    async fn test_log_out_keeps_ungated_page() {
        let mut h = harness();
        let user = make_user(Some(true));
        sign_in_app(&mut h, &user).await;
        h.app.change_page(Page::About);

        h.app.log_out().await;

        assert_eq!(h.app.nav.page, Page::About);
    }
}
