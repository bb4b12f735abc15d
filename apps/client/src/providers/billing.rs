//! HTTP implementation of the payment/subscription collaborator.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::errors::ProviderError;
use crate::models::payment::{
    CouponApplication, FreeActivation, PaymentRequest, PaymentSubmission, WalletTransaction,
};
use crate::models::subscription::{AddOn, CreditKind, Plan, SubscriptionSnapshot};
use crate::providers::{rejection_from, Ack, BillingProvider, ProviderResult};

#[derive(Clone)]
pub struct HttpBillingProvider {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct ApplyCouponRequest<'a> {
    plan_id: &'a str,
    code: &'a str,
    user_id: Option<Uuid>,
}

/// Success and failure share one response shape; `coupon_applied` echoes
/// the code back when the coupon took.
#[derive(Debug, Deserialize)]
struct ApplyCouponResponse {
    coupon_applied: Option<String>,
    #[serde(default)]
    discount_amount: i64,
    #[serde(default)]
    final_amount: i64,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct UseCreditRequest {
    user_id: Uuid,
    kind: CreditKind,
}

/// Payment wire body. The access token travels as the bearer credential,
/// not in the body.
#[derive(Debug, Serialize)]
struct ProcessPaymentRequest<'a> {
    payment: &'a PaymentRequest,
    email: &'a str,
    name: &'a str,
    coupon_code: Option<&'a str>,
    wallet_deduction: i64,
    add_ons_total: i64,
    selected_add_ons: &'a HashMap<String, u32>,
}

impl HttpBillingProvider {
    pub fn new(base_url: String, api_key: String) -> Self {
        HttpBillingProvider {
            http: Client::new(),
            base_url,
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/billing/v1/{path}", self.base_url.trim_end_matches('/'))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> ProviderResult<T> {
        let response = self
            .http
            .get(self.url(path))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection_from(response).await);
        }
        Ok(response.json::<T>().await?)
    }

    async fn post_ack(&self, path: &str, body: &impl Serialize) -> ProviderResult<()> {
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
        response.json::<Ack>().await?.into_result()
    }
}

#[async_trait]
impl BillingProvider for HttpBillingProvider {
    async fn get_plans(&self) -> ProviderResult<Vec<Plan>> {
        self.get_json("plans").await
    }

    async fn get_add_ons(&self) -> ProviderResult<Vec<AddOn>> {
        self.get_json("add-ons").await
    }

    async fn get_user_subscription(
        &self,
        user_id: Uuid,
    ) -> ProviderResult<Option<SubscriptionSnapshot>> {
        let response = self
            .http
            .get(self.url(&format!("subscriptions/{user_id}")))
            .bearer_auth(&self.api_key)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(rejection_from(response).await);
        }
        let snapshot: SubscriptionSnapshot = response.json().await?;
        debug!(
            "Subscription snapshot fetched for user {user_id} (plan: {})",
            snapshot.plan_id
        );
        Ok(Some(snapshot))
    }

    async fn get_wallet_transactions(
        &self,
        user_id: Uuid,
    ) -> ProviderResult<Vec<WalletTransaction>> {
        self.get_json(&format!("wallet/{user_id}/transactions")).await
    }

    async fn apply_coupon(
        &self,
        plan_id: &str,
        code: &str,
        user_id: Option<Uuid>,
    ) -> ProviderResult<CouponApplication> {
        let response = self
            .http
            .post(self.url("coupons/apply"))
            .bearer_auth(&self.api_key)
            .json(&ApplyCouponRequest {
                plan_id,
                code,
                user_id,
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection_from(response).await);
        }
        let outcome: ApplyCouponResponse = response.json().await?;
        match outcome.coupon_applied {
            Some(applied_code) => Ok(CouponApplication {
                code: applied_code,
                discount: outcome.discount_amount,
                final_amount: outcome.final_amount,
            }),
            None => Err(ProviderError::rejected(outcome.error.unwrap_or_default())),
        }
    }

    async fn use_credit(&self, user_id: Uuid, kind: CreditKind) -> ProviderResult<()> {
        self.post_ack("credits/use", &UseCreditRequest { user_id, kind })
            .await
    }

    async fn process_free_subscription(&self, activation: &FreeActivation) -> ProviderResult<()> {
        self.post_ack("subscriptions/activate-free", activation).await
    }

    async fn process_payment(&self, submission: &PaymentSubmission) -> ProviderResult<()> {
        let body = ProcessPaymentRequest {
            payment: &submission.payment,
            email: &submission.email,
            name: &submission.name,
            coupon_code: submission.coupon_code.as_deref(),
            wallet_deduction: submission.wallet_deduction,
            add_ons_total: submission.add_ons_total,
            selected_add_ons: &submission.selected_add_ons,
        };
        let response = self
            .http
            .post(self.url("payments"))
            .bearer_auth(&submission.access_token)
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(rejection_from(response).await);
        }
        response.json::<Ack>().await?.into_result()
    }
}

impl std::fmt::Debug for HttpBillingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBillingProvider")
            .field("base_url", &self.base_url)
            .finish()
    }
}
