#![allow(dead_code)]

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
    Pending,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Referral,
    Purchase,
    Refund,
    Bonus,
}

/// One row of the wallet ledger. `amount` is rupee-denominated on the wire
/// and may be negative for debits; conversion to paise happens in the
/// wallet summary, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount: f64,
    pub status: TransactionStatus,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub created_at: DateTime<Utc>,
}

/// A successfully applied coupon, stored verbatim from the collaborator
/// response. The server is the sole authority on coupon math; this crate
/// never recomputes the discount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponApplication {
    pub code: String,
    pub discount: i64,     // paise
    pub final_amount: i64, // paise
}

/// Core fields of a paid checkout, amounts in paise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub plan_id: String,
    pub amount: i64,
    pub currency: String,
}

/// Everything the "activate free subscription" mutation needs.
/// `plan_price` carries the pre-coupon, pre-wallet list price so the
/// backend can reconcile how a nonzero plan reached a zero grand total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeActivation {
    pub plan_id: String,
    pub user_id: Uuid,
    pub coupon_code: Option<String>,
    pub add_ons_total: i64,
    pub selected_add_ons: HashMap<String, u32>,
    pub plan_price: i64,
    pub wallet_deduction: i64,
}

/// Everything the "process payment" mutation needs. `access_token` must be
/// fetched immediately before submission; a missing token is an auth
/// failure, not a payment failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSubmission {
    pub payment: PaymentRequest,
    pub email: String,
    pub name: String,
    pub access_token: String,
    pub coupon_code: Option<String>,
    pub wallet_deduction: i64,
    pub add_ons_total: i64,
    pub selected_add_ons: HashMap<String, u32>,
}
