#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The four independently metered credit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditKind {
    Optimization,
    ScoreCheck,
    GuidedBuild,
    LinkedinMessage,
}

impl CreditKind {
    /// Singular noun used in alert copy ("You have no guided build credits...").
    pub fn display_name(&self) -> &'static str {
        match self {
            CreditKind::Optimization => "optimization",
            CreditKind::ScoreCheck => "score check",
            CreditKind::GuidedBuild => "guided build",
            CreditKind::LinkedinMessage => "LinkedIn message",
        }
    }

    /// Verb phrase used in sign-in prompts ("You must be logged in to ...").
    pub fn action_phrase(&self) -> &'static str {
        match self {
            CreditKind::Optimization => "optimize your resume",
            CreditKind::ScoreCheck => "check your resume score",
            CreditKind::GuidedBuild => "generate a resume",
            CreditKind::LinkedinMessage => "generate LinkedIn messages",
        }
    }
}

/// Server-authoritative counters for one user. Replaced wholesale on every
/// refresh; `used <= total` is enforced upstream, this crate only reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSnapshot {
    pub user_id: Uuid,
    pub plan_id: String,
    pub optimizations_total: u32,
    pub optimizations_used: u32,
    pub score_checks_total: u32,
    pub score_checks_used: u32,
    pub guided_builds_total: u32,
    pub guided_builds_used: u32,
    pub linkedin_messages_total: u32,
    pub linkedin_messages_used: u32,
}

impl SubscriptionSnapshot {
    pub fn total_for(&self, kind: CreditKind) -> u32 {
        match kind {
            CreditKind::Optimization => self.optimizations_total,
            CreditKind::ScoreCheck => self.score_checks_total,
            CreditKind::GuidedBuild => self.guided_builds_total,
            CreditKind::LinkedinMessage => self.linkedin_messages_total,
        }
    }

    pub fn used_for(&self, kind: CreditKind) -> u32 {
        match kind {
            CreditKind::Optimization => self.optimizations_used,
            CreditKind::ScoreCheck => self.score_checks_used,
            CreditKind::GuidedBuild => self.guided_builds_used,
            CreditKind::LinkedinMessage => self.linkedin_messages_used,
        }
    }

    /// Remaining credits of one kind. Totals can lag behind usage while a
    /// plan downgrade settles, so this saturates instead of underflowing.
    pub fn remaining_for(&self, kind: CreditKind) -> u32 {
        self.total_for(kind).saturating_sub(self.used_for(kind))
    }
}

/// Catalog plan as served by the billing collaborator. Price is
/// rupee-denominated on the wire; convert with `price_paise` before any
/// arithmetic against wallet or coupon amounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub duration: String,
    pub optimizations: u32,
    pub score_checks: u32,
    pub guided_builds: u32,
    pub linkedin_messages: u32,
    pub popular: bool,
}

/// Pseudo-plan id appended client-side so add-ons can be bought without a
/// subscription. Never sent by the catalog endpoint.
pub const ADDON_ONLY_PLAN_ID: &str = "addon_only_purchase";

impl Plan {
    pub fn price_paise(&self) -> i64 {
        (self.price * 100.0).round() as i64
    }

    /// The zero-priced "Add-ons Only" entry shown alongside catalog plans.
    pub fn addon_only() -> Self {
        Plan {
            id: ADDON_ONLY_PLAN_ID.to_string(),
            name: "Add-ons Only".to_string(),
            price: 0.0,
            duration: "One-time Purchase".to_string(),
            optimizations: 0,
            score_checks: 0,
            guided_builds: 0,
            linkedin_messages: 0,
            popular: false,
        }
    }
}

/// Purchasable credit top-up. `price` is rupee-denominated like `Plan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOn {
    pub id: String,
    pub name: String,
    pub price: f64,
}

impl AddOn {
    pub fn price_paise(&self) -> i64 {
        (self.price * 100.0).round() as i64
    }
}
