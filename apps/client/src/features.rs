//! Feature catalog and the entitlement-gated dispatcher.
//!
//! Gating here is advisory: an authenticated user always reaches the
//! feature page, and exhausted credits are caught at the point of
//! consumption, not at navigation time.

use serde::{Deserialize, Serialize};

use crate::models::subscription::{CreditKind, SubscriptionSnapshot};
use crate::nav::Page;
use crate::session::SessionState;

/// The four gated tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureId {
    Optimizer,
    ScoreChecker,
    GuidedBuilder,
    LinkedinGenerator,
}

pub const FEATURES: [FeatureId; 4] = [
    FeatureId::Optimizer,
    FeatureId::ScoreChecker,
    FeatureId::GuidedBuilder,
    FeatureId::LinkedinGenerator,
];

impl FeatureId {
    /// The optimizer is the one try-before-you-sign-in surface.
    pub fn requires_auth(&self) -> bool {
        !matches!(self, FeatureId::Optimizer)
    }

    pub fn page(&self) -> Page {
        match self {
            FeatureId::Optimizer => Page::Optimizer,
            FeatureId::ScoreChecker => Page::ScoreChecker,
            FeatureId::GuidedBuilder => Page::GuidedBuilder,
            FeatureId::LinkedinGenerator => Page::LinkedinGenerator,
        }
    }

    pub fn credit_kind(&self) -> CreditKind {
        match self {
            FeatureId::Optimizer => CreditKind::Optimization,
            FeatureId::ScoreChecker => CreditKind::ScoreCheck,
            FeatureId::GuidedBuilder => CreditKind::GuidedBuild,
            FeatureId::LinkedinGenerator => CreditKind::LinkedinMessage,
        }
    }
}

/// What a feature click should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureDecision {
    Navigate(Page),
    PromptSignIn,
}

/// Dispatch rule: unauthenticated users are prompted to sign in for gated
/// features and navigate freely otherwise. Remaining credits never block
/// navigation.
pub fn decide_feature_access(feature: FeatureId, session: &SessionState) -> FeatureDecision {
    if !session.authenticated && feature.requires_auth() {
        FeatureDecision::PromptSignIn
    } else {
        FeatureDecision::Navigate(feature.page())
    }
}

/// True iff the user is authenticated, holds a snapshot, and has at least
/// one unused credit of the feature's kind.
pub fn is_feature_available(
    feature: FeatureId,
    session: &SessionState,
    snapshot: Option<&SubscriptionSnapshot>,
) -> bool {
    if !session.authenticated {
        return false;
    }
    match snapshot {
        Some(snap) => snap.total_for(feature.credit_kind()) > snap.used_for(feature.credit_kind()),
        None => false,
    }
}

/// Remaining count for the feature tile. Cosmetic: only positive counts are
/// shown, so zero and "no snapshot" both come back as `None`.
pub fn remaining_for_display(
    feature: FeatureId,
    session: &SessionState,
    snapshot: Option<&SubscriptionSnapshot>,
) -> Option<u32> {
    if !session.authenticated {
        return None;
    }
    let remaining = snapshot?.remaining_for(feature.credit_kind());
    if remaining > 0 {
        Some(remaining)
    } else {
        None
    }
}
