use thiserror::Error;

use crate::alert::{AlertAction, AlertDescriptor};
use crate::models::subscription::CreditKind;

/// Failure from one of the external collaborators (auth, billing, AI).
/// `Rejected` carries the collaborator's own message when it sent one;
/// transport and decode failures never reach the user verbatim.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{message}")]
    Rejected { message: String },
}

impl ProviderError {
    pub fn rejected(message: impl Into<String>) -> Self {
        ProviderError::Rejected {
            message: message.into(),
        }
    }

    /// User-facing message: the collaborator's own string when present,
    /// otherwise the caller's fallback.
    pub fn message_or(&self, fallback: &str) -> String {
        match self {
            ProviderError::Rejected { message } if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

/// Flow-level error taxonomy. Every variant maps to an alert; nothing here
/// is allowed to escape the store as a panic or an unhandled error.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("authentication required")]
    AuthRequired { kind: CreditKind },

    #[error("no {} credits remaining", .kind.display_name())]
    EntitlementExhausted { kind: CreditKind },

    #[error("session token missing or expired")]
    StaleSession,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl FlowError {
    /// Maps the taxonomy onto the alert channel. Auth and entitlement
    /// failures are prompts with an action, not hard errors; a stale
    /// session at payment time reads as an auth problem to the user.
    pub fn to_alert(&self) -> AlertDescriptor {
        match self {
            FlowError::AuthRequired { kind } => AlertDescriptor::warning(
                "Authentication Required",
                &format!(
                    "You must be logged in to {}. Please sign in.",
                    kind.action_phrase()
                ),
            )
            .with_action("Sign In", AlertAction::ShowSignIn),

            FlowError::EntitlementExhausted { kind } => AlertDescriptor::warning(
                "Credits Exhausted",
                &format!(
                    "You have no {} credits remaining. Please upgrade your plan to continue.",
                    kind.display_name()
                ),
            )
            .with_action("View Plans", AlertAction::ShowPlans),

            FlowError::StaleSession => AlertDescriptor::error(
                "Authentication Required",
                "Please log in to complete your purchase.",
            ),

            FlowError::Provider(e) => AlertDescriptor::error(
                "Request Failed",
                &e.message_or("Something went wrong. Please try again."),
            ),
        }
    }
}
