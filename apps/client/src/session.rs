//! Session state and the auth-gate reconciliation rule.
//!
//! The gate runs after every session change and decides whether the auth
//! modal must be forced open (incomplete post-signup profile) or forced
//! closed. It is deliberately a pure function over (session, nav) so the
//! transition table in the tests is the whole behavior.

use serde::{Deserialize, Serialize};

use crate::models::user::User;
use crate::nav::{AuthView, NavState};

/// What the auth collaborator reports about the current visitor.
/// `loading` is true until the first session fetch resolves; the gate
/// defers while it is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub loading: bool,
    pub authenticated: bool,
    pub user: Option<User>,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState {
            loading: true,
            authenticated: false,
            user: None,
        }
    }
}

impl SessionState {
    pub fn user_id(&self) -> Option<uuid::Uuid> {
        self.user.as_ref().map(|u| u.id)
    }

    /// Authenticated with a loaded user row.
    pub fn current_user(&self) -> Option<&User> {
        if self.authenticated {
            self.user.as_ref()
        } else {
            None
        }
    }
}

/// Forced-modal reconciliation, run on every change to the session or to
/// `has_seen_profile_prompt`:
///
/// - loading: defer, touch nothing
/// - authenticated, prompt flag not yet loaded (`None`): defer
/// - authenticated, prompt flag `Some(false)`: force the modal open in
///   post-signup-prompt mode, overriding whatever view was pending
/// - authenticated, prompt flag `Some(true)`: force the modal closed
/// - unauthenticated: force the modal closed
pub fn reconcile_auth_gate(session: &SessionState, nav: &mut NavState) {
    if session.loading {
        return;
    }
    match session.current_user() {
        Some(user) => match user.has_seen_profile_prompt {
            None => {}
            Some(false) => nav.open_auth(AuthView::PostSignupPrompt),
            Some(true) => nav.close_auth(),
        },
        None => nav.close_auth(),
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use uuid::Uuid;

    pub fn make_user(prompt_seen: Option<bool>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            name: "Ada Lovelace".to_string(),
            phone: Some("+91 98765 43210".to_string()),
            linkedin: None,
            github: None,
            referral_code: Some("ADA10".to_string()),
            has_seen_profile_prompt: prompt_seen,
        }
    }

    pub fn authenticated_session(prompt_seen: Option<bool>) -> SessionState {
        SessionState {
            loading: false,
            authenticated: true,
            user: Some(make_user(prompt_seen)),
        }
    }

    pub fn signed_out_session() -> SessionState {
        SessionState {
            loading: false,
            authenticated: false,
            user: None,
        }
    }

    pub fn loading_session() -> SessionState {
        SessionState::default()
    }
}
