#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Profile owned by the auth collaborator. Read-only to this crate except
/// for the "mark prompt seen" mutation, which goes back through the
/// collaborator rather than mutating locally.
///
/// `has_seen_profile_prompt` is three-valued: `None` means the profile row
/// has not finished loading, which is distinct from `Some(false)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub github: Option<String>,
    pub referral_code: Option<String>,
    pub has_seen_profile_prompt: Option<bool>,
}

impl User {
    /// First name only, for compact header display.
    pub fn display_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }

    /// Up to two uppercase initials, "U" when the name is empty.
    pub fn initials(&self) -> String {
        let mut parts = self.name.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(first), Some(second)) => first
                .chars()
                .take(1)
                .chain(second.chars().take(1))
                .collect::<String>()
                .to_uppercase(),
            (Some(first), None) => first.chars().take(1).collect::<String>().to_uppercase(),
            _ => "U".to_string(),
        }
    }
}
