//! Single-slot alert channel. One descriptor may be live at a time; showing
//! another replaces it in place. There is no queue.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Info,
    Success,
    Warning,
    Error,
}

/// Command attached to an alert's action button. Typed rather than a
/// closure so the store can execute it and tests can assert on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertAction {
    ShowSignIn,
    ShowPlans,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDescriptor {
    pub title: String,
    pub message: String,
    pub severity: AlertSeverity,
    pub action_label: Option<String>,
    pub action: Option<AlertAction>,
}

impl AlertDescriptor {
    pub fn new(title: &str, message: &str, severity: AlertSeverity) -> Self {
        AlertDescriptor {
            title: title.to_string(),
            message: message.to_string(),
            severity,
            action_label: None,
            action: None,
        }
    }

    pub fn info(title: &str, message: &str) -> Self {
        Self::new(title, message, AlertSeverity::Info)
    }

    pub fn success(title: &str, message: &str) -> Self {
        Self::new(title, message, AlertSeverity::Success)
    }

    pub fn warning(title: &str, message: &str) -> Self {
        Self::new(title, message, AlertSeverity::Warning)
    }

    pub fn error(title: &str, message: &str) -> Self {
        Self::new(title, message, AlertSeverity::Error)
    }

    pub fn with_action(mut self, label: &str, action: AlertAction) -> Self {
        self.action_label = Some(label.to_string());
        self.action = Some(action);
        self
    }
}

/// Holder for the one live alert. Every surfaced alert is also logged here,
/// so failure diagnostics exist even when the user never sees the modal.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AlertSlot {
    current: Option<AlertDescriptor>,
}

impl AlertSlot {
    pub fn show(&mut self, descriptor: AlertDescriptor) {
        match descriptor.severity {
            AlertSeverity::Error => {
                error!("alert: {}: {}", descriptor.title, descriptor.message)
            }
            AlertSeverity::Warning => {
                warn!("alert: {}: {}", descriptor.title, descriptor.message)
            }
            _ => info!("alert: {}: {}", descriptor.title, descriptor.message),
        }
        self.current = Some(descriptor);
    }

    /// Dismiss without running the action.
    pub fn acknowledge(&mut self) -> Option<AlertDescriptor> {
        self.current.take()
    }

    /// Clicking the action button dismisses the alert as part of running the
    /// action, matching the callback wrapper in the product shell.
    pub fn take_action(&mut self) -> Option<AlertAction> {
        self.current.take().and_then(|d| d.action)
    }

    pub fn current(&self) -> Option<&AlertDescriptor> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }
}
