//! Client-side flow engine for the Templar resume service.
//!
//! Headless application core: session and auth-gate reconciliation,
//! entitlement-gated feature dispatch, credit consumption at point of use,
//! checkout pricing and payment submission, a single-slot alert channel,
//! and a navigation router. All AI work and persistence live behind the
//! collaborator traits in [`providers`]; the presentation layer drives the
//! [`App`] store and renders its state.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod alert;
pub mod app;
pub mod builder;
pub mod checkout;
pub mod config;
pub mod errors;
pub mod features;
pub mod models;
pub mod nav;
pub mod providers;
pub mod session;
pub mod wallet;

pub use crate::app::App;
pub use crate::config::Config;
pub use crate::errors::{FlowError, ProviderError};

/// Initializes structured logging for embedders that want output.
/// `RUST_LOG` wins when set; otherwise `default_filter` scopes this crate.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), default_filter))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
