//! Wallet summary derived from the transaction ledger. The ledger itself
//! lives behind the billing collaborator; this module only folds it.

use crate::models::payment::{TransactionKind, TransactionStatus, WalletTransaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WalletSummary {
    /// Spendable balance. Completed rows only, clamped at zero because
    /// refund rows can transiently outweigh earnings.
    pub balance_paise: i64,
    /// Positive pending earnings, typically referrals awaiting settlement.
    pub pending_paise: i64,
    pub referral_count: usize,
}

/// Folds the ledger into the three numbers the profile wallet shows.
/// Ledger amounts are rupee-denominated; everything here comes back in
/// paise.
pub fn summarize(transactions: &[WalletTransaction]) -> WalletSummary {
    let completed_rupees: f64 = transactions
        .iter()
        .filter(|t| t.status == TransactionStatus::Completed)
        .map(|t| t.amount)
        .sum();

    let pending_rupees: f64 = transactions
        .iter()
        .filter(|t| t.status == TransactionStatus::Pending && t.amount > 0.0)
        .map(|t| t.amount)
        .sum();

    let referral_count = transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Referral)
        .count();

    WalletSummary {
        balance_paise: ((completed_rupees * 100.0).round() as i64).max(0),
        pending_paise: (pending_rupees * 100.0).round() as i64,
        referral_count,
    }
}

/// Spendable balance alone, for the checkout's wallet toggle.
pub fn balance_paise(transactions: &[WalletTransaction]) -> i64 {
    summarize(transactions).balance_paise
}

/// Share copy built around the user's referral code.
pub fn referral_share_message(code: &str) -> String {
    format!(
        "Use my referral code \"{code}\" to get a \u{20b9}10 bonus when you sign up for Templar!"
    )
}
