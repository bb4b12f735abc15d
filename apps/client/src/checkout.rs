//! Checkout flow: plan selection, add-ons, coupon, wallet offset, and the
//! pricing arithmetic. All amounts are paise. The state here is transient,
//! created when the plans overlay opens and discarded on success or
//! navigation away; payment submission itself lives in the store because it
//! needs the collaborators.

use std::collections::HashMap;

use crate::models::payment::CouponApplication;
use crate::models::subscription::{AddOn, Plan};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutStep {
    PlanSelection,
    PaymentReview,
}

/// Pricing result, every component surfaced so the review screen can
/// itemize. Recomputed from scratch on each read; nothing is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingBreakdown {
    pub add_ons_total: i64,
    pub base_plan_price: i64,
    pub wallet_deduction: i64,
    pub final_plan_price: i64,
    pub grand_total: i64,
}

/// The pricing rule. An applied coupon's `final_amount` replaces the list
/// price outright; the wallet then offsets the plan only, never add-ons.
pub fn compute_pricing(
    plan_price_paise: i64,
    coupon: Option<&CouponApplication>,
    wallet_balance_paise: i64,
    use_wallet: bool,
    add_ons_total_paise: i64,
) -> PricingBreakdown {
    let base_plan_price = match coupon {
        Some(c) => c.final_amount,
        None => plan_price_paise,
    };
    let wallet_deduction = if use_wallet {
        wallet_balance_paise.min(base_plan_price)
    } else {
        0
    };
    let final_plan_price = (base_plan_price - wallet_deduction).max(0);
    let grand_total = final_plan_price + add_ons_total_paise;

    PricingBreakdown {
        add_ons_total: add_ons_total_paise,
        base_plan_price,
        wallet_deduction,
        final_plan_price,
        grand_total,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutState {
    /// Monotonic marker from the store; late responses carrying a different
    /// epoch are dropped instead of applied to a re-opened checkout.
    pub epoch: u64,
    pub step: CheckoutStep,
    pub plans: Vec<Plan>,
    pub add_ons: Vec<AddOn>,
    pub wallet_balance_paise: i64,
    pub selected_plan_id: Option<String>,
    pub add_on_quantities: HashMap<String, u32>,
    pub coupon: Option<CouponApplication>,
    pub coupon_error: Option<String>,
    pub use_wallet: bool,
}

impl CheckoutState {
    /// Catalog plans get the zero-priced add-ons-only pseudo-plan appended
    /// so add-ons are purchasable without a subscription.
    pub fn new(plans: Vec<Plan>, add_ons: Vec<AddOn>, wallet_balance_paise: i64, epoch: u64) -> Self {
        let mut plans = plans;
        plans.push(Plan::addon_only());
        CheckoutState {
            epoch,
            step: CheckoutStep::PlanSelection,
            plans,
            add_ons,
            wallet_balance_paise,
            selected_plan_id: None,
            add_on_quantities: HashMap::new(),
            coupon: None,
            coupon_error: None,
            use_wallet: false,
        }
    }

    pub fn selected_plan(&self) -> Option<&Plan> {
        let id = self.selected_plan_id.as_deref()?;
        self.plans.iter().find(|p| p.id == id)
    }

    /// Selecting a different plan keeps any applied coupon untouched; the
    /// stale `final_amount` stays in force until the user removes or
    /// re-applies the code.
    pub fn select_plan(&mut self, plan_id: &str) -> bool {
        if self.plans.iter().any(|p| p.id == plan_id) {
            self.selected_plan_id = Some(plan_id.to_string());
            true
        } else {
            false
        }
    }

    pub fn set_add_on_quantity(&mut self, add_on_id: &str, quantity: u32) {
        self.add_on_quantities.insert(add_on_id.to_string(), quantity);
    }

    pub fn set_use_wallet(&mut self, on: bool) {
        self.use_wallet = on;
    }

    pub fn apply_coupon_result(&mut self, coupon: CouponApplication) {
        self.coupon = Some(coupon);
        self.coupon_error = None;
    }

    pub fn reject_coupon(&mut self, message: String) {
        self.coupon = None;
        self.coupon_error = Some(message);
    }

    pub fn remove_coupon(&mut self) {
        self.coupon = None;
        self.coupon_error = None;
    }

    /// Review is only reachable with a plan selected.
    pub fn proceed_to_review(&mut self) -> bool {
        if self.selected_plan().is_some() {
            self.step = CheckoutStep::PaymentReview;
            true
        } else {
            false
        }
    }

    /// Back keeps the plan, add-ons, coupon, and wallet toggle as they are.
    pub fn back_to_plans(&mut self) {
        self.step = CheckoutStep::PlanSelection;
    }

    pub fn add_ons_total_paise(&self) -> i64 {
        self.add_on_quantities
            .iter()
            .map(|(id, qty)| {
                self.add_ons
                    .iter()
                    .find(|a| &a.id == id)
                    .map(|a| a.price_paise() * i64::from(*qty))
                    .unwrap_or(0)
            })
            .sum()
    }

    pub fn pricing(&self) -> PricingBreakdown {
        let plan_price = self.selected_plan().map(|p| p.price_paise()).unwrap_or(0);
        compute_pricing(
            plan_price,
            self.coupon.as_ref(),
            self.wallet_balance_paise,
            self.use_wallet,
            self.add_ons_total_paise(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::subscription::ADDON_ONLY_PLAN_ID;

    fn make_plan(id: &str, price: f64) -> Plan {
        Plan {
            id: id.to_string(),
            name: id.to_string(),
            price,
            duration: "1 month".to_string(),
            optimizations: 10,
            score_checks: 5,
            guided_builds: 3,
            linkedin_messages: 5,
            popular: false,
        }
    }

    fn make_add_on(id: &str, price: f64) -> AddOn {
        AddOn {
            id: id.to_string(),
            name: id.to_string(),
            price,
        }
    }

    fn make_checkout() -> CheckoutState {
        CheckoutState::new(
            vec![
                make_plan("career_boost_plus", 999.0),
                make_plan("starter", 499.0),
            ],
            vec![make_add_on("extra_optimizations", 49.0)],
            30000,
            1,
        )
    }

    fn coupon(discount: i64, final_amount: i64) -> CouponApplication {
        CouponApplication {
            code: "SAVE200".to_string(),
            discount,
            final_amount,
        }
    }

    #[test]
    fn test_documented_pricing_scenario() {
        // Plan 999 with a 200-off coupon, 300 wallet balance toggled on,
        // one add-on at 49 x 2. All paise below.
        let mut checkout = make_checkout();
        assert!(checkout.select_plan("career_boost_plus"));
        checkout.apply_coupon_result(coupon(20000, 79900));
        checkout.set_use_wallet(true);
        checkout.set_add_on_quantity("extra_optimizations", 2);

        let pricing = checkout.pricing();
        assert_eq!(pricing.add_ons_total, 9800);
        assert_eq!(pricing.base_plan_price, 79900);
        assert_eq!(pricing.wallet_deduction, 30000);
        assert_eq!(pricing.final_plan_price, 49900);
        assert_eq!(pricing.grand_total, 59700);
    }

    #[test]
    fn test_grand_total_never_negative() {
        let candidates = [
            (0, None, 0, false, 0),
            (0, Some(coupon(99900, 0)), 100_000, true, 0),
            (99900, Some(coupon(99900, 0)), 100_000, true, 9800),
            (4950, None, 100_000, true, 0),
        ];
        for (price, c, balance, toggle, add_ons) in candidates {
            let pricing = compute_pricing(price, c.as_ref(), balance, toggle, add_ons);
            assert!(
                pricing.grand_total >= 0,
                "negative grand total for price={price} add_ons={add_ons}"
            );
        }
    }

    #[test]
    fn test_wallet_deduction_capped_by_balance_and_plan_price() {
        // Balance larger than the discounted plan: deduction stops at the
        // plan price, the rest of the balance stays untouched.
        let pricing = compute_pricing(99900, Some(&coupon(20000, 79900)), 500_000, true, 0);
        assert_eq!(pricing.wallet_deduction, 79900);
        assert_eq!(pricing.final_plan_price, 0);

        // Balance smaller than the plan: deduction stops at the balance.
        let pricing = compute_pricing(99900, None, 30000, true, 0);
        assert_eq!(pricing.wallet_deduction, 30000);
        assert_eq!(pricing.final_plan_price, 69900);
    }

    #[test]
    fn test_wallet_never_discounts_add_ons() {
        let mut checkout = make_checkout();
        assert!(checkout.select_plan(ADDON_ONLY_PLAN_ID));
        checkout.set_add_on_quantity("extra_optimizations", 2);
        checkout.set_use_wallet(true);

        let pricing = checkout.pricing();
        assert_eq!(pricing.wallet_deduction, 0, "zero-priced plan leaves nothing to offset");
        assert_eq!(pricing.grand_total, 9800);
    }

    #[test]
    fn test_addon_only_plan_ignores_wallet_toggle() {
        let mut checkout = make_checkout();
        assert!(checkout.select_plan(ADDON_ONLY_PLAN_ID));
        checkout.set_add_on_quantity("extra_optimizations", 1);

        checkout.set_use_wallet(false);
        let off = checkout.pricing();
        checkout.set_use_wallet(true);
        let on = checkout.pricing();
        assert_eq!(off, on);
    }

    // Known behavior, kept deliberately: changing plans does not
    // invalidate an applied coupon. The stale final_amount continues to
    // price the new plan until the code is removed or re-applied.
    #[test]
    fn test_stale_coupon_survives_plan_change() {
        let mut checkout = make_checkout();
        assert!(checkout.select_plan("career_boost_plus"));
        checkout.apply_coupon_result(coupon(20000, 79900));

        assert!(checkout.select_plan("starter"));
        let pricing = checkout.pricing();
        assert_eq!(pricing.base_plan_price, 79900, "coupon amount still in force");

        checkout.remove_coupon();
        assert_eq!(checkout.pricing().base_plan_price, 49900);
    }

    #[test]
    fn test_coupon_rejection_clears_previous_coupon() {
        let mut checkout = make_checkout();
        checkout.select_plan("career_boost_plus");
        checkout.apply_coupon_result(coupon(20000, 79900));
        checkout.reject_coupon("Coupon expired".to_string());
        assert_eq!(checkout.coupon, None);
        assert_eq!(checkout.coupon_error.as_deref(), Some("Coupon expired"));
        assert_eq!(checkout.pricing().base_plan_price, 99900);
    }

    #[test]
    fn test_review_requires_plan_selection() {
        let mut checkout = make_checkout();
        assert!(!checkout.proceed_to_review());
        assert_eq!(checkout.step, CheckoutStep::PlanSelection);

        checkout.select_plan("starter");
        assert!(checkout.proceed_to_review());
        assert_eq!(checkout.step, CheckoutStep::PaymentReview);
    }

    #[test]
    fn test_back_from_review_preserves_selections() {
        let mut checkout = make_checkout();
        checkout.select_plan("starter");
        checkout.set_add_on_quantity("extra_optimizations", 3);
        checkout.set_use_wallet(true);
        checkout.proceed_to_review();

        checkout.back_to_plans();
        assert_eq!(checkout.step, CheckoutStep::PlanSelection);
        assert_eq!(checkout.selected_plan_id.as_deref(), Some("starter"));
        assert_eq!(checkout.add_on_quantities.get("extra_optimizations"), Some(&3));
        assert!(checkout.use_wallet);
    }

    #[test]
    fn test_unknown_plan_or_add_on_is_inert() {
        let mut checkout = make_checkout();
        assert!(!checkout.select_plan("nonexistent"));
        checkout.set_add_on_quantity("nonexistent", 5);
        assert_eq!(checkout.add_ons_total_paise(), 0);
    }

    #[test]
    fn test_pseudo_plan_appended_once_at_construction() {
        let checkout = make_checkout();
        let count = checkout
            .plans
            .iter()
            .filter(|p| p.id == ADDON_ONLY_PLAN_ID)
            .count();
        assert_eq!(count, 1);
    }
}
