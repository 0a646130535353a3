//! Coupons
//!
//! Coupon records, the store contracts they are fetched and redeemed through, and
//! the resolver that holds the single active coupon for a cart.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::{
    items::{Amount, ItemId, LineItem},
    money::format_amount,
};

pub mod resolver;
pub mod store;

/// Prefix marking a target as "every item in this category".
pub const CATEGORY_TARGET_PREFIX: &str = "CATEGORY:";

/// How a coupon's value is turned into a discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponKind {
    /// Fixed amount off
    Flat,

    /// Percentage off
    Percentage,

    /// Buy one, get one free
    Bogo,

    /// Buy two, get one free
    #[serde(rename = "B2G1")]
    B2g1,
}

/// Which cart lines a coupon applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CouponTarget {
    /// A single catalog item
    Item(ItemId),

    /// Every item whose category matches, ignoring case
    Category(String),
}

impl CouponTarget {
    /// Check whether a line is targeted.
    pub fn matches(&self, item: &LineItem) -> bool {
        match self {
            CouponTarget::Item(id) => item.id() == id,
            CouponTarget::Category(category) => {
                item.category().to_lowercase() == category.to_lowercase()
            }
        }
    }
}

impl From<String> for CouponTarget {
    fn from(target: String) -> Self {
        match target.strip_prefix(CATEGORY_TARGET_PREFIX) {
            Some(category) => CouponTarget::Category(category.to_string()),
            None => CouponTarget::Item(ItemId::new(target)),
        }
    }
}

impl From<CouponTarget> for String {
    fn from(target: CouponTarget) -> Self {
        match target {
            CouponTarget::Item(id) => id.as_str().to_string(),
            CouponTarget::Category(category) => format!("{CATEGORY_TARGET_PREFIX}{category}"),
        }
    }
}

/// Trim and upper-case a coupon code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// A coupon record as held by the coupon store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    /// Upper-cased code
    pub code: String,

    /// Discount strategy
    #[serde(rename = "type")]
    pub kind: CouponKind,

    /// Amount or percentage, ignored for BOGO and B2G1
    #[serde(default)]
    pub value: Amount,

    /// Minimum cart subtotal
    #[serde(default)]
    pub min_order_amount: Amount,

    /// Whether the coupon can be applied at all
    #[serde(default = "default_active")]
    pub active: bool,

    /// Maximum redemptions, `None` for unlimited
    #[serde(default)]
    pub usage_limit: Option<u32>,

    /// Redemptions so far
    #[serde(default)]
    pub used_count: u32,

    /// Optional item or category target. A blank target means none.
    #[serde(default, deserialize_with = "deserialize_target")]
    pub target: Option<CouponTarget>,
}

fn default_active() -> bool {
    true
}

fn deserialize_target<'de, D>(deserializer: D) -> Result<Option<CouponTarget>, D::Error>
where
    D: Deserializer<'de>,
{
    let target = Option::<String>::deserialize(deserializer)?;

    Ok(target
        .filter(|target| !target.trim().is_empty())
        .map(CouponTarget::from))
}

impl Coupon {
    /// Create an active, untargeted coupon with no minimum and no usage limit.
    pub fn new(code: &str, kind: CouponKind, value: Amount) -> Self {
        Self {
            code: normalize_code(code),
            kind,
            value,
            min_order_amount: 0,
            active: true,
            usage_limit: None,
            used_count: 0,
            target: None,
        }
    }

    /// Set the minimum order amount.
    #[must_use]
    pub fn with_min_order(mut self, amount: Amount) -> Self {
        self.min_order_amount = amount;
        self
    }

    /// Set the usage limit and current usage.
    #[must_use]
    pub fn with_usage(mut self, limit: u32, used: u32) -> Self {
        self.usage_limit = Some(limit);
        self.used_count = used;
        self
    }

    /// Set the target.
    #[must_use]
    pub fn with_target(mut self, target: CouponTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// Mark the coupon inactive.
    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Check the cart subtotal against the coupon minimum.
    pub fn meets_minimum(&self, subtotal: Amount) -> bool {
        subtotal >= self.min_order_amount
    }

    /// Check whether every redemption has been used.
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .is_some_and(|limit| self.used_count >= limit)
    }

    /// Run the client-side checks in order: active flag, minimum order, usage limit.
    ///
    /// This is an optimistic pre-check only. The usage limit is enforced for real
    /// when the coupon is redeemed at checkout.
    ///
    /// # Errors
    ///
    /// Returns the first [`CouponRejection`] that applies.
    pub fn precheck(&self, subtotal: Amount) -> Result<(), CouponRejection> {
        if !self.active {
            return Err(CouponRejection::Inactive);
        }

        if !self.meets_minimum(subtotal) {
            return Err(CouponRejection::BelowMinimum {
                code: self.code.clone(),
                shortfall: self.min_order_amount.saturating_sub(subtotal),
            });
        }

        if self.is_exhausted() {
            return Err(CouponRejection::UsageLimitReached);
        }

        Ok(())
    }
}

impl fmt::Display for Coupon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Why a coupon could not be applied to the cart.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CouponRejection {
    /// No coupon exists with this code.
    #[error("Invalid Coupon Code")]
    NotFound,

    /// The coupon exists but is switched off.
    #[error("This coupon is currently inactive")]
    Inactive,

    /// The cart subtotal is below the coupon minimum.
    #[error("Add {} more to use {code}", format_amount(*.shortfall))]
    BelowMinimum {
        /// Coupon code
        code: String,

        /// Amount still missing
        shortfall: Amount,
    },

    /// Every redemption has been used.
    #[error("Coupon usage limit reached")]
    UsageLimitReached,

    /// The coupon store could not be reached.
    #[error("Could not verify the coupon right now, please try again")]
    Unavailable,

    /// A newer apply or remove finished first; this response was dropped.
    #[error("This coupon request was replaced by a newer one")]
    Superseded,
}

/// User-facing result of applying a coupon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Whether the coupon is now active
    pub success: bool,

    /// Message to show the customer
    pub message: String,
}

impl From<&Result<Coupon, CouponRejection>> for ApplyOutcome {
    fn from(result: &Result<Coupon, CouponRejection>) -> Self {
        match result {
            Ok(coupon) => Self {
                success: true,
                message: format!("Coupon {coupon} applied"),
            },
            Err(rejection) => Self {
                success: false,
                message: rejection.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::discounts::calculate_discount;

    use super::*;

    #[test]
    fn new_upper_cases_code() {
        let coupon = Coupon::new(" save10 ", CouponKind::Flat, 10);

        assert_eq!(coupon.code, "SAVE10");
    }

    #[test]
    fn target_parses_category_prefix() {
        assert_eq!(
            CouponTarget::from("CATEGORY:Snacks".to_string()),
            CouponTarget::Category("Snacks".to_string())
        );
        assert_eq!(
            CouponTarget::from("maggi".to_string()),
            CouponTarget::Item(ItemId::from("maggi"))
        );
    }

    #[test]
    fn category_target_ignores_case() {
        let target = CouponTarget::Category("snacks".to_string());
        let chips = LineItem::new("chips", "Chips", 20).with_category("Snacks");
        let tea = LineItem::new("tea", "Tea", 15).with_category("Drinks");

        assert!(target.matches(&chips));
        assert!(!target.matches(&tea));
    }

    #[test]
    fn precheck_order_is_active_minimum_usage() {
        let coupon = Coupon::new("X", CouponKind::Flat, 10)
            .with_min_order(500)
            .with_usage(1, 1)
            .inactive();

        assert_eq!(coupon.precheck(0), Err(CouponRejection::Inactive));

        let coupon = Coupon {
            active: true,
            ..coupon
        };

        assert_eq!(
            coupon.precheck(200),
            Err(CouponRejection::BelowMinimum {
                code: "X".to_string(),
                shortfall: 300,
            })
        );
        assert_eq!(coupon.precheck(500), Err(CouponRejection::UsageLimitReached));
    }

    #[test]
    fn unlimited_coupon_is_never_exhausted() {
        let coupon = Coupon {
            used_count: 10_000,
            ..Coupon::new("X", CouponKind::Flat, 10)
        };

        assert!(!coupon.is_exhausted());
        assert_eq!(coupon.precheck(0), Ok(()));
    }

    #[test]
    fn below_minimum_message_names_code() {
        let rejection = CouponRejection::BelowMinimum {
            code: "FEAST".to_string(),
            shortfall: 150,
        };

        assert_eq!(rejection.to_string(), "Add ₹150.00 more to use FEAST");
    }

    #[test]
    fn outcome_reports_success_and_failure() {
        let applied: Result<Coupon, CouponRejection> =
            Ok(Coupon::new("SAVE10", CouponKind::Flat, 10));
        let rejected: Result<Coupon, CouponRejection> = Err(CouponRejection::NotFound);

        assert_eq!(
            ApplyOutcome::from(&applied),
            ApplyOutcome {
                success: true,
                message: "Coupon SAVE10 applied".to_string(),
            }
        );
        assert_eq!(
            ApplyOutcome::from(&rejected),
            ApplyOutcome {
                success: false,
                message: "Invalid Coupon Code".to_string(),
            }
        );
    }

    #[test]
    fn deserializes_store_record() -> TestResult {
        let coupon: Coupon = serde_json::from_str(
            r#"{
                "code": "SNACKBOGO",
                "type": "BOGO",
                "min_order_amount": 100,
                "usage_limit": null,
                "target": "CATEGORY:Snacks"
            }"#,
        )?;

        assert_eq!(coupon.kind, CouponKind::Bogo);
        assert!(coupon.active);
        assert_eq!(coupon.value, 0);
        assert_eq!(
            coupon.target,
            Some(CouponTarget::Category("Snacks".to_string()))
        );

        let b2g1: CouponKind = serde_json::from_str(r#""B2G1""#)?;
        assert_eq!(b2g1, CouponKind::B2g1);

        Ok(())
    }

    #[test]
    fn blank_target_deserializes_as_untargeted() -> TestResult {
        let cleared: Coupon =
            serde_json::from_str(r#"{"code": "SAVE50", "type": "FLAT", "value": 50, "target": ""}"#)?;
        let spaces: Coupon =
            serde_json::from_str(r#"{"code": "SAVE50", "type": "FLAT", "value": 50, "target": "  "}"#)?;
        let null: Coupon =
            serde_json::from_str(r#"{"code": "SAVE50", "type": "FLAT", "value": 50, "target": null}"#)?;

        assert_eq!(cleared.target, None);
        assert_eq!(spaces.target, None);
        assert_eq!(null.target, None);

        let items = [LineItem::new("A", "Masala Dosa", 100).with_quantity(3)];

        assert_eq!(calculate_discount(&cleared, &items, 300), 50);

        Ok(())
    }
}
