//! Discounts
//!
//! Turns the active coupon into a discount amount. The calculation runs against
//! the live cart every time the quote is evaluated, so the discount follows cart
//! edits without fetching the coupon again.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

use crate::{
    coupons::{Coupon, CouponKind, CouponTarget},
    items::{Amount, LineItem, cheapest_item},
};

/// Upper bound for untargeted percentage coupons. Targeted coupons are not capped.
pub const GLOBAL_PERCENTAGE_CAP: Amount = 100;

/// How the free unit of a BOGO or B2G1 coupon is priced when the targeted lines
/// carry different unit prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeUnitPricing {
    /// Price of the first targeted line in cart order.
    FirstMatch,

    /// Price of the cheapest targeted line.
    Cheapest,
}

/// Free-unit pricing used by [`calculate_discount`].
///
/// Matched lines are assumed to share one unit price; with mixed prices the
/// first matched line sets the price of every free unit.
pub const FREE_UNIT_PRICING: FreeUnitPricing = FreeUnitPricing::FirstMatch;

/// Discount for a coupon against the current cart lines and subtotal.
pub fn calculate_discount(coupon: &Coupon, items: &[LineItem], subtotal: Amount) -> Amount {
    calculate_discount_with(coupon, items, subtotal, FREE_UNIT_PRICING)
}

/// Discount for a coupon with an explicit free-unit pricing policy.
///
/// Yields zero when the subtotal has dropped below the coupon minimum; the coupon
/// itself stays applied.
pub fn calculate_discount_with(
    coupon: &Coupon,
    items: &[LineItem],
    subtotal: Amount,
    pricing: FreeUnitPricing,
) -> Amount {
    if !coupon.meets_minimum(subtotal) {
        return 0;
    }

    match &coupon.target {
        Some(target) => targeted_discount(coupon, target, items, pricing),
        None => global_discount(coupon, subtotal),
    }
}

fn targeted_discount(
    coupon: &Coupon,
    target: &CouponTarget,
    items: &[LineItem],
    pricing: FreeUnitPricing,
) -> Amount {
    let matched: Vec<&LineItem> = items.iter().filter(|item| target.matches(item)).collect();

    let Some(unit_price) = free_unit_price(&matched, pricing) else {
        return 0;
    };

    let total_qty: Amount = matched
        .iter()
        .fold(0, |acc: Amount, item| {
            acc.saturating_add(Amount::from(item.quantity()))
        });

    let total_price = crate::items::subtotal(matched.iter().copied());

    match coupon.kind {
        CouponKind::Bogo => (total_qty / 2).saturating_mul(unit_price),
        CouponKind::B2g1 => (total_qty / 3).saturating_mul(unit_price),
        CouponKind::Percentage => percent_of(total_price, coupon.value),
        CouponKind::Flat => total_price.min(coupon.value.max(0)),
    }
}

fn global_discount(coupon: &Coupon, subtotal: Amount) -> Amount {
    match coupon.kind {
        CouponKind::Flat => subtotal.min(coupon.value.max(0)),
        CouponKind::Percentage => percent_of(subtotal, coupon.value).min(GLOBAL_PERCENTAGE_CAP),
        CouponKind::Bogo | CouponKind::B2g1 => 0,
    }
}

fn free_unit_price(matched: &[&LineItem], pricing: FreeUnitPricing) -> Option<Amount> {
    let item = match pricing {
        FreeUnitPricing::FirstMatch => matched.first().copied(),
        FreeUnitPricing::Cheapest => cheapest_item(matched),
    };

    item.map(LineItem::price)
}

/// `amount * percent / 100`, rounded half away from zero.
///
/// Negative percentages give zero. A result too large to represent also gives zero,
/// so an overflow never turns into an oversized discount.
pub fn percent_of(amount: Amount, percent: Amount) -> Amount {
    if percent <= 0 {
        return 0;
    }

    Decimal::from(amount)
        .checked_mul(Decimal::from(percent))
        .and_then(|applied| applied.checked_div(Decimal::ONE_HUNDRED))
        .map(|applied| applied.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|rounded| rounded.to_i64())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use crate::items::ItemId;

    use super::*;

    fn maggi(qty: u32) -> LineItem {
        LineItem::new("maggi", "Maggi", 50)
            .with_category("Noodles")
            .with_quantity(qty)
    }

    fn item_target() -> CouponTarget {
        CouponTarget::Item(ItemId::from("maggi"))
    }

    #[test]
    fn bogo_on_item_gives_one_free_per_pair() {
        let coupon = Coupon::new("BOGO", CouponKind::Bogo, 0).with_target(item_target());
        let items = [maggi(5)];

        assert_eq!(calculate_discount(&coupon, &items, 250), 200);
    }

    #[test]
    fn b2g1_on_item_gives_one_free_per_three() {
        let coupon = Coupon::new("B2G1", CouponKind::B2g1, 0).with_target(item_target());

        assert_eq!(calculate_discount(&coupon, &[maggi(2)], 100), 0);
        assert_eq!(calculate_discount(&coupon, &[maggi(3)], 150), 50);
        assert_eq!(calculate_discount(&coupon, &[maggi(7)], 350), 100);
    }

    #[test]
    fn targeted_percentage_is_not_capped() {
        let coupon = Coupon::new("HALF", CouponKind::Percentage, 50).with_target(item_target());
        let items = [maggi(10)];

        assert_eq!(calculate_discount(&coupon, &items, 500), 250);
    }

    #[test]
    fn targeted_flat_is_limited_to_matched_total() {
        let coupon = Coupon::new("FLAT", CouponKind::Flat, 500).with_target(item_target());
        let items = [maggi(2), LineItem::new("tea", "Tea", 400)];

        assert_eq!(calculate_discount(&coupon, &items, 500), 100);
    }

    #[test]
    fn no_matching_lines_gives_zero() {
        let coupon = Coupon::new("BOGO", CouponKind::Bogo, 0).with_target(item_target());
        let items = [LineItem::new("tea", "Tea", 15).with_quantity(4)];

        assert_eq!(calculate_discount(&coupon, &items, 60), 0);
    }

    #[test]
    fn category_target_sums_every_matching_line() {
        let coupon = Coupon::new("NOODLES", CouponKind::Bogo, 0)
            .with_target(CouponTarget::Category("noodles".to_string()));

        let items = [
            maggi(1),
            LineItem::new("ramen", "Ramen", 80)
                .with_category("NOODLES")
                .with_quantity(2),
        ];

        // Three matched units, one free, priced at the first match.
        assert_eq!(calculate_discount(&coupon, &items, 210), 50);
    }

    #[test]
    fn cheapest_policy_prices_free_units_at_lowest_price() {
        let coupon = Coupon::new("NOODLES", CouponKind::Bogo, 0)
            .with_target(CouponTarget::Category("Noodles".to_string()));

        let items = [
            LineItem::new("ramen", "Ramen", 80)
                .with_category("Noodles")
                .with_quantity(2),
            maggi(2),
        ];

        assert_eq!(
            calculate_discount_with(&coupon, &items, 260, FreeUnitPricing::FirstMatch),
            160
        );
        assert_eq!(
            calculate_discount_with(&coupon, &items, 260, FreeUnitPricing::Cheapest),
            100
        );
    }

    #[test]
    fn global_flat_is_limited_to_subtotal() {
        let coupon = Coupon::new("FLAT", CouponKind::Flat, 500);

        assert_eq!(calculate_discount(&coupon, &[maggi(1)], 50), 50);
        assert_eq!(calculate_discount(&coupon, &[maggi(20)], 1000), 500);
    }

    #[test]
    fn global_percentage_is_capped() {
        let coupon = Coupon::new("PCT20", CouponKind::Percentage, 20);

        assert_eq!(calculate_discount(&coupon, &[], 1000), 100);
        assert_eq!(calculate_discount(&coupon, &[], 300), 60);
    }

    #[test]
    fn global_free_unit_coupons_give_zero() {
        let bogo = Coupon::new("BOGO", CouponKind::Bogo, 0);
        let b2g1 = Coupon::new("B2G1", CouponKind::B2g1, 0);

        assert_eq!(calculate_discount(&bogo, &[maggi(4)], 200), 0);
        assert_eq!(calculate_discount(&b2g1, &[maggi(4)], 200), 0);
    }

    #[test]
    fn below_minimum_gives_zero() {
        let coupon = Coupon::new("FLAT", CouponKind::Flat, 30).with_min_order(200);

        assert_eq!(calculate_discount(&coupon, &[maggi(3)], 150), 0);
        assert_eq!(calculate_discount(&coupon, &[maggi(4)], 200), 30);
    }

    #[test]
    fn percent_of_rounds_half_away_from_zero() {
        assert_eq!(percent_of(125, 10), 13);
        assert_eq!(percent_of(124, 10), 12);
        assert_eq!(percent_of(1000, 0), 0);
        assert_eq!(percent_of(1000, -5), 0);
    }

    #[test]
    fn percent_of_overflow_gives_zero() {
        assert_eq!(percent_of(Amount::MAX, Amount::MAX), 0);
    }
}
