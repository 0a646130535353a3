//! Minimum Order Validation

use smallvec::SmallVec;

use crate::{
    items::{Amount, LineItem, RestaurantId},
    restaurants::RestaurantRegistry,
};

/// A restaurant whose subtotal is below its configured minimum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
    /// Restaurant id
    pub restaurant_id: RestaurantId,

    /// Restaurant display name
    pub restaurant_name: String,

    /// Configured minimum order amount
    pub min_amount: Amount,

    /// Current subtotal for this restaurant
    pub current_total: Amount,

    /// `min_amount - current_total`
    pub shortfall: Amount,
}

/// Per-restaurant subtotals in first-seen order.
pub fn restaurant_subtotals<'a>(
    items: impl IntoIterator<Item = &'a LineItem>,
) -> SmallVec<[(&'a RestaurantId, Amount); 4]> {
    let mut totals: SmallVec<[(&'a RestaurantId, Amount); 4]> = SmallVec::new();

    for item in items {
        let Some(restaurant) = item.restaurant() else {
            continue;
        };

        match totals.iter_mut().find(|(id, _)| *id == restaurant) {
            Some((_, total)) => *total = total.saturating_add(item.line_total()),
            None => totals.push((restaurant, item.line_total())),
        }
    }

    totals
}

/// Report every restaurant in the cart whose subtotal is below its minimum.
///
/// Restaurants missing from the registry, or with no minimum above zero, never
/// produce a shortfall. Checkout stays blocked while the result is non-empty.
pub fn shortfalls<'a>(
    items: impl IntoIterator<Item = &'a LineItem>,
    registry: &RestaurantRegistry,
) -> Vec<Shortfall> {
    restaurant_subtotals(items)
        .into_iter()
        .filter_map(|(id, current_total)| {
            let restaurant = registry.get(id)?;
            let min_amount = restaurant.min_order_amount()?;

            (current_total < min_amount).then(|| Shortfall {
                restaurant_id: id.clone(),
                restaurant_name: restaurant.name.clone(),
                min_amount,
                current_total,
                shortfall: min_amount.saturating_sub(current_total),
            })
        })
        .collect()
}
