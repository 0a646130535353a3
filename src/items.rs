//! Items

use std::{fmt, num::NonZeroU32};

use serde::{Deserialize, Serialize};

/// An amount in whole units of the storefront currency.
pub type Amount = i64;

/// Catalog item identifier, unique within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create an item id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Restaurant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantId(String);

impl RestaurantId {
    /// Create a restaurant id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RestaurantId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A cart line: one catalog item and how many units of it were ordered.
///
/// Light and heavy classification is not stored here; it is derived at pricing
/// time from the configured id lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    id: ItemId,
    name: String,
    price: Amount,
    #[serde(default = "one_unit")]
    quantity: NonZeroU32,
    restaurant: Option<RestaurantId>,
    #[serde(default)]
    category: String,
}

impl LineItem {
    /// Create a line item holding a single unit.
    ///
    /// Negative prices are clamped to zero.
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>, price: Amount) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: price.max(0),
            quantity: NonZeroU32::MIN,
            restaurant: None,
            category: String::new(),
        }
    }

    /// Set the owning restaurant.
    #[must_use]
    pub fn with_restaurant(mut self, restaurant: impl Into<RestaurantId>) -> Self {
        self.restaurant = Some(restaurant.into());
        self
    }

    /// Set the category label.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the quantity. A zero quantity is raised to one.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = NonZeroU32::new(quantity).unwrap_or(NonZeroU32::MIN);
        self
    }

    /// Item id
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit price
    pub fn price(&self) -> Amount {
        self.price
    }

    /// Number of units, always at least one.
    pub fn quantity(&self) -> u32 {
        self.quantity.get()
    }

    /// Owning restaurant, if any.
    pub fn restaurant(&self) -> Option<&RestaurantId> {
        self.restaurant.as_ref()
    }

    /// Category label, possibly empty.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Unit price multiplied by quantity.
    pub fn line_total(&self) -> Amount {
        self.price.saturating_mul(Amount::from(self.quantity.get()))
    }

    pub(crate) fn set_quantity(&mut self, quantity: NonZeroU32) {
        self.quantity = quantity;
    }
}

fn one_unit() -> NonZeroU32 {
    NonZeroU32::MIN
}

/// Sum of line totals.
pub fn subtotal<'a>(items: impl IntoIterator<Item = &'a LineItem>) -> Amount {
    items
        .into_iter()
        .fold(0, |acc: Amount, item| acc.saturating_add(item.line_total()))
}

/// Sum of quantities.
pub fn total_quantity<'a>(items: impl IntoIterator<Item = &'a LineItem>) -> Amount {
    items
        .into_iter()
        .map(|item| Amount::from(item.quantity()))
        .sum()
}

/// Returns the cheapest line in a list of lines.
pub fn cheapest_item<'a>(items: &[&'a LineItem]) -> Option<&'a LineItem> {
    items.iter().copied().min_by_key(|item| item.price())
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn new_line_item_has_one_unit() {
        let item = LineItem::new("A", "Masala Dosa", 60);

        assert_eq!(item.quantity(), 1);
        assert_eq!(item.restaurant(), None);
        assert_eq!(item.category(), "");
    }

    #[test]
    fn negative_price_is_clamped() {
        let item = LineItem::new("A", "Refund", -50);

        assert_eq!(item.price(), 0);
    }

    #[test]
    fn line_total_multiplies_quantity() {
        let item = LineItem::new("A", "Tea", 15).with_quantity(3);

        assert_eq!(item.line_total(), 45);
    }

    #[test]
    fn zero_quantity_is_raised_to_one() {
        let item = LineItem::new("A", "Tea", 15).with_quantity(0);

        assert_eq!(item.quantity(), 1);
    }

    #[test]
    fn subtotal_sums_lines() {
        let items = [
            LineItem::new("A", "Tea", 15).with_quantity(2),
            LineItem::new("B", "Samosa", 20),
        ];

        assert_eq!(subtotal(&items), 50);
        assert_eq!(total_quantity(&items), 3);
    }

    #[test]
    fn test_cheapest_item() {
        let tea = LineItem::new("A", "Tea", 15);
        let coffee = LineItem::new("B", "Coffee", 25);

        assert_eq!(cheapest_item(&[&coffee, &tea]), Some(&tea));
        assert_eq!(cheapest_item(&[]), None);
    }

    #[test]
    fn deserializes_from_json() -> TestResult {
        let item: LineItem = serde_json::from_str(
            r#"{"id":"A","name":"Tea","price":15,"quantity":2,"restaurant":"R1"}"#,
        )?;

        assert_eq!(item.quantity(), 2);
        assert_eq!(item.restaurant(), Some(&RestaurantId::from("R1")));
        assert_eq!(item.category(), "");

        Ok(())
    }
}
