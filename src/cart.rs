//! Cart

use std::num::NonZeroU32;

use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::items::{self, Amount, ItemId, LineItem, RestaurantId};

/// Errors related to cart mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// No line with this item id is in the cart.
    #[error("Item {0} not found")]
    ItemNotFound(ItemId),
}

/// Cart
///
/// Holds at most one line per item id, and every line has a quantity of at
/// least one. Line order is insertion order and has no effect on pricing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cart from existing lines, merging lines that share an id.
    pub fn with_items(items: impl IntoIterator<Item = LineItem>) -> Self {
        let mut cart = Self::new();

        for item in items {
            match cart.position(item.id()) {
                Some(pos) => {
                    if let Some(existing) = cart.items.get_mut(pos) {
                        let merged = existing.quantity().saturating_add(item.quantity());
                        existing.set_quantity(NonZeroU32::new(merged).unwrap_or(NonZeroU32::MAX));
                    }
                }
                None => cart.items.push(item),
            }
        }

        cart
    }

    /// Add one unit of an item, inserting the line if it is not in the cart yet.
    ///
    /// Returns the new quantity for the line.
    pub fn add_item(&mut self, item: LineItem) -> u32 {
        let quantity = if let Some(existing) = self.line_mut(item.id()) {
            let next = existing.quantity().saturating_add(1);
            existing.set_quantity(NonZeroU32::new(next).unwrap_or(NonZeroU32::MAX));
            next
        } else {
            self.items.push(item.with_quantity(1));
            1
        };

        debug!(quantity, "added item to cart");

        quantity
    }

    /// Remove one unit of an item. The line is deleted when its last unit goes.
    ///
    /// Returns the remaining quantity, or `None` when the line was deleted.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if the item is not in the cart.
    pub fn remove_item(&mut self, id: &ItemId) -> Result<Option<u32>, CartError> {
        let current = self
            .get_item(id)
            .map(LineItem::quantity)
            .ok_or_else(|| CartError::ItemNotFound(id.clone()))?;

        self.update_quantity(id, current - 1)?;

        Ok(NonZeroU32::new(current - 1).map(NonZeroU32::get))
    }

    /// Set the absolute quantity of a line. Setting zero deletes the line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if the item is not in the cart.
    pub fn update_quantity(&mut self, id: &ItemId, quantity: u32) -> Result<(), CartError> {
        let pos = self
            .position(id)
            .ok_or_else(|| CartError::ItemNotFound(id.clone()))?;

        match NonZeroU32::new(quantity) {
            Some(quantity) => {
                if let Some(line) = self.items.get_mut(pos) {
                    line.set_quantity(quantity);
                }
            }
            None => {
                self.items.remove(pos);
            }
        }

        Ok(())
    }

    /// Delete a line regardless of its quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if the item is not in the cart.
    pub fn delete_item(&mut self, id: &ItemId) -> Result<LineItem, CartError> {
        let pos = self
            .position(id)
            .ok_or_else(|| CartError::ItemNotFound(id.clone()))?;

        Ok(self.items.remove(pos))
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Get a line by item id.
    pub fn get_item(&self, id: &ItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Iterate over the lines in the cart.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.items.iter()
    }

    /// Lines as a slice.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Sum of every line total.
    pub fn subtotal(&self) -> Amount {
        items::subtotal(&self.items)
    }

    /// Sum of every line quantity.
    pub fn total_quantity(&self) -> Amount {
        items::total_quantity(&self.items)
    }

    /// Distinct restaurants represented in the cart, in first-seen order.
    pub fn restaurant_ids(&self) -> SmallVec<[&RestaurantId; 4]> {
        let mut ids: SmallVec<[&RestaurantId; 4]> = SmallVec::new();

        for restaurant in self.items.iter().filter_map(LineItem::restaurant) {
            if !ids.contains(&restaurant) {
                ids.push(restaurant);
            }
        }

        ids
    }

    /// Restaurant of the first line that has one.
    pub fn primary_restaurant(&self) -> Option<&RestaurantId> {
        self.items.iter().find_map(LineItem::restaurant)
    }

    /// Get the number of lines in the cart.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    fn line_mut(&mut self, id: &ItemId) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| item.id() == id)
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
