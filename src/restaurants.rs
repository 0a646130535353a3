//! Restaurants

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{
    items::{Amount, ItemId, RestaurantId},
    settings::RestaurantSettings,
};

/// A menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Item id
    pub id: ItemId,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Unit price
    pub price: Amount,

    /// Category label
    #[serde(default)]
    pub category: String,
}

/// A restaurant record as held by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Restaurant id
    pub id: RestaurantId,

    /// Display name
    pub name: String,

    /// Menu entries
    #[serde(default)]
    pub menu: Vec<MenuItem>,

    /// Minimum order and delivery overrides
    #[serde(flatten)]
    pub settings: RestaurantSettings,
}

impl Restaurant {
    /// Minimum order subtotal, when one greater than zero is configured.
    pub fn min_order_amount(&self) -> Option<Amount> {
        self.settings.min_order_amount.filter(|amount| *amount > 0)
    }

    /// Find a menu entry by id.
    pub fn menu_item(&self, id: &ItemId) -> Option<&MenuItem> {
        self.menu.iter().find(|item| &item.id == id)
    }
}

/// In-memory restaurant lookup, fetched once and held for the session.
#[derive(Debug, Clone, Default)]
pub struct RestaurantRegistry {
    restaurants: FxHashMap<RestaurantId, Restaurant>,
}

impl RestaurantRegistry {
    /// Create a registry from restaurant records. Later records replace earlier ones with the same id.
    pub fn new(restaurants: impl IntoIterator<Item = Restaurant>) -> Self {
        Self {
            restaurants: restaurants
                .into_iter()
                .map(|restaurant| (restaurant.id.clone(), restaurant))
                .collect(),
        }
    }

    /// Get a restaurant by id.
    pub fn get(&self, id: &RestaurantId) -> Option<&Restaurant> {
        self.restaurants.get(id)
    }

    /// Override settings for a restaurant.
    pub fn settings(&self, id: &RestaurantId) -> Option<&RestaurantSettings> {
        self.get(id).map(|restaurant| &restaurant.settings)
    }

    /// Iterate over every restaurant.
    pub fn iter(&self) -> impl Iterator<Item = &Restaurant> {
        self.restaurants.values()
    }

    /// Number of restaurants
    pub fn len(&self) -> usize {
        self.restaurants.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.restaurants.is_empty()
    }
}
