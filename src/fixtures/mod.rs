//! Fixtures
//!
//! A fixture set is a directory holding `settings.yml`, `restaurants.yml`,
//! `coupons.yml` and `cart.yml`. Cart lines reference restaurant and menu ids;
//! prices and categories come from the menu.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;

use crate::{
    cart::Cart,
    coupons::{Coupon, store::InMemoryCouponStore},
    items::{ItemId, LineItem, RestaurantId},
    restaurants::{Restaurant, RestaurantRegistry},
    settings::DeliverySettings,
};

/// Directory fixture sets are loaded from by [`Fixture::from_set`].
pub const DEFAULT_FIXTURES_PATH: &str = "./fixtures";

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file {path}: {source}")]
    Io {
        /// File that could not be read
        path: PathBuf,

        /// Underlying error
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Cart line references an unknown restaurant
    #[error("Restaurant not found: {0}")]
    RestaurantNotFound(RestaurantId),

    /// Cart line references an item missing from the restaurant menu
    #[error("Item {item} not found on the menu of {restaurant}")]
    ItemNotFound {
        /// Restaurant id
        restaurant: RestaurantId,

        /// Item id
        item: ItemId,
    },
}

#[derive(Debug, Deserialize)]
struct RestaurantsFixture {
    restaurants: Vec<Restaurant>,
}

#[derive(Debug, Deserialize)]
struct CouponsFixture {
    #[serde(default)]
    coupons: Vec<Coupon>,
}

#[derive(Debug, Deserialize)]
struct CartFixture {
    #[serde(default)]
    campus: Option<String>,

    #[serde(default)]
    items: Vec<CartLineFixture>,
}

#[derive(Debug, Deserialize)]
struct CartLineFixture {
    restaurant: RestaurantId,
    item: ItemId,

    #[serde(default = "default_quantity")]
    quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// A loaded fixture set.
#[derive(Debug, Clone)]
pub struct Fixture {
    settings: DeliverySettings,
    registry: RestaurantRegistry,
    coupons: Vec<Coupon>,
    cart: Cart,
    campus: Option<String>,
}

impl Fixture {
    /// Load a fixture set from [`DEFAULT_FIXTURES_PATH`].
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if a file is missing or malformed, or a cart line
    /// references an unknown restaurant or menu item.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::load(DEFAULT_FIXTURES_PATH, name)
    }

    /// Load a fixture set from a custom base path.
    ///
    /// # Errors
    ///
    /// Returns a [`FixtureError`] if a file is missing or malformed, or a cart line
    /// references an unknown restaurant or menu item.
    pub fn load(base_path: impl AsRef<Path>, name: &str) -> Result<Self, FixtureError> {
        let dir = base_path.as_ref().join(name);

        let settings: DeliverySettings = read_yaml(&dir.join("settings.yml"))?;
        let restaurants: RestaurantsFixture = read_yaml(&dir.join("restaurants.yml"))?;
        let coupons: CouponsFixture = read_yaml(&dir.join("coupons.yml"))?;
        let cart: CartFixture = read_yaml(&dir.join("cart.yml"))?;

        let registry = RestaurantRegistry::new(restaurants.restaurants);

        let lines = cart
            .items
            .into_iter()
            .map(|line| line_item(&registry, line))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            settings,
            registry,
            coupons: coupons.coupons,
            cart: Cart::with_items(lines),
            campus: cart.campus,
        })
    }

    /// Global delivery settings
    pub fn settings(&self) -> &DeliverySettings {
        &self.settings
    }

    /// Restaurant registry
    pub fn registry(&self) -> &RestaurantRegistry {
        &self.registry
    }

    /// Coupon records
    pub fn coupons(&self) -> &[Coupon] {
        &self.coupons
    }

    /// Starting cart
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Campus selected in the cart fixture, if any
    pub fn campus(&self) -> Option<&str> {
        self.campus.as_deref()
    }

    /// Build an in-memory coupon store holding the fixture coupons.
    pub fn coupon_store(&self) -> InMemoryCouponStore {
        InMemoryCouponStore::new(self.coupons.iter().cloned())
    }
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, FixtureError> {
    let contents = fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(serde_norway::from_str(&contents)?)
}

fn line_item(
    registry: &RestaurantRegistry,
    line: CartLineFixture,
) -> Result<LineItem, FixtureError> {
    let restaurant = registry
        .get(&line.restaurant)
        .ok_or_else(|| FixtureError::RestaurantNotFound(line.restaurant.clone()))?;

    let menu_item = restaurant
        .menu_item(&line.item)
        .ok_or_else(|| FixtureError::ItemNotFound {
            restaurant: line.restaurant.clone(),
            item: line.item.clone(),
        })?;

    let name = if menu_item.name.is_empty() {
        menu_item.id.to_string()
    } else {
        menu_item.name.clone()
    };

    Ok(LineItem::new(menu_item.id.clone(), name, menu_item.price)
        .with_restaurant(line.restaurant)
        .with_category(menu_item.category.clone())
        .with_quantity(line.quantity))
}
