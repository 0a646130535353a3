//! Delivery Settings
//!
//! Global delivery configuration, per-restaurant overrides, and the resolver that
//! picks one concrete value from the global, restaurant and fallback levels.

use std::str::FromStr;

use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::items::{Amount, ItemId};

/// Base delivery charge used when neither the global nor the restaurant value is valid.
pub const DEFAULT_BASE_DELIVERY_CHARGE: Amount = 30;

/// Regular-item count above which each further unit is surcharged.
pub const DEFAULT_EXTRA_ITEM_THRESHOLD: Amount = 3;

/// Charge per surcharged unit.
pub const DEFAULT_EXTRA_ITEM_CHARGE: Amount = 10;

/// Charge per heavy unit beyond the first.
pub const DEFAULT_HEAVY_ITEM_CHARGE: Amount = 20;

/// Light units that make up one surcharged unit.
pub const DEFAULT_LIGHT_BUNDLE_SIZE: Amount = 5;

/// A raw setting as it arrives from the settings document.
///
/// Operators edit these through forms, so numbers may arrive as strings and
/// cleared fields as empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    /// Integer value
    Integer(i64),

    /// Floating point value
    Float(f64),

    /// Textual value, valid only when it parses as a number
    Text(String),
}

impl SettingValue {
    /// Interpret the setting as a whole amount.
    ///
    /// Returns `None` for empty or non-numeric text and non-finite floats.
    /// Fractional values are rounded half away from zero.
    pub fn as_amount(&self) -> Option<Amount> {
        match self {
            SettingValue::Integer(value) => Some(*value),
            SettingValue::Float(value) => Decimal::from_f64(*value).and_then(round_to_amount),
            SettingValue::Text(text) => {
                let text = text.trim();

                if text.is_empty() {
                    return None;
                }

                Decimal::from_str(text)
                    .or_else(|_| Decimal::from_scientific(text))
                    .ok()
                    .and_then(round_to_amount)
            }
        }
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Integer(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

fn round_to_amount(value: Decimal) -> Option<Amount> {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Pick one concrete value from three priority levels.
///
/// The global value wins when valid, then the restaurant value, then `fallback`.
pub fn resolve_param(
    global: Option<&SettingValue>,
    restaurant: Option<&SettingValue>,
    fallback: Amount,
) -> Amount {
    global
        .and_then(SettingValue::as_amount)
        .or_else(|| restaurant.and_then(SettingValue::as_amount))
        .unwrap_or(fallback)
}

/// Flat charge added when delivering to a campus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampusCharge {
    /// Campus id
    pub campus_id: String,

    /// Campus display name
    pub campus_name: String,

    /// Charge added to the delivery total
    pub charge: Amount,
}

/// Global delivery settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliverySettings {
    /// Base delivery charge
    pub base_delivery_charge: Option<SettingValue>,

    /// Regular units allowed before the extra-item charge applies
    pub extra_item_threshold: Option<SettingValue>,

    /// Charge per surcharged unit
    pub extra_item_charge: Option<SettingValue>,

    /// Items counted in bundles
    pub light_items: Vec<ItemId>,

    /// Light units per surcharged bundle
    pub light_item_bundle_size: Option<SettingValue>,

    /// Items with a stepped individual surcharge
    pub heavy_items: Vec<ItemId>,

    /// Charge per heavy unit beyond the first
    pub heavy_item_charge: Option<SettingValue>,

    /// Per-campus delivery addends
    pub campus_charges: Vec<CampusCharge>,
}

impl DeliverySettings {
    /// Resolve the three charge parameters against an optional restaurant override.
    pub fn resolve(&self, restaurant: Option<&RestaurantSettings>) -> ResolvedCharges {
        ResolvedCharges {
            base: resolve_param(
                self.base_delivery_charge.as_ref(),
                restaurant.and_then(|r| r.base_delivery_charge.as_ref()),
                DEFAULT_BASE_DELIVERY_CHARGE,
            ),
            threshold: resolve_param(
                self.extra_item_threshold.as_ref(),
                restaurant.and_then(|r| r.extra_item_threshold.as_ref()),
                DEFAULT_EXTRA_ITEM_THRESHOLD,
            ),
            extra_charge: resolve_param(
                self.extra_item_charge.as_ref(),
                restaurant.and_then(|r| r.extra_item_charge.as_ref()),
                DEFAULT_EXTRA_ITEM_CHARGE,
            ),
        }
    }

    /// Light units per bundle. Missing or non-positive values fall back to the default.
    pub fn light_bundle_size(&self) -> Amount {
        self.light_item_bundle_size
            .as_ref()
            .and_then(SettingValue::as_amount)
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_LIGHT_BUNDLE_SIZE)
    }

    /// Charge per heavy unit beyond the first.
    pub fn heavy_item_charge(&self) -> Amount {
        resolve_param(
            self.heavy_item_charge.as_ref(),
            None,
            DEFAULT_HEAVY_ITEM_CHARGE,
        )
    }

    /// Look up a campus addend by id first, then by name. Unknown campuses add nothing.
    pub fn campus_charge(&self, campus: &str) -> Amount {
        self.campus_charges
            .iter()
            .find(|c| c.campus_id == campus)
            .or_else(|| self.campus_charges.iter().find(|c| c.campus_name == campus))
            .map_or(0, |c| c.charge)
    }

    /// Build the item classification for one evaluation.
    pub fn classifier(&self) -> ItemClassifier<'_> {
        ItemClassifier {
            heavy: self.heavy_items.iter().collect(),
            light: self.light_items.iter().collect(),
        }
    }
}

/// Per-restaurant override candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestaurantSettings {
    /// Base delivery charge override
    pub base_delivery_charge: Option<SettingValue>,

    /// Extra-item threshold override
    pub extra_item_threshold: Option<SettingValue>,

    /// Extra-item charge override
    pub extra_item_charge: Option<SettingValue>,

    /// Minimum order subtotal for this restaurant
    pub min_order_amount: Option<Amount>,
}

/// Concrete charge parameters after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCharges {
    /// Base delivery charge
    pub base: Amount,

    /// Regular units allowed before the extra-item charge applies
    pub threshold: Amount,

    /// Charge per surcharged unit
    pub extra_charge: Amount,
}

impl Default for ResolvedCharges {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE_DELIVERY_CHARGE,
            threshold: DEFAULT_EXTRA_ITEM_THRESHOLD,
            extra_charge: DEFAULT_EXTRA_ITEM_CHARGE,
        }
    }
}

/// Delivery bucket for a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemClass {
    /// Counted individually against the threshold
    Regular,

    /// Counted in bundles
    Light,

    /// Stepped individual surcharge
    Heavy,
}

/// Heavy and light id sets built once per evaluation.
#[derive(Debug)]
pub struct ItemClassifier<'a> {
    heavy: FxHashSet<&'a ItemId>,
    light: FxHashSet<&'a ItemId>,
}

impl ItemClassifier<'_> {
    /// Classify an item id. Heavy membership is checked before light membership.
    pub fn classify(&self, id: &ItemId) -> ItemClass {
        if self.heavy.contains(id) {
            ItemClass::Heavy
        } else if self.light.contains(id) {
            ItemClass::Light
        } else {
            ItemClass::Regular
        }
    }
}
