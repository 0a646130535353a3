//! Campus Cart
//!
//! Pricing and coupon-resolution engine for a campus food-delivery storefront.
//! A cart is priced from scratch on every change: delivery settings are resolved,
//! the delivery surcharge is computed from the item mix, minimum orders are
//! checked per restaurant, and the active coupon is turned into a discount.

pub mod cart;
pub mod checkout;
pub mod config;
pub mod coupons;
pub mod discounts;
pub mod fixtures;
pub mod items;
pub mod logging;
pub mod minimum_order;
pub mod money;
pub mod prelude;
pub mod quote;
pub mod restaurants;
pub mod settings;
pub mod surcharge;
