//! Campus Cart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError},
    checkout::{
        Checkout, CheckoutError, CustomerDetails, DetailsError, DetailsStore, OrderRecord,
        OrderSink, OrderSinkError, SubmittedOrder,
    },
    coupons::{
        ApplyOutcome, Coupon, CouponKind, CouponRejection, CouponTarget,
        resolver::CouponResolver,
        store::{
            CouponRedeemer, CouponStore, CouponStoreError, InMemoryCouponStore, RedemptionError,
        },
    },
    discounts::{FREE_UNIT_PRICING, FreeUnitPricing, calculate_discount},
    fixtures::{Fixture, FixtureError},
    items::{Amount, ItemId, LineItem, RestaurantId},
    minimum_order::Shortfall,
    quote::{PricingContext, Quote, QuoteError},
    restaurants::{MenuItem, Restaurant, RestaurantRegistry},
    settings::{DeliverySettings, RestaurantSettings, SettingValue},
    surcharge::SurchargeBreakdown,
};
