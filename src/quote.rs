//! Quote
//!
//! A snapshot of everything the storefront shows for a cart: item subtotal, the
//! delivery breakdown, the coupon discount, and the final total. A quote is
//! cheap to build and is rebuilt from scratch after every cart or settings change.

use std::io;

use tabled::{
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;
use tracing::debug;

use crate::{
    cart::Cart,
    coupons::Coupon,
    discounts::calculate_discount,
    items::Amount,
    minimum_order::{Shortfall, shortfalls},
    money::format_amount,
    restaurants::RestaurantRegistry,
    settings::DeliverySettings,
    surcharge::{SurchargeBreakdown, SurchargeInput, calculate},
};

/// Errors that can occur when rendering a quote.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Writing to the output failed.
    #[error("failed to write quote")]
    Io(#[from] io::Error),
}

/// Settings and catalog data a quote is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct PricingContext<'a> {
    /// Current global delivery settings
    pub settings: &'a DeliverySettings,

    /// Restaurant registry
    pub registry: &'a RestaurantRegistry,

    /// Campus picked by the customer, if any
    pub campus: Option<&'a str>,
}

impl<'a> PricingContext<'a> {
    /// Create a context with no campus selected.
    pub fn new(settings: &'a DeliverySettings, registry: &'a RestaurantRegistry) -> Self {
        Self {
            settings,
            registry,
            campus: None,
        }
    }

    /// Select a campus by id or name.
    #[must_use]
    pub fn with_campus(mut self, campus: &'a str) -> Self {
        self.campus = Some(campus);
        self
    }
}

/// `max(0, subtotal + delivery - discount)`.
pub fn final_total(subtotal: Amount, delivery: Amount, discount: Amount) -> Amount {
    subtotal
        .saturating_add(delivery)
        .saturating_sub(discount)
        .max(0)
}

/// Derived totals for a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    subtotal: Amount,
    delivery: SurchargeBreakdown,
    discount: Amount,
    total: Amount,
    shortfalls: Vec<Shortfall>,
    coupon_code: Option<String>,
    line_count: usize,
}

impl Quote {
    /// Evaluate a cart against the current settings and the active coupon.
    ///
    /// The per-restaurant overrides come from the restaurant of the first line in
    /// the cart. An empty cart has no delivery charge.
    pub fn evaluate(cart: &Cart, ctx: &PricingContext<'_>, coupon: Option<&Coupon>) -> Self {
        let subtotal = cart.subtotal();

        let delivery = if cart.is_empty() {
            SurchargeBreakdown::default()
        } else {
            let overrides = cart
                .primary_restaurant()
                .and_then(|id| ctx.registry.settings(id));

            calculate(&SurchargeInput {
                items: cart.items(),
                settings: ctx.settings,
                charges: ctx.settings.resolve(overrides),
                restaurant_count: cart.restaurant_ids().len(),
                campus: ctx.campus,
            })
        };

        let discount = coupon.map_or(0, |coupon| {
            calculate_discount(coupon, cart.items(), subtotal)
        });

        let total = final_total(subtotal, delivery.total(), discount);

        debug!(
            subtotal,
            delivery = delivery.total(),
            discount,
            total,
            "recomputed quote"
        );

        Self {
            subtotal,
            delivery,
            discount,
            total,
            shortfalls: shortfalls(cart.items(), ctx.registry),
            coupon_code: coupon.map(|coupon| coupon.code.clone()),
            line_count: cart.len(),
        }
    }

    /// Sum of line totals
    pub fn subtotal(&self) -> Amount {
        self.subtotal
    }

    /// Delivery charge
    pub fn delivery_charge(&self) -> Amount {
        self.delivery.total()
    }

    /// Every component of the delivery charge
    pub fn delivery(&self) -> &SurchargeBreakdown {
        &self.delivery
    }

    /// Coupon discount, zero without a coupon
    pub fn discount(&self) -> Amount {
        self.discount
    }

    /// Amount payable
    pub fn total(&self) -> Amount {
        self.total
    }

    /// Restaurants below their minimum order amount
    pub fn shortfalls(&self) -> &[Shortfall] {
        &self.shortfalls
    }

    /// Code of the coupon the quote was evaluated with.
    ///
    /// Stays set while the discount is zero because the cart fell below the coupon minimum.
    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    /// Whether the cart can be submitted: it has lines and no minimum-order shortfalls.
    pub fn can_checkout(&self) -> bool {
        self.line_count > 0 && self.shortfalls.is_empty()
    }

    /// Render the quote as a table.
    ///
    /// # Errors
    ///
    /// Returns a [`QuoteError`] if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), QuoteError> {
        let mut builder = Builder::default();

        builder.push_record(["", "Amount"]);
        builder.push_record(["Subtotal".to_string(), format_amount(self.subtotal)]);

        self.push_delivery_rows(&mut builder);

        if let Some(code) = &self.coupon_code {
            builder.push_record([
                format!("Discount ({code})"),
                format!("-{}", format_amount(self.discount)),
            ]);
        }

        builder.push_record(["Total".to_string(), format_amount(self.total)]);

        let mut table = builder.build();

        table
            .with(Style::modern_rounded())
            .modify(Columns::last(), Alignment::right())
            .modify(Rows::first(), Alignment::center());

        writeln!(out, "{table}")?;

        for shortfall in &self.shortfalls {
            writeln!(
                out,
                "Add {} more from {} to reach its minimum order of {}",
                format_amount(shortfall.shortfall),
                shortfall.restaurant_name,
                format_amount(shortfall.min_amount),
            )?;
        }

        Ok(())
    }

    fn push_delivery_rows(&self, builder: &mut Builder) {
        let delivery = &self.delivery;

        builder.push_record(["Delivery".to_string(), format_amount(delivery.total())]);

        let components = [
            ("  Base", delivery.base),
            ("  Extra restaurants", delivery.multi_restaurant),
            ("  Large order", delivery.large_order),
            ("  Heavy items", delivery.heavy),
            ("  Campus", delivery.campus),
        ];

        for (label, amount) in components.into_iter().filter(|(_, amount)| *amount != 0) {
            builder.push_record([label.to_string(), format_amount(amount)]);
        }
    }
}
