//! Delivery Surcharge
//!
//! Derives the delivery charge for a cart from its item mix:
//!
//! 1. every restaurant beyond the first adds [`MULTI_RESTAURANT_CHARGE`] to the base;
//! 2. regular units above the threshold, plus one unit per full bundle of light items,
//!    are each charged `extra_charge`;
//! 3. heavy items add a stepped charge of their own;
//! 4. the selected campus adds its flat charge.

use crate::{
    items::{Amount, LineItem},
    settings::{DeliverySettings, ItemClass, ResolvedCharges},
};

/// Added to the base charge for every restaurant beyond the first.
pub const MULTI_RESTAURANT_CHARGE: Amount = 10;

/// Per-bucket unit counts for a cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketTotals {
    /// Regular units
    pub regular: Amount,

    /// Light units
    pub light: Amount,

    /// Heavy units
    pub heavy: Amount,
}

impl BucketTotals {
    /// Classify and count every line.
    pub fn from_items<'a>(
        items: impl IntoIterator<Item = &'a LineItem>,
        settings: &DeliverySettings,
    ) -> Self {
        let classifier = settings.classifier();

        items
            .into_iter()
            .fold(Self::default(), |mut totals, item| {
                let quantity = Amount::from(item.quantity());

                let bucket = match classifier.classify(item.id()) {
                    ItemClass::Heavy => &mut totals.heavy,
                    ItemClass::Light => &mut totals.light,
                    ItemClass::Regular => &mut totals.regular,
                };

                *bucket = bucket.saturating_add(quantity);

                totals
            })
    }
}

/// Everything that goes into the delivery charge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurchargeBreakdown {
    /// Resolved base charge, before the multi-restaurant addend
    pub base: Amount,

    /// Multi-restaurant addend
    pub multi_restaurant: Amount,

    /// Unit counts per bucket
    pub buckets: BucketTotals,

    /// Surcharged units from regular overflow and light bundles
    pub surcharge_units: Amount,

    /// `surcharge_units * extra_charge`
    pub large_order: Amount,

    /// Heavy-item charge
    pub heavy: Amount,

    /// Campus addend
    pub campus: Amount,
}

impl SurchargeBreakdown {
    /// Final delivery charge, saturating at [`Amount::MAX`].
    pub fn total(&self) -> Amount {
        [self.multi_restaurant, self.large_order, self.heavy, self.campus]
            .into_iter()
            .fold(self.base, Amount::saturating_add)
    }
}

/// Inputs for one surcharge evaluation.
#[derive(Debug, Clone, Copy)]
pub struct SurchargeInput<'a> {
    /// Cart lines
    pub items: &'a [LineItem],

    /// Global delivery settings
    pub settings: &'a DeliverySettings,

    /// Resolved base, threshold and extra charge
    pub charges: ResolvedCharges,

    /// Distinct restaurants in the cart
    pub restaurant_count: usize,

    /// Campus picked by the customer, if any
    pub campus: Option<&'a str>,
}

/// Compute the delivery surcharge breakdown.
pub fn calculate(input: &SurchargeInput<'_>) -> SurchargeBreakdown {
    let charges = input.charges;
    let buckets = BucketTotals::from_items(input.items, input.settings);

    let surcharge_units = regular_overflow(buckets.regular, charges.threshold)
        .saturating_add(light_bundles(buckets.light, input.settings));

    SurchargeBreakdown {
        base: charges.base,
        multi_restaurant: multi_restaurant_addend(input.restaurant_count),
        buckets,
        surcharge_units,
        large_order: surcharge_units.saturating_mul(charges.extra_charge),
        heavy: heavy_surcharge(
            &buckets,
            charges.extra_charge,
            input.settings.heavy_item_charge(),
        ),
        campus: input
            .campus
            .map_or(0, |campus| input.settings.campus_charge(campus)),
    }
}

/// `(restaurants - 1) * MULTI_RESTAURANT_CHARGE`, or zero for one restaurant or none.
pub fn multi_restaurant_addend(restaurant_count: usize) -> Amount {
    let extra = Amount::try_from(restaurant_count.saturating_sub(1)).unwrap_or(Amount::MAX);

    extra.saturating_mul(MULTI_RESTAURANT_CHARGE)
}

/// Regular units above the threshold.
pub fn regular_overflow(regular: Amount, threshold: Amount) -> Amount {
    regular.saturating_sub(threshold).max(0)
}

/// Full bundles of light units.
pub fn light_bundles(light: Amount, settings: &DeliverySettings) -> Amount {
    light.checked_div(settings.light_bundle_size()).unwrap_or(0)
}

/// Stepped heavy-item charge.
///
/// A single heavy unit is charged one `extra_charge` only when regular units are
/// also present; light units do not count. Every heavy unit beyond the first is
/// charged `heavy_item_charge`.
pub fn heavy_surcharge(
    buckets: &BucketTotals,
    extra_charge: Amount,
    heavy_item_charge: Amount,
) -> Amount {
    match buckets.heavy {
        0 => 0,
        1 if buckets.regular > 0 => extra_charge,
        1 => 0,
        heavy => heavy.saturating_sub(1).saturating_mul(heavy_item_charge),
    }
}
