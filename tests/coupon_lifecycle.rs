//! Coupon lifecycle: applying, replacing, removing, and out-of-order responses.

use std::sync::Arc;

use async_trait::async_trait;
use testresult::TestResult;
use tokio::sync::Notify;

use campus_cart::{
    cart::Cart,
    coupons::{
        ApplyOutcome, Coupon, CouponKind, CouponRejection,
        resolver::CouponResolver,
        store::{CouponStore, CouponStoreError, InMemoryCouponStore},
    },
    items::{ItemId, LineItem},
    quote::{PricingContext, Quote},
    restaurants::RestaurantRegistry,
    settings::DeliverySettings,
};

/// Store whose `SLOW` lookup waits until released.
#[derive(Debug, Default)]
struct GatedStore {
    release: Notify,
}

#[async_trait]
impl CouponStore for GatedStore {
    async fn find(&self, code: &str) -> Result<Option<Coupon>, CouponStoreError> {
        if code == "SLOW" {
            self.release.notified().await;
        }

        Ok(Some(Coupon::new(code, CouponKind::Flat, 10)))
    }
}

fn coupon_store() -> InMemoryCouponStore {
    InMemoryCouponStore::new([
        Coupon::new("FEAST", CouponKind::Flat, 50).with_min_order(300),
        Coupon::new("PCT10", CouponKind::Percentage, 10),
        Coupon::new("ONCE", CouponKind::Flat, 20).with_usage(1, 1),
        Coupon::new("OFF", CouponKind::Flat, 20).inactive(),
    ])
}

fn dosa(qty: u32) -> LineItem {
    LineItem::new("A", "Masala Dosa", 100)
        .with_restaurant("R1")
        .with_quantity(qty)
}

#[tokio::test]
async fn prechecks_report_in_order() {
    let resolver = CouponResolver::new(Arc::new(coupon_store()));

    assert_eq!(
        resolver.apply_coupon("nope", 1_000).await,
        Err(CouponRejection::NotFound)
    );
    assert_eq!(
        resolver.apply_coupon("off", 1_000).await,
        Err(CouponRejection::Inactive)
    );
    assert_eq!(
        resolver.apply_coupon("feast", 120).await,
        Err(CouponRejection::BelowMinimum {
            code: "FEAST".to_string(),
            shortfall: 180,
        })
    );
    assert_eq!(
        resolver.apply_coupon("once", 1_000).await,
        Err(CouponRejection::UsageLimitReached)
    );
    assert_eq!(resolver.active_coupon(), None);
}

#[tokio::test]
async fn outcome_messages_match_storefront_copy() {
    let resolver = CouponResolver::new(Arc::new(coupon_store()));

    let applied = ApplyOutcome::from(&resolver.apply_coupon("pct10", 100).await);
    let invalid = ApplyOutcome::from(&resolver.apply_coupon("bogus", 100).await);
    let limited = ApplyOutcome::from(&resolver.apply_coupon("ONCE", 100).await);

    assert!(applied.success);
    assert_eq!(applied.message, "Coupon PCT10 applied");
    assert!(!invalid.success);
    assert_eq!(invalid.message, "Invalid Coupon Code");
    assert_eq!(limited.message, "Coupon usage limit reached");
    assert_eq!(resolver.active_code(), Some("PCT10".to_string()));
}

#[tokio::test]
async fn discount_drops_to_zero_below_minimum_while_code_stays_set() -> TestResult {
    let settings = DeliverySettings::default();
    let registry = RestaurantRegistry::default();
    let ctx = PricingContext::new(&settings, &registry);
    let resolver = CouponResolver::new(Arc::new(coupon_store()));

    let mut cart = Cart::with_items([dosa(3)]);

    resolver.apply_coupon("FEAST", cart.subtotal()).await?;

    let applied = Quote::evaluate(&cart, &ctx, resolver.active_coupon().as_ref());

    assert_eq!(applied.discount(), 50);

    cart.remove_item(&ItemId::from("A"))?;

    let edited = Quote::evaluate(&cart, &ctx, resolver.active_coupon().as_ref());

    assert_eq!(edited.discount(), 0);
    assert_eq!(edited.coupon_code(), Some("FEAST"));

    resolver.remove_coupon();

    let removed = Quote::evaluate(&cart, &ctx, resolver.active_coupon().as_ref());

    assert_eq!(removed.coupon_code(), None);

    Ok(())
}

#[tokio::test]
async fn stale_response_cannot_overwrite_newer_coupon() {
    let store = Arc::new(GatedStore::default());
    let resolver = CouponResolver::new(Arc::clone(&store) as Arc<dyn CouponStore>);

    let slow = resolver.apply_coupon("SLOW", 500);
    let fast = async {
        let result = resolver.apply_coupon("FAST", 500).await;
        store.release.notify_one();
        result
    };

    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow, Err(CouponRejection::Superseded));
    assert_eq!(fast.map(|coupon| coupon.code), Ok("FAST".to_string()));
    assert_eq!(resolver.active_code(), Some("FAST".to_string()));
}

#[tokio::test]
async fn remove_drops_in_flight_apply() {
    let store = Arc::new(GatedStore::default());
    let resolver = CouponResolver::new(Arc::clone(&store) as Arc<dyn CouponStore>);

    let slow = resolver.apply_coupon("SLOW", 500);
    let remove = async {
        let removed = resolver.remove_coupon();
        store.release.notify_one();
        removed
    };

    let (slow, removed) = tokio::join!(slow, remove);

    assert_eq!(slow, Err(CouponRejection::Superseded));
    assert_eq!(removed, None);
    assert_eq!(resolver.active_coupon(), None);
}

#[tokio::test]
async fn redeeming_updates_the_shared_store() -> TestResult {
    let store = Arc::new(InMemoryCouponStore::new([
        Coupon::new("TWICE", CouponKind::Flat, 10).with_usage(2, 1),
    ]));
    let resolver = CouponResolver::new(Arc::clone(&store) as Arc<dyn CouponStore>);

    resolver.apply_coupon("twice", 100).await?;

    store
        .upsert(Coupon::new("TWICE", CouponKind::Flat, 10).with_usage(2, 2))
        .await;

    // The pre-check runs against the latest record, so a second apply now fails.
    assert_eq!(
        resolver.apply_coupon("twice", 100).await,
        Err(CouponRejection::UsageLimitReached)
    );
    assert_eq!(resolver.active_code(), Some("TWICE".to_string()));

    Ok(())
}
