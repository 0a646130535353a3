//! Coupon Store
//!
//! Two contracts with the remote coupon store: a point lookup used when a coupon
//! is applied, and a redemption used at checkout that re-checks the coupon and
//! increments its usage counter in one step.

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    coupons::{Coupon, normalize_code},
    items::Amount,
};

/// Lookup failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CouponStoreError {
    /// The request did not complete.
    #[error("coupon store unavailable: {0}")]
    Unavailable(String),
}

/// Reasons the authoritative checkout-time check can reject a coupon.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RedemptionError {
    /// Every redemption has been used.
    #[error("resource-exhausted: coupon usage limit reached")]
    ResourceExhausted,

    /// The coupon no longer exists.
    #[error("not-found: coupon does not exist")]
    NotFound,

    /// The coupon exists but does not apply to this order.
    #[error("invalid: {0}")]
    Invalid(String),

    /// The request did not complete.
    #[error("unavailable: {0}")]
    Unavailable(String),
}

impl RedemptionError {
    /// Whether the client should drop the active coupon after this error.
    ///
    /// Transient failures keep the coupon so the customer can retry.
    pub fn removes_coupon(&self) -> bool {
        !matches!(self, RedemptionError::Unavailable(_))
    }
}

/// Point lookup by upper-cased code.
#[automock]
#[async_trait]
pub trait CouponStore: Send + Sync {
    /// Fetch a coupon, `Ok(None)` when no coupon has this code.
    async fn find(&self, code: &str) -> Result<Option<Coupon>, CouponStoreError>;
}

/// Authoritative checkout-time validation.
#[automock]
#[async_trait]
pub trait CouponRedeemer: Send + Sync {
    /// Re-check a coupon against the order subtotal and count one redemption.
    async fn redeem(&self, code: &str, subtotal: Amount) -> Result<Coupon, RedemptionError>;
}

/// Coupon store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryCouponStore {
    coupons: Mutex<FxHashMap<String, Coupon>>,
}

impl InMemoryCouponStore {
    /// Create a store from coupon records, keyed by normalised code.
    pub fn new(coupons: impl IntoIterator<Item = Coupon>) -> Self {
        Self {
            coupons: Mutex::new(
                coupons
                    .into_iter()
                    .map(|coupon| (normalize_code(&coupon.code), coupon))
                    .collect(),
            ),
        }
    }

    /// Insert or replace a coupon.
    pub async fn upsert(&self, coupon: Coupon) {
        self.coupons
            .lock()
            .await
            .insert(normalize_code(&coupon.code), coupon);
    }

    /// Delete a coupon, returning it if it existed.
    pub async fn delete(&self, code: &str) -> Option<Coupon> {
        self.coupons.lock().await.remove(&normalize_code(code))
    }

    /// Current redemption count for a coupon.
    pub async fn used_count(&self, code: &str) -> Option<u32> {
        self.coupons
            .lock()
            .await
            .get(&normalize_code(code))
            .map(|coupon| coupon.used_count)
    }
}

#[async_trait]
impl CouponStore for InMemoryCouponStore {
    async fn find(&self, code: &str) -> Result<Option<Coupon>, CouponStoreError> {
        Ok(self.coupons.lock().await.get(&normalize_code(code)).cloned())
    }
}

#[async_trait]
impl CouponRedeemer for InMemoryCouponStore {
    #[tracing::instrument(name = "coupons.store.redeem", skip(self), err)]
    async fn redeem(&self, code: &str, subtotal: Amount) -> Result<Coupon, RedemptionError> {
        let mut coupons = self.coupons.lock().await;

        let coupon = coupons
            .get_mut(&normalize_code(code))
            .ok_or(RedemptionError::NotFound)?;

        if !coupon.active {
            return Err(RedemptionError::Invalid("coupon is inactive".to_string()));
        }

        if !coupon.meets_minimum(subtotal) {
            return Err(RedemptionError::Invalid(
                "minimum order amount not met".to_string(),
            ));
        }

        if coupon.is_exhausted() {
            return Err(RedemptionError::ResourceExhausted);
        }

        coupon.used_count = coupon.used_count.saturating_add(1);

        info!(code = %coupon.code, used_count = coupon.used_count, "redeemed coupon");

        Ok(coupon.clone())
    }
}
