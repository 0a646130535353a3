//! Coupon Resolver
//!
//! Holds the single active coupon for a cart. Applying a coupon fetches the
//! authoritative record and runs the client-side pre-checks; on success the
//! coupon replaces whatever was active before.
//!
//! Every apply takes a request token from a monotonic counter, and `remove_coupon`
//! advances the counter too. A lookup that resolves after a newer apply or remove
//! has started is dropped, so a slow response can never overwrite a newer one.

use std::{
    fmt,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use tracing::{info, warn};

use crate::{
    coupons::{Coupon, CouponRejection, normalize_code, store::CouponStore},
    items::Amount,
};

/// Active coupon slot with stale-response protection.
pub struct CouponResolver {
    store: Arc<dyn CouponStore>,
    latest_request: AtomicU64,
    active: Mutex<Option<Coupon>>,
}

impl CouponResolver {
    /// Create a resolver with no active coupon.
    pub fn new(store: Arc<dyn CouponStore>) -> Self {
        Self {
            store,
            latest_request: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    /// Look up a coupon and make it the active coupon if it passes the pre-checks.
    ///
    /// A rejected coupon leaves the current active coupon untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`CouponRejection`] when the code is unknown, the coupon fails a
    /// pre-check, the store is unreachable, or a newer request superseded this one.
    #[tracing::instrument(name = "coupons.resolver.apply_coupon", skip(self))]
    pub async fn apply_coupon(
        &self,
        code: &str,
        subtotal: Amount,
    ) -> Result<Coupon, CouponRejection> {
        let code = normalize_code(code);
        let token = self.next_token();

        if code.is_empty() {
            return Err(CouponRejection::NotFound);
        }

        let lookup = self.store.find(&code).await;

        let coupon = match lookup {
            Ok(Some(coupon)) => coupon,
            Ok(None) => {
                warn!(%code, "coupon not found");
                return Err(self.rejection(token, CouponRejection::NotFound));
            }
            Err(source) => {
                warn!(%code, error = %source, "coupon lookup failed");
                return Err(self.rejection(token, CouponRejection::Unavailable));
            }
        };

        if let Err(rejection) = coupon.precheck(subtotal) {
            warn!(%code, %rejection, "coupon rejected");
            return Err(self.rejection(token, rejection));
        }

        let mut slot = self.slot();

        if !self.is_current(token) {
            warn!(%code, token, "dropping superseded coupon response");
            return Err(CouponRejection::Superseded);
        }

        *slot = Some(coupon.clone());

        info!(%code, "applied coupon");

        Ok(coupon)
    }

    /// Clear the active coupon and drop any apply still in flight.
    pub fn remove_coupon(&self) -> Option<Coupon> {
        let mut slot = self.slot();

        self.next_token();

        let removed = slot.take();

        if let Some(coupon) = &removed {
            info!(code = %coupon.code, "removed coupon");
        }

        removed
    }

    /// The active coupon, if any.
    pub fn active_coupon(&self) -> Option<Coupon> {
        self.slot().clone()
    }

    /// Code of the active coupon, if any.
    pub fn active_code(&self) -> Option<String> {
        self.slot().as_ref().map(|coupon| coupon.code.clone())
    }

    fn next_token(&self) -> u64 {
        self.latest_request.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, token: u64) -> bool {
        self.latest_request.load(Ordering::SeqCst) == token
    }

    /// Report a rejection, or `Superseded` when a newer request has started.
    fn rejection(&self, token: u64, rejection: CouponRejection) -> CouponRejection {
        if self.is_current(token) {
            rejection
        } else {
            CouponRejection::Superseded
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Coupon>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CouponResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CouponResolver")
            .field("latest_request", &self.latest_request)
            .field("active", &self.active_code())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::coupons::{
        CouponKind,
        store::{CouponStoreError, MockCouponStore},
    };

    use super::*;

    fn resolver_with(store: MockCouponStore) -> CouponResolver {
        CouponResolver::new(Arc::new(store))
    }

    #[tokio::test]
    async fn apply_sets_active_coupon() -> TestResult {
        let mut store = MockCouponStore::new();
        let coupon = Coupon::new("SAVE10", CouponKind::Flat, 10);

        store
            .expect_find()
            .once()
            .withf(|code| code == "SAVE10")
            .return_once(move |_| Ok(Some(coupon)));

        let resolver = resolver_with(store);

        let applied = resolver.apply_coupon(" save10 ", 500).await?;

        assert_eq!(applied.code, "SAVE10");
        assert_eq!(resolver.active_code(), Some("SAVE10".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn empty_code_is_rejected_without_lookup() {
        let mut store = MockCouponStore::new();

        store.expect_find().never();

        let resolver = resolver_with(store);

        assert_eq!(
            resolver.apply_coupon("   ", 500).await,
            Err(CouponRejection::NotFound)
        );
    }

    #[tokio::test]
    async fn unknown_code_is_invalid() {
        let mut store = MockCouponStore::new();

        store.expect_find().once().return_once(|_| Ok(None));

        let resolver = resolver_with(store);

        let result = resolver.apply_coupon("NOPE", 500).await;

        assert_eq!(result, Err(CouponRejection::NotFound));
        assert_eq!(
            result.err().map(|rejection| rejection.to_string()),
            Some("Invalid Coupon Code".to_string())
        );
    }

    #[tokio::test]
    async fn store_failure_is_unavailable() {
        let mut store = MockCouponStore::new();

        store
            .expect_find()
            .once()
            .return_once(|_| Err(CouponStoreError::Unavailable("timeout".to_string())));

        let resolver = resolver_with(store);

        assert_eq!(
            resolver.apply_coupon("SAVE10", 500).await,
            Err(CouponRejection::Unavailable)
        );
        assert_eq!(resolver.active_coupon(), None);
    }

    #[tokio::test]
    async fn rejection_keeps_previous_coupon() -> TestResult {
        let mut store = MockCouponStore::new();
        let good = Coupon::new("GOOD", CouponKind::Flat, 10);
        let off = Coupon::new("OFF", CouponKind::Flat, 10).inactive();

        store
            .expect_find()
            .times(2)
            .returning(move |code| {
                Ok(Some(if code == "GOOD" {
                    good.clone()
                } else {
                    off.clone()
                }))
            });

        let resolver = resolver_with(store);

        resolver.apply_coupon("GOOD", 500).await?;

        assert_eq!(
            resolver.apply_coupon("OFF", 500).await,
            Err(CouponRejection::Inactive)
        );
        assert_eq!(resolver.active_code(), Some("GOOD".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn applying_a_new_coupon_replaces_the_old() -> TestResult {
        let mut store = MockCouponStore::new();

        store
            .expect_find()
            .times(2)
            .returning(|code| Ok(Some(Coupon::new(code, CouponKind::Flat, 10))));

        let resolver = resolver_with(store);

        resolver.apply_coupon("FIRST", 500).await?;
        resolver.apply_coupon("SECOND", 500).await?;

        assert_eq!(resolver.active_code(), Some("SECOND".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn remove_clears_unconditionally() -> TestResult {
        let mut store = MockCouponStore::new();

        store
            .expect_find()
            .once()
            .returning(|code| Ok(Some(Coupon::new(code, CouponKind::Flat, 10))));

        let resolver = resolver_with(store);

        assert_eq!(resolver.remove_coupon(), None);

        resolver.apply_coupon("SAVE10", 500).await?;

        assert_eq!(
            resolver.remove_coupon().map(|coupon| coupon.code),
            Some("SAVE10".to_string())
        );
        assert_eq!(resolver.active_coupon(), None);

        Ok(())
    }

    #[test]
    fn debug_shows_active_code() {
        let resolver = resolver_with(MockCouponStore::new());

        let debug = format!("{resolver:?}");

        assert!(debug.contains("CouponResolver"));
        assert!(debug.contains("active: None"));
    }
}
