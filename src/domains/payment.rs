//! Payment Module
//!
//! Cached access to the subscription catalog, coupons and saved payment
//! methods. Payment processing itself is never cached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, CacheStore};
use crate::domains::read_through::{no_tags, ReadThrough};
use crate::error::UpstreamResult;

pub const PRODUCTS_TTL: Duration = Duration::from_secs(60 * 60);
pub const PAYMENT_METHODS_TTL: Duration = Duration::from_secs(60 * 60);
pub const COUPON_TTL: Duration = Duration::from_secs(5 * 60);
pub const SAVED_METHODS_TTL: Duration = Duration::from_secs(10 * 60);

/// Tag shared by every catalog entry
pub const CATALOG_TAG: &str = "payments";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionProduct {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: u64,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub popular: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: String,
    /// `card`, `bank_transfer`, ...
    pub kind: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub code: String,
    pub discount_percent: u8,
    pub valid_until: Option<DateTime<Utc>>,
}

impl Coupon {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_until.map_or(true, |until| now < until)
    }

    /// Applies the discount to a price, rounding down.
    pub fn apply(&self, price_cents: u64) -> u64 {
        let percent = u64::from(self.discount_percent.min(100));
        price_cents - price_cents * percent / 100
    }
}

// == Payment Source ==
#[async_trait]
pub trait PaymentSource: Send + Sync {
    async fn subscription_products(&self) -> UpstreamResult<Vec<SubscriptionProduct>>;
    async fn payment_methods(&self) -> UpstreamResult<Vec<PaymentMethod>>;
    async fn coupon(&self, code: &str) -> UpstreamResult<Option<Coupon>>;
    async fn saved_methods(&self, user_id: &str) -> UpstreamResult<Vec<PaymentMethod>>;
    async fn save_method(&self, user_id: &str, method: PaymentMethod) -> UpstreamResult<()>;
}

fn catalog_tags<T>(_: &T) -> Vec<String> {
    vec![CATALOG_TAG.to_string()]
}

// == Cached Payment Source ==
pub struct CachedPaymentSource<S> {
    inner: S,
    read_through: ReadThrough,
}

impl<S: PaymentSource> CachedPaymentSource<S> {
    pub fn new(inner: S, cache: Arc<CacheStore>) -> Self {
        Self {
            inner,
            read_through: ReadThrough::new(cache, "payments"),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drops every cached payment entry.
    pub fn clear_cache(&self) -> usize {
        self.read_through.invalidate_all()
    }

    /// Drops products, payment methods and coupons.
    pub fn refresh_catalog(&self) -> usize {
        self.read_through
            .invalidate(Vec::new(), [CATALOG_TAG.to_string()])
    }

    /// Looks a coupon up and checks it against the store clock.
    ///
    /// Codes are matched case-insensitively.
    pub async fn validate_coupon(&self, code: &str) -> UpstreamResult<Option<Coupon>> {
        let now = self.read_through.cache().clock().now();
        let coupon = self.coupon(code).await?;
        Ok(coupon.filter(|c| c.is_valid_at(now)))
    }
}

#[async_trait]
impl<S: PaymentSource> PaymentSource for CachedPaymentSource<S> {
    async fn subscription_products(&self) -> UpstreamResult<Vec<SubscriptionProduct>> {
        self.read_through
            .fetch(
                &CacheKey::new("subscription_products"),
                PRODUCTS_TTL,
                catalog_tags,
                || self.inner.subscription_products(),
            )
            .await
    }

    async fn payment_methods(&self) -> UpstreamResult<Vec<PaymentMethod>> {
        self.read_through
            .fetch(
                &CacheKey::new("payment_methods"),
                PAYMENT_METHODS_TTL,
                catalog_tags,
                || self.inner.payment_methods(),
            )
            .await
    }

    async fn coupon(&self, code: &str) -> UpstreamResult<Option<Coupon>> {
        let code = code.trim().to_uppercase();
        let key = CacheKey::new("coupon").arg(&code);
        self.read_through
            .fetch_optional(&key, COUPON_TTL, catalog_tags, || self.inner.coupon(&code))
            .await
    }

    async fn saved_methods(&self, user_id: &str) -> UpstreamResult<Vec<PaymentMethod>> {
        let key = CacheKey::new("saved_methods").arg(user_id);
        self.read_through
            .fetch(&key, SAVED_METHODS_TTL, no_tags, || {
                self.inner.saved_methods(user_id)
            })
            .await
    }

    async fn save_method(&self, user_id: &str, method: PaymentMethod) -> UpstreamResult<()> {
        self.inner.save_method(user_id, method).await?;
        self.read_through
            .invalidate([CacheKey::new("saved_methods").arg(user_id)], Vec::new());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::UpstreamError;
    use chrono::TimeZone;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakePayments {
        products: Mutex<Vec<SubscriptionProduct>>,
        coupons: Vec<Coupon>,
        saved: Mutex<HashMap<String, Vec<PaymentMethod>>>,
        reads: AtomicUsize,
        offline: bool,
    }

    impl FakePayments {
        fn read(&self) -> UpstreamResult<()> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self.offline {
                return Err(UpstreamError::Unavailable("billing".to_string()));
            }
            Ok(())
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentSource for FakePayments {
        async fn subscription_products(&self) -> UpstreamResult<Vec<SubscriptionProduct>> {
            self.read()?;
            Ok(self.products.lock().clone())
        }

        async fn payment_methods(&self) -> UpstreamResult<Vec<PaymentMethod>> {
            self.read()?;
            Ok(vec![card("card")])
        }

        async fn coupon(&self, code: &str) -> UpstreamResult<Option<Coupon>> {
            self.read()?;
            Ok(self.coupons.iter().find(|c| c.code == code).cloned())
        }

        async fn saved_methods(&self, user_id: &str) -> UpstreamResult<Vec<PaymentMethod>> {
            self.read()?;
            Ok(self.saved.lock().get(user_id).cloned().unwrap_or_default())
        }

        async fn save_method(&self, user_id: &str, method: PaymentMethod) -> UpstreamResult<()> {
            self.saved
                .lock()
                .entry(user_id.to_string())
                .or_default()
                .push(method);
            Ok(())
        }
    }

    fn card(id: &str) -> PaymentMethod {
        PaymentMethod {
            id: id.to_string(),
            kind: "card".to_string(),
            label: "Visa 4242".to_string(),
        }
    }

    fn product(id: &str) -> SubscriptionProduct {
        SubscriptionProduct {
            id: id.to_string(),
            title: "Premium".to_string(),
            description: String::new(),
            price_cents: 9_900,
            features: Vec::new(),
            popular: true,
        }
    }

    fn cached(fake: FakePayments) -> CachedPaymentSource<FakePayments> {
        CachedPaymentSource::new(fake, Arc::new(CacheStore::new(Duration::from_secs(60))))
    }

    #[tokio::test]
    async fn test_catalog_is_cached_until_refresh() {
        let fake = FakePayments::default();
        fake.products.lock().push(product("monthly"));
        let source = cached(fake);

        source.subscription_products().await.unwrap();
        source.subscription_products().await.unwrap();
        source.payment_methods().await.unwrap();
        assert_eq!(source.inner().reads(), 2);

        source.inner().products.lock().push(product("yearly"));
        assert_eq!(source.subscription_products().await.unwrap().len(), 1);

        assert_eq!(source.refresh_catalog(), 2);
        assert_eq!(source.subscription_products().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_reload() {
        let source = cached(FakePayments::default());

        source.subscription_products().await.unwrap();
        source.payment_methods().await.unwrap();
        assert_eq!(source.clear_cache(), 2);

        source.payment_methods().await.unwrap();
        assert_eq!(source.inner().reads(), 3);
    }

    #[tokio::test]
    async fn test_save_method_invalidates_only_that_user() {
        let source = cached(FakePayments::default());

        assert!(source.saved_methods("alice").await.unwrap().is_empty());
        source.saved_methods("bob").await.unwrap();

        source.save_method("alice", card("pm_1")).await.unwrap();

        assert_eq!(source.saved_methods("alice").await.unwrap().len(), 1);
        source.saved_methods("bob").await.unwrap();
        assert_eq!(source.inner().reads(), 3);
    }

    #[tokio::test]
    async fn test_coupon_codes_are_normalized() {
        let fake = FakePayments {
            coupons: vec![Coupon {
                code: "WELCOME10".to_string(),
                discount_percent: 10,
                valid_until: None,
            }],
            ..Default::default()
        };
        let source = cached(fake);

        assert!(source.coupon(" welcome10 ").await.unwrap().is_some());
        assert!(source.coupon("WELCOME10").await.unwrap().is_some());
        assert!(source.coupon("nope").await.unwrap().is_none());
        assert_eq!(source.inner().reads(), 2);
    }

    #[tokio::test]
    async fn test_validate_coupon_respects_expiry() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::at_millis(start.timestamp_millis()));
        let cache = Arc::new(CacheStore::with_clock(Duration::from_secs(60), clock.clone()));
        let fake = FakePayments {
            coupons: vec![Coupon {
                code: "SPRING".to_string(),
                discount_percent: 25,
                valid_until: Some(start + chrono::Duration::days(1)),
            }],
            ..Default::default()
        };
        let source = CachedPaymentSource::new(fake, cache);

        let coupon = source.validate_coupon("spring").await.unwrap().unwrap();
        assert_eq!(coupon.apply(10_000), 7_500);

        clock.advance(Duration::from_secs(2 * 24 * 3600));
        assert!(source.validate_coupon("spring").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failures_pass_through() {
        let source = cached(FakePayments {
            offline: true,
            ..Default::default()
        });

        assert_eq!(
            source.payment_methods().await,
            Err(UpstreamError::Unavailable("billing".to_string()))
        );
        assert!(source.read_through.cache().is_empty());
    }
}
