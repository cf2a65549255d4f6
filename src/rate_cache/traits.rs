//! Collaborator traits the rate cache is generic over, so its algorithm can
//! run against an in-memory fake in tests and a real backend in production.
//!
//! Grounded on the currency service's direct `Database`/`Client` fields,
//! generalized into `async_trait` seams so the dedup/fallback/staleness
//! behavior in `service.rs` is testable without redb or the network.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

/// Small key/value store: `currencyRatesCache` and `lastUserActivity` live
/// behind this trait as opaque JSON strings, which `service.rs` serializes
/// and deserializes itself (keeping this trait object-safe). Read errors are
/// swallowed to `None` by implementations; write errors are the caller's to
/// log and swallow.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String) -> Result<(), String>;
    async fn remove(&self, key: &str) -> Result<(), String>;
}

/// One rate-table fetch against an external exchange-rate API.
#[derive(Debug, Clone)]
pub struct FetchedRates {
    pub rates: HashMap<String, f64>,
}

/// Primary and fallback exchange-rate HTTP backends.
#[async_trait]
pub trait ExchangeRateClient: Send + Sync {
    async fn fetch_primary(&self, base: &str) -> Result<FetchedRates, String>;
    async fn fetch_fallback(&self, base: &str) -> Result<FetchedRates, String>;
}

pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
pub type AlarmCallback = Arc<dyn Fn() -> BoxFuture + Send + Sync>;

/// A periodic alarm, bound to `refresh_cache_if_needed` in production. The
/// core never spawns a runtime task itself; only a scheduler adapter does,
/// keeping the fetch algorithm runtime-agnostic and unit-testable without a
/// live scheduler.
pub trait AlarmScheduler: Send + Sync {
    fn schedule(&self, name: &str, period: Duration, callback: AlarmCallback);
}
