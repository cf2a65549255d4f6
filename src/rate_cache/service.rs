//! The rate cache service: at-most-one-in-flight-fetch-per-pair currency
//! rate lookups with primary/fallback APIs and activity-gated staleness.
//!
//! Generalizes the currency service's single eager USD-keyed `cache` field
//! into a per-base-currency cache entry with explicit staleness, fallback,
//! and activity bookkeeping, and replaces its direct `Database`/`Client`
//! fields with the `KvStore`/`ExchangeRateClient` collaborator traits so the
//! dedup and fallback behavior can be driven by in-memory fakes in tests.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};

use super::traits::{ExchangeRateClient, KvStore};

const CACHE_KEY: &str = "currencyRatesCache";
const ACTIVITY_KEY: &str = "lastUserActivity";

/// The four durations governing cache validity, staleness, and refresh.
#[derive(Debug, Clone, Copy)]
pub struct RateCacheConfig {
    pub cache_timeout: Duration,
    pub inactivity_threshold: Duration,
    pub stale_threshold: Duration,
    pub refresh_threshold: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            cache_timeout: Duration::from_secs(60 * 60),
            inactivity_threshold: Duration::from_secs(5 * 60),
            stale_threshold: Duration::from_secs(45 * 60),
            refresh_threshold: Duration::from_secs(50 * 60),
        }
    }
}

/// A persisted rate table for one base currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyRateCacheEntry {
    pub rates: HashMap<String, f64>,
    pub timestamp: i64,
    pub used_fallback: bool,
}

/// The outcome of a `get_currency_rate` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RateResult {
    pub rate: f64,
    pub used_fallback: bool,
    pub from_cache: bool,
    pub stale: bool,
}

/// The narrow error taxonomy shared across the conversion engine. Detection
/// and unit conversion are total functions over `Option` and never construct
/// `NoMatch`/`UnknownUnit`/`ParseFailure` as a `Result` error, but they share
/// this vocabulary with the rate cache, whose recovered failure modes
/// (`StorageUnavailable`, `PrimaryApiFailure`, `FallbackApiFailure`) are
/// logged, not propagated. `RateUnavailable` is the one variant
/// `RateCacheService::get_currency_rate` ever returns to a caller.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RateCacheError {
    #[error("no conversion found")]
    NoMatch,
    #[error("unknown unit or currency code")]
    UnknownUnit,
    #[error("could not parse number or time")]
    ParseFailure,
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("primary rate API failed: {0}")]
    PrimaryApiFailure(String),
    #[error("fallback rate API failed: {0}")]
    FallbackApiFailure(String),
    #[error("no rate available for {from}/{to}")]
    RateUnavailable { from: String, to: String },
}

type FetchOutcome = Result<RateResult, RateCacheError>;

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub struct RateCacheService<S: KvStore, C: ExchangeRateClient> {
    store: S,
    client: C,
    config: RateCacheConfig,
    in_flight: Mutex<HashMap<(String, String), broadcast::Sender<FetchOutcome>>>,
    last_activity: StdMutex<i64>,
}

impl<S: KvStore, C: ExchangeRateClient> RateCacheService<S, C> {
    pub fn new(store: S, client: C, config: RateCacheConfig) -> Self {
        Self {
            store,
            client,
            config,
            in_flight: Mutex::new(HashMap::new()),
            last_activity: StdMutex::new(0),
        }
    }

    /// Resolves `(from, to)` to a rate, deduplicating concurrent callers for
    /// the same pair onto a single in-flight fetch.
    pub async fn get_currency_rate(&self, from: &str, to: &str) -> FetchOutcome {
        let from = from.to_lowercase();
        let to = to.to_lowercase();
        let key = (from.clone(), to.clone());

        let existing_receiver = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(sender) = in_flight.get(&key) {
                Some(sender.subscribe())
            } else {
                let (tx, _rx) = broadcast::channel(1);
                in_flight.insert(key.clone(), tx);
                None
            }
        };

        if let Some(mut rx) = existing_receiver {
            return rx.recv().await.unwrap_or_else(|_| {
                Err(RateCacheError::RateUnavailable {
                    from: from.clone(),
                    to: to.clone(),
                })
            });
        }

        let result = self.fetch_rate(&from, &to).await;

        let sender = self.in_flight.lock().await.remove(&key);
        if let Some(sender) = sender {
            let _ = sender.send(result.clone());
        }

        result
    }

    async fn fetch_rate(&self, from: &str, to: &str) -> FetchOutcome {
        let now = now_millis();
        let all = self.load_all().await;
        let cached = all.get(from).cloned();

        if let Some(entry) = &cached {
            if self.is_cache_valid(entry, now) {
                if let Some(rate) = entry.rates.get(to) {
                    return Ok(RateResult {
                        rate: *rate,
                        used_fallback: entry.used_fallback,
                        from_cache: true,
                        stale: false,
                    });
                }
            }
        }

        let stale_rate = cached.as_ref().and_then(|e| e.rates.get(to).copied());
        let stale_used_fallback = cached.as_ref().map(|e| e.used_fallback).unwrap_or(false);

        if !self.should_refresh_cache(cached.as_ref(), now) {
            if let Some(rate) = stale_rate {
                return Ok(RateResult {
                    rate,
                    used_fallback: stale_used_fallback,
                    from_cache: true,
                    stale: true,
                });
            }
        }

        match self.client.fetch_primary(from).await {
            Ok(fetched) => {
                if let Some(rate) = fetched.rates.get(to).copied() {
                    self.save_entry(
                        from,
                        CurrencyRateCacheEntry {
                            rates: fetched.rates,
                            timestamp: now,
                            used_fallback: false,
                        },
                    )
                    .await;
                    return Ok(RateResult {
                        rate,
                        used_fallback: false,
                        from_cache: false,
                        stale: false,
                    });
                }
                self.save_entry(
                    from,
                    CurrencyRateCacheEntry {
                        rates: fetched.rates,
                        timestamp: now,
                        used_fallback: false,
                    },
                )
                .await;
                log::debug!("primary rates for {from} had no entry for {to}; trying fallback");
            }
            Err(e) => log::warn!("{}", RateCacheError::PrimaryApiFailure(format!("{from}: {e}"))),
        }

        match self.client.fetch_fallback(from).await {
            Ok(fetched) => {
                if let Some(rate) = fetched.rates.get(to).copied() {
                    self.save_entry(
                        from,
                        CurrencyRateCacheEntry {
                            rates: fetched.rates,
                            timestamp: now,
                            used_fallback: true,
                        },
                    )
                    .await;
                    return Ok(RateResult {
                        rate,
                        used_fallback: true,
                        from_cache: false,
                        stale: false,
                    });
                }
                log::warn!("fallback rates for {from} had no entry for {to}");
            }
            Err(e) => log::warn!("{}", RateCacheError::FallbackApiFailure(format!("{from}: {e}"))),
        }

        if let Some(rate) = stale_rate {
            log::warn!("primary and fallback both failed for {from}; serving stale cache");
            return Ok(RateResult {
                rate,
                used_fallback: stale_used_fallback,
                from_cache: true,
                stale: true,
            });
        }

        Err(RateCacheError::RateUnavailable {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// Fire-and-forget: pings from activity events call this to opportunistically
    /// refresh a cache that is drifting toward staleness. Never returns an error.
    pub async fn prefetch_if_stale(&self) {
        if !self.is_user_active() {
            return;
        }
        let now = now_millis();
        let all = self.load_all().await;
        match all.get("usd") {
            None => self.warm_cache().await,
            Some(entry) => {
                let age = now - entry.timestamp;
                let stale = self.config.stale_threshold.as_millis() as i64;
                let timeout = self.config.cache_timeout.as_millis() as i64;
                if age >= stale && age < timeout {
                    if let Err(e) = self.fetch_and_store_primary("usd").await {
                        log::debug!("prefetch for usd failed (swallowed): {e}");
                    }
                }
            }
        }
    }

    /// Called on install and on startup: seeds the `usd` base, which yields
    /// every currency's rate in one call, unless it's already cached and valid.
    pub async fn warm_cache(&self) {
        let now = now_millis();
        let all = self.load_all().await;
        if let Some(entry) = all.get("usd") {
            if self.is_cache_valid(entry, now) {
                return;
            }
        }
        if let Err(e) = self.fetch_and_store_primary("usd").await {
            log::warn!("warm cache fetch failed: {e}");
        }
    }

    /// Alarm-driven: re-fetches every cached base whose entry has aged past
    /// `refresh_threshold`, provided the user is active. Continues past
    /// individual fetch failures.
    pub async fn refresh_cache_if_needed(&self) {
        if !self.is_user_active() {
            return;
        }
        let now = now_millis();
        let all = self.load_all().await;
        let refresh = self.config.refresh_threshold.as_millis() as i64;
        for (base, entry) in all.iter() {
            if now - entry.timestamp > refresh {
                if let Err(e) = self.fetch_and_store_primary(base).await {
                    log::warn!("scheduled refresh failed for {base}: {e}");
                }
            }
        }
    }

    /// Removes the cache record from storage. The activity record is untouched.
    pub async fn clear_cache(&self) {
        if let Err(e) = self.store.remove(CACHE_KEY).await {
            log::warn!("failed to clear currency rate cache: {e}");
        }
    }

    /// Marks the user as active now and persists it. Callers are expected to
    /// throttle to roughly once per `inactivity_threshold` window.
    pub async fn update_activity(&self) {
        let now = now_millis();
        *self.last_activity.lock().unwrap() = now;
        if let Err(e) = self.store.set(ACTIVITY_KEY, now.to_string()).await {
            log::warn!("failed to persist activity timestamp: {e}");
        }
    }

    /// Reads the persisted activity timestamp at startup, defaulting to 0,
    /// and hydrates the in-memory mirror used by `is_user_active`.
    pub async fn load_activity(&self) -> i64 {
        let stored = self
            .store
            .get(ACTIVITY_KEY)
            .await
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(0);
        *self.last_activity.lock().unwrap() = stored;
        stored
    }

    fn is_user_active(&self) -> bool {
        let last = *self.last_activity.lock().unwrap();
        now_millis() - last < self.config.inactivity_threshold.as_millis() as i64
    }

    fn is_cache_valid(&self, entry: &CurrencyRateCacheEntry, now: i64) -> bool {
        now - entry.timestamp < self.config.cache_timeout.as_millis() as i64
    }

    fn should_refresh_cache(&self, entry: Option<&CurrencyRateCacheEntry>, now: i64) -> bool {
        match entry {
            None => true,
            Some(e) => self.is_user_active() && now - e.timestamp >= self.config.cache_timeout.as_millis() as i64,
        }
    }

    async fn fetch_and_store_primary(&self, base: &str) -> Result<(), String> {
        let fetched = self.client.fetch_primary(base).await?;
        self.save_entry(
            base,
            CurrencyRateCacheEntry {
                rates: fetched.rates,
                timestamp: now_millis(),
                used_fallback: false,
            },
        )
        .await;
        Ok(())
    }

    async fn load_all(&self) -> HashMap<String, CurrencyRateCacheEntry> {
        self.store
            .get(CACHE_KEY)
            .await
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    async fn save_entry(&self, base: &str, entry: CurrencyRateCacheEntry) {
        let mut all = self.load_all().await;
        all.insert(base.to_string(), entry);
        match serde_json::to_string(&all) {
            Ok(json) => {
                if let Err(e) = self.store.set(CACHE_KEY, json).await {
                    log::warn!("{}", RateCacheError::StorageUnavailable(e));
                }
            }
            Err(e) => log::warn!("failed to serialize currency rate cache: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_cache::traits::FetchedRates;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::RwLock as AsyncRwLock;

    #[derive(Default)]
    struct FakeStore {
        data: AsyncRwLock<HashMap<String, String>>,
    }

    #[async_trait::async_trait]
    impl KvStore for FakeStore {
        async fn get(&self, key: &str) -> Option<String> {
            self.data.read().await.get(key).cloned()
        }
        async fn set(&self, key: &str, value: String) -> Result<(), String> {
            self.data.write().await.insert(key.to_string(), value);
            Ok(())
        }
        async fn remove(&self, key: &str) -> Result<(), String> {
            self.data.write().await.remove(key);
            Ok(())
        }
    }

    struct FakeClient {
        primary_calls: AtomicUsize,
        fallback_calls: AtomicUsize,
        primary_fails: bool,
        fallback_fails: bool,
        primary_rates: HashMap<String, f64>,
        fallback_rates: HashMap<String, f64>,
    }

    impl FakeClient {
        fn succeeding(rate: f64) -> Self {
            let mut rates = HashMap::new();
            rates.insert("eur".to_string(), rate);
            Self {
                primary_calls: AtomicUsize::new(0),
                fallback_calls: AtomicUsize::new(0),
                primary_fails: false,
                fallback_fails: false,
                primary_rates: rates,
                fallback_rates: HashMap::new(),
            }
        }

        fn primary_down_fallback_up(rate: f64) -> Self {
            let mut rates = HashMap::new();
            rates.insert("eur".to_string(), rate);
            Self {
                primary_calls: AtomicUsize::new(0),
                fallback_calls: AtomicUsize::new(0),
                primary_fails: true,
                fallback_fails: false,
                primary_rates: HashMap::new(),
                fallback_rates: rates,
            }
        }

        fn both_down() -> Self {
            Self {
                primary_calls: AtomicUsize::new(0),
                fallback_calls: AtomicUsize::new(0),
                primary_fails: true,
                fallback_fails: true,
                primary_rates: HashMap::new(),
                fallback_rates: HashMap::new(),
            }
        }
    }

    #[async_trait::async_trait]
    impl ExchangeRateClient for FakeClient {
        async fn fetch_primary(&self, _base: &str) -> Result<FetchedRates, String> {
            self.primary_calls.fetch_add(1, Ordering::SeqCst);
            if self.primary_fails {
                return Err("primary down".to_string());
            }
            Ok(FetchedRates {
                rates: self.primary_rates.clone(),
            })
        }

        async fn fetch_fallback(&self, _base: &str) -> Result<FetchedRates, String> {
            self.fallback_calls.fetch_add(1, Ordering::SeqCst);
            if self.fallback_fails {
                return Err("fallback down".to_string());
            }
            Ok(FetchedRates {
                rates: self.fallback_rates.clone(),
            })
        }
    }

    #[tokio::test]
    async fn cold_cache_fetches_from_primary() {
        let svc = RateCacheService::new(FakeStore::default(), FakeClient::succeeding(0.85), RateCacheConfig::default());
        let result = svc.get_currency_rate("USD", "EUR").await.unwrap();
        assert_eq!(
            result,
            RateResult {
                rate: 0.85,
                used_fallback: false,
                from_cache: false,
                stale: false,
            }
        );
    }

    #[tokio::test]
    async fn concurrent_calls_for_same_pair_dedupe_to_one_fetch() {
        let svc = std::sync::Arc::new(RateCacheService::new(
            FakeStore::default(),
            FakeClient::succeeding(0.9),
            RateCacheConfig::default(),
        ));

        let a = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.get_currency_rate("usd", "eur").await })
        };
        let b = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.get_currency_rate("usd", "eur").await })
        };

        let (ra, rb) = tokio::join!(a, b);
        assert_eq!(ra.unwrap().unwrap(), rb.unwrap().unwrap());
    }

    #[tokio::test]
    async fn falls_back_when_primary_api_fails() {
        let svc = RateCacheService::new(
            FakeStore::default(),
            FakeClient::primary_down_fallback_up(0.9),
            RateCacheConfig::default(),
        );
        let result = svc.get_currency_rate("usd", "eur").await.unwrap();
        assert_eq!(result.rate, 0.9);
        assert!(result.used_fallback);
    }

    #[tokio::test]
    async fn serves_stale_cache_when_both_apis_fail() {
        let store = FakeStore::default();
        let mut rates = HashMap::new();
        rates.insert("eur".to_string(), 0.80);
        let mut all = HashMap::new();
        all.insert(
            "usd".to_string(),
            CurrencyRateCacheEntry {
                rates,
                timestamp: now_millis() - Duration::from_secs(3 * 60 * 60).as_millis() as i64,
                used_fallback: false,
            },
        );
        store.set(CACHE_KEY, serde_json::to_string(&all).unwrap()).await.unwrap();
        store.set(ACTIVITY_KEY, now_millis().to_string()).await.unwrap();

        let svc = RateCacheService::new(store, FakeClient::both_down(), RateCacheConfig::default());
        svc.load_activity().await;
        let result = svc.get_currency_rate("usd", "eur").await.unwrap();
        assert_eq!(
            result,
            RateResult {
                rate: 0.80,
                used_fallback: false,
                from_cache: true,
                stale: true,
            }
        );
    }

    #[tokio::test]
    async fn inactive_user_blocks_prefetch_and_refresh() {
        let client = FakeClient::succeeding(0.85);
        let svc = RateCacheService::new(FakeStore::default(), client, RateCacheConfig::default());
        // last_activity defaults to 0, far outside inactivity_threshold.
        svc.prefetch_if_stale().await;
        svc.refresh_cache_if_needed().await;
        assert_eq!(svc.client.primary_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn clear_cache_removes_entry_but_not_activity() {
        let store = FakeStore::default();
        store.set(ACTIVITY_KEY, "12345".to_string()).await.unwrap();
        let svc = RateCacheService::new(store, FakeClient::succeeding(0.85), RateCacheConfig::default());
        svc.get_currency_rate("usd", "eur").await.unwrap();
        svc.clear_cache().await;
        assert!(svc.load_all().await.is_empty());
        assert_eq!(svc.store.get(ACTIVITY_KEY).await, Some("12345".to_string()));
    }
}
