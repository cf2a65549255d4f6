pub mod adapters;
pub mod service;
pub mod traits;

pub use adapters::{RedbStore, ReqwestExchangeClient, TokioIntervalScheduler};
pub use service::{CurrencyRateCacheEntry, RateCacheConfig, RateCacheError, RateCacheService, RateResult};
pub use traits::{AlarmCallback, AlarmScheduler, BoxFuture, ExchangeRateClient, FetchedRates, KvStore};
