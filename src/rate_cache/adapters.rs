//! Production collaborators for the rate cache: a redb-backed `KvStore`, a
//! reqwest-backed `ExchangeRateClient`, and a tokio-interval `AlarmScheduler`.
//!
//! Grounded on the currency service's `Database::create`/`begin_read`/
//! `begin_write` transaction pattern and its `reqwest::Client` usage,
//! generalized from a single hard-coded rates table into a generic
//! string key/value table behind the `KvStore` trait.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use directories::ProjectDirs;
use redb::{Database, ReadableTable, TableDefinition};
use reqwest::Client;
use serde::Deserialize;

use super::traits::{AlarmCallback, AlarmScheduler, ExchangeRateClient, FetchedRates, KvStore};

const KV_TABLE: TableDefinition<&str, &str> = TableDefinition::new("rate_cache_kv");

pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens (creating if needed) the database under the platform's standard
    /// data directory, the way the currency service locates `currency_rates.redb`.
    pub async fn open_default() -> Result<Self, String> {
        let proj_dirs = ProjectDirs::from("com", "antigravity", "convert-engine")
            .ok_or_else(|| "unable to determine data directory".to_string())?;
        let dir = proj_dirs.data_dir().to_path_buf();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| e.to_string())?;
        let mut path: PathBuf = dir;
        path.push("rate_cache.redb");
        let db = Database::create(path).map_err(|e| e.to_string())?;
        Ok(Self::new(db))
    }
}

#[async_trait]
impl KvStore for RedbStore {
    async fn get(&self, key: &str) -> Option<String> {
        let txn = self.db.begin_read().ok()?;
        let table = txn.open_table(KV_TABLE).ok()?;
        let value = table.get(key).ok()??;
        Some(value.value().to_string())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), String> {
        let txn = self.db.begin_write().map_err(|e| e.to_string())?;
        {
            let mut table = txn.open_table(KV_TABLE).map_err(|e| e.to_string())?;
            table.insert(key, value.as_str()).map_err(|e| e.to_string())?;
        }
        txn.commit().map_err(|e| e.to_string())
    }

    async fn remove(&self, key: &str) -> Result<(), String> {
        let txn = self.db.begin_write().map_err(|e| e.to_string())?;
        {
            let mut table = txn.open_table(KV_TABLE).map_err(|e| e.to_string())?;
            table.remove(key).map_err(|e| e.to_string())?;
        }
        txn.commit().map_err(|e| e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct PrimaryResponse {
    rates: HashMap<String, f64>,
}

pub struct ReqwestExchangeClient {
    http: Client,
    primary_base_url: String,
    fallback_base_url: String,
}

impl ReqwestExchangeClient {
    pub fn new() -> Result<Self, String> {
        let http = Client::builder()
            .user_agent("convert-engine/rate-cache")
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self {
            http,
            primary_base_url: "https://open.er-api.com/v6/latest".to_string(),
            fallback_base_url: "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest/v1/currencies"
                .to_string(),
        })
    }
}

#[async_trait]
impl ExchangeRateClient for ReqwestExchangeClient {
    async fn fetch_primary(&self, base: &str) -> Result<FetchedRates, String> {
        let url = format!("{}/{}", self.primary_base_url, base.to_uppercase());
        let resp = self.http.get(&url).send().await.map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("primary API returned {}", resp.status()));
        }
        let body: PrimaryResponse = resp.json().await.map_err(|e| e.to_string())?;
        let rates = body.rates.into_iter().map(|(k, v)| (k.to_lowercase(), v)).collect();
        Ok(FetchedRates { rates })
    }

    async fn fetch_fallback(&self, base: &str) -> Result<FetchedRates, String> {
        let lower = base.to_lowercase();
        let url = format!("{}/{}.json", self.fallback_base_url, lower);
        let resp = self.http.get(&url).send().await.map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("fallback API returned {}", resp.status()));
        }
        let mut body: HashMap<String, HashMap<String, f64>> = resp.json().await.map_err(|e| e.to_string())?;
        let rates = body.remove(&lower).ok_or_else(|| format!("fallback response missing base {lower}"))?;
        Ok(FetchedRates { rates })
    }
}

/// Spawns one `tokio::time::interval` loop per alarm. The core never calls
/// `tokio::spawn` itself; only this adapter does.
pub struct TokioIntervalScheduler;

impl AlarmScheduler for TokioIntervalScheduler {
    fn schedule(&self, name: &str, period: Duration, callback: AlarmCallback) {
        let name = name.to_string();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                log::trace!("alarm '{name}' fired");
                (callback)().await;
            }
        });
    }
}
