//! Exchange-rate client with a time-to-live cache.
//!
//! An external collaborator: the sweep and synchronizer are currency
//! agnostic and never call this. Rate tables are fetched over HTTPS and
//! reused for one hour by default so display-layer conversions never block
//! the scheduling core.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::error::Result;
use crate::storage::RatesConfig;

/// Default cache lifetime for a fetched rate table.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// A base currency and its conversion rates.
#[derive(Debug, Clone, Deserialize)]
pub struct RateTable {
    #[serde(alias = "base_code")]
    pub base: String,
    pub rates: HashMap<String, f64>,
}

/// HTTP client for exchange-rate tables.
pub struct RateClient {
    endpoint: String,
    ttl: Duration,
    http: reqwest::Client,
    cached: Mutex<Option<(Instant, RateTable)>>,
}

impl RateClient {
    pub fn new(endpoint: impl Into<String>, ttl: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            ttl,
            http: reqwest::Client::new(),
            cached: Mutex::new(None),
        }
    }

    pub fn from_config(config: &RatesConfig) -> Self {
        Self::new(
            config.endpoint.clone(),
            Duration::from_secs(config.cache_ttl_secs),
        )
    }

    /// Fetch the rate table for `base`, serving from cache while it is fresh.
    pub async fn rates(&self, base: &str) -> Result<RateTable> {
        if let Some(table) = self.cached_table(base) {
            return Ok(table);
        }

        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), base);
        let table: RateTable = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Ok(mut guard) = self.cached.lock() {
            *guard = Some((Instant::now(), table.clone()));
        }
        Ok(table)
    }

    fn cached_table(&self, base: &str) -> Option<RateTable> {
        let guard = self.cached.lock().ok()?;
        let (fetched_at, table) = guard.as_ref()?;
        if fetched_at.elapsed() < self.ttl && table.base == base {
            Some(table.clone())
        } else {
            None
        }
    }

    #[cfg(test)]
    fn prime(&self, fetched_at: Instant, table: RateTable) {
        *self.cached.lock().unwrap() = Some((fetched_at, table));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(base: &str) -> RateTable {
        RateTable {
            base: base.to_string(),
            rates: HashMap::from([("EUR".to_string(), 0.9), ("JPY".to_string(), 150.0)]),
        }
    }

    // The endpoint is unreachable, so any hit below proves the cache served it.
    fn client(ttl: Duration) -> RateClient {
        RateClient::new("http://127.0.0.1:1/latest", ttl)
    }

    #[tokio::test]
    async fn fresh_cache_served_without_network() {
        let client = client(Duration::from_secs(3600));
        client.prime(Instant::now(), table("USD"));

        let got = client.rates("USD").await.unwrap();
        assert_eq!(got.base, "USD");
        assert_eq!(got.rates["JPY"], 150.0);
    }

    #[tokio::test]
    async fn expired_cache_refetches() {
        let client = client(Duration::from_secs(0));
        client.prime(Instant::now(), table("USD"));

        assert!(client.rates("USD").await.is_err());
    }

    #[tokio::test]
    async fn base_mismatch_bypasses_cache() {
        let client = client(Duration::from_secs(3600));
        client.prime(Instant::now(), table("USD"));

        assert!(client.rates("EUR").await.is_err());
    }
}
