//! Contract address → USD price, kept in memory and snapshotted to a JSON file.
//!
//! The file is read once at startup and rewritten wholesale after every bulk
//! refresh. Entries older than [`PRICE_TTL`] are never served.

use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::disk_storage::DiskStorageInterface;

pub const PRICE_TTL: Duration = Duration::from_secs(3600);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CachedPrice {
    pub price: f64,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl CachedPrice {
    fn is_usable(&self, now: i64, ttl: Duration) -> bool {
        self.price.is_finite()
            && self.price >= 0.0
            && now.saturating_sub(self.timestamp) <= ttl.as_millis() as i64
    }
}

/// On-disk shape: `{"0x…": {"price": 2.5, "timestamp": 1700000000000}}`.
///
/// Values stay untyped so one bad entry does not discard the whole file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceSnapshot(BTreeMap<String, Value>);

impl DiskStorageInterface for PriceSnapshot {}

#[derive(Deserialize)]
struct StoredPrice {
    price: f64,
    timestamp: f64,
}

impl PriceSnapshot {
    fn into_entries(self) -> HashMap<String, CachedPrice> {
        self.0
            .into_iter()
            .filter_map(|(contract, value)| {
                let stored = serde_json::from_value::<StoredPrice>(value).ok()?;
                Some((
                    contract.to_lowercase(),
                    CachedPrice {
                        price: stored.price,
                        timestamp: stored.timestamp as i64,
                    },
                ))
            })
            .collect()
    }

    fn from_entries(entries: &HashMap<String, CachedPrice>) -> Self {
        Self(
            entries
                .iter()
                .map(|(contract, entry)| {
                    (
                        contract.clone(),
                        serde_json::json!({ "price": entry.price, "timestamp": entry.timestamp }),
                    )
                })
                .collect(),
        )
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Process-wide price store. Readers never block; each write installs a new map.
#[derive(Debug)]
pub struct PriceCache {
    path: PathBuf,
    ttl: Duration,
    entries: ArcSwap<HashMap<String, CachedPrice>>,
}

impl PriceCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ttl: PRICE_TTL,
            entries: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Loads the snapshot at `path` and prunes it. A missing or corrupt file
    /// gives an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let cache = Self::new(path);

        match PriceSnapshot::load(&cache.path) {
            Ok(snapshot) => {
                let entries = snapshot.into_entries();
                let loaded = entries.len();
                cache.entries.store(Arc::new(entries));
                let pruned = cache.prune_expired();
                tracing::info!(
                    path = %cache.path.display(),
                    loaded,
                    pruned,
                    "price cache loaded"
                );
            }
            Err(err) => {
                let err = crate::Error::CacheLoad(cache.path.clone(), Box::new(err));
                tracing::error!(%err, "starting with an empty price cache");
            }
        }

        cache
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, contract_address: &str) -> Option<f64> {
        self.get_at(contract_address, now_millis())
    }

    pub fn get_at(&self, contract_address: &str, now: i64) -> Option<f64> {
        self.entries
            .load()
            .get(&contract_address.to_lowercase())
            .filter(|entry| entry.is_usable(now, self.ttl))
            .map(|entry| entry.price)
    }

    pub fn put(&self, contract_address: &str, price: f64) {
        self.put_many([(contract_address.to_string(), price)]);
    }

    /// Inserts or overwrites every entry, stamped with the current time, in a
    /// single swap.
    pub fn put_many<I>(&self, prices: I)
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let timestamp = now_millis();
        let updates: Vec<(String, CachedPrice)> = prices
            .into_iter()
            .map(|(contract, price)| (contract.to_lowercase(), CachedPrice { price, timestamp }))
            .collect();

        self.entries.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.extend(updates.iter().cloned());
            next
        });
    }

    /// Drops expired and invalid entries, returning how many were removed.
    pub fn prune_expired(&self) -> usize {
        self.prune_expired_at(now_millis())
    }

    pub fn prune_expired_at(&self, now: i64) -> usize {
        let mut removed = 0;
        self.entries.rcu(|current| {
            let next: HashMap<_, _> = current
                .iter()
                .filter(|(_, entry)| entry.is_usable(now, self.ttl))
                .map(|(contract, entry)| (contract.clone(), *entry))
                .collect();
            removed = current.len() - next.len();
            next
        });
        removed
    }

    /// Overwrites the file with the current in-memory entries.
    pub fn persist(&self) -> crate::Result<()> {
        PriceSnapshot::from_entries(&self.entries.load()).save(&self.path)
    }

    #[cfg(any(test, feature = "test-util"))]
    pub fn insert_raw(&self, contract_address: &str, entry: CachedPrice) {
        self.entries.rcu(|current| {
            let mut next = HashMap::clone(current);
            next.insert(contract_address.to_lowercase(), entry);
            next
        });
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const ABC: &str = "0xabc";

    fn cache_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("prices.json")
    }

    #[test]
    fn test_put_then_get() {
        let cache = PriceCache::new("unused.json");
        assert_eq!(cache.get(ABC), None);

        cache.put("0xABC", 2.5);
        assert_eq!(cache.get(ABC), Some(2.5));

        cache.put(ABC, 3.0);
        assert_eq!(cache.get(ABC), Some(3.0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_ignores_expired_entries() {
        let cache = PriceCache::new("unused.json");
        let now = now_millis();
        cache.insert_raw(ABC, CachedPrice { price: 2.5, timestamp: now - 4_000_000 });
        assert_eq!(cache.get_at(ABC, now), None);

        cache.insert_raw(ABC, CachedPrice { price: 2.5, timestamp: now - 3_600_000 });
        assert_eq!(cache.get_at(ABC, now), Some(2.5));
    }

    #[test]
    fn test_prune_removes_invalid_prices_regardless_of_age() {
        let cache = PriceCache::new("unused.json");
        let now = now_millis();
        cache.insert_raw("0x1", CachedPrice { price: f64::NAN, timestamp: now });
        cache.insert_raw("0x2", CachedPrice { price: -1.0, timestamp: now });
        cache.insert_raw("0x3", CachedPrice { price: f64::INFINITY, timestamp: now });
        cache.insert_raw("0x4", CachedPrice { price: 0.0, timestamp: now });
        cache.insert_raw("0x5", CachedPrice { price: 1.0, timestamp: now - 3_600_001 });

        assert_eq!(cache.prune_expired_at(now), 4);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at("0x1", now), None);
        assert_eq!(cache.get_at("0x4", now), Some(0.0));
    }

    #[test]
    fn test_persist_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(&dir);

        let cache = PriceCache::new(&path);
        for i in 0..5 {
            cache.put(&format!("0x{i}"), i as f64);
        }
        cache.persist().unwrap();

        let reloaded = PriceCache::load(&path);
        assert_eq!(reloaded.len(), 5);
        for i in 0..5 {
            assert_eq!(reloaded.get(&format!("0x{i}")), Some(i as f64));
        }
    }

    #[test]
    fn test_load_drops_entries_past_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(&dir);
        let now = now_millis();
        fs::write(
            &path,
            serde_json::json!({
                "0xabc": { "price": 2.5, "timestamp": now - 4_000_000 },
                "0xdef": { "price": 1.5, "timestamp": now - 1_000 },
            })
            .to_string(),
        )
        .unwrap();

        let cache = PriceCache::load(&path);
        assert_eq!(cache.get(ABC), None);
        assert_eq!(cache.get("0xdef"), Some(1.5));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_load_drops_malformed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(&dir);
        let now = now_millis();
        fs::write(
            &path,
            serde_json::json!({
                "0x1": { "price": "abc", "timestamp": now },
                "0x2": { "timestamp": now },
                "0x3": { "price": null, "timestamp": now },
                "0x4": 7,
                "0x5": { "price": 4.0, "timestamp": now },
            })
            .to_string(),
        )
        .unwrap();

        let cache = PriceCache::load(&path);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("0x5"), Some(4.0));
    }

    #[test]
    fn test_corrupt_or_missing_file_gives_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(&dir);

        assert!(PriceCache::load(&path).is_empty());

        fs::write(&path, "{ not json").unwrap();
        assert!(PriceCache::load(&path).is_empty());

        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(PriceCache::load(&path).is_empty());
    }

    #[test]
    fn test_persist_overwrites_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(&dir);

        let first = PriceCache::new(&path);
        first.put("0x1", 1.0);
        first.persist().unwrap();

        let second = PriceCache::new(&path);
        second.put("0x2", 2.0);
        second.persist().unwrap();

        let reloaded = PriceCache::load(&path);
        assert_eq!(reloaded.get("0x1"), None);
        assert_eq!(reloaded.get("0x2"), Some(2.0));
    }
}
