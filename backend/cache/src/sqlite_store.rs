//! SQLite-backed durable title cache.
//!
//! Rows are keyed by the SHA-256 of the lookup key so arbitrary URLs map to
//! fixed-size primary keys; the original key is kept alongside for debugging.
//! Every call runs on the blocking pool under a deadline (2s single, 5s batch)
//! and degrades to a miss or no-op when the database is slow or failing.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use linktitle_core::TitleCache;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

const SINGLE_DEADLINE: Duration = Duration::from_secs(2);
const BATCH_DEADLINE: Duration = Duration::from_secs(5);
const BATCH_CHUNK: usize = 500;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS titles (
     key_hash    TEXT PRIMARY KEY,
     title       TEXT NOT NULL,
     original    TEXT NOT NULL,
     updated_at  INTEGER NOT NULL
 );";

/// Hex-encoded SHA-256 of a lookup key.
pub fn hash_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

#[derive(Clone)]
pub struct SqliteTitleCache {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTitleCache {
    /// Create or open a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).context("Failed to open SQLite title cache")?;
        conn.execute_batch(&format!("PRAGMA journal_mode=WAL;\n{SCHEMA}"))
            .context("Failed to initialize titles schema")?;
        info!("SqliteTitleCache opened at {:?}", path.as_ref());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Unix timestamp of the last write for `key`.
    pub async fn updated_at(&self, key: &str) -> Option<i64> {
        let hash = hash_key(key);
        self.run("updated_at", SINGLE_DEADLINE, move |conn| {
            conn.query_row(
                "SELECT updated_at FROM titles WHERE key_hash = ?1",
                params![hash],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .flatten()
    }

    async fn run<T, F>(&self, op: &'static str, deadline: Duration, f: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let task = tokio::task::spawn_blocking(move || -> Result<T> {
            let guard = conn
                .lock()
                .map_err(|_| anyhow!("title cache connection poisoned"))?;
            Ok(f(&*guard)?)
        });

        match tokio::time::timeout(deadline, task).await {
            Ok(Ok(Ok(value))) => Some(value),
            Ok(Ok(Err(e))) => {
                warn!(op, error = %e, "Title cache operation failed");
                None
            }
            Ok(Err(e)) => {
                warn!(op, error = %e, "Title cache task panicked");
                None
            }
            Err(_) => {
                warn!(op, deadline_ms = deadline.as_millis() as u64, "Title cache deadline exceeded");
                None
            }
        }
    }
}

#[async_trait]
impl TitleCache for SqliteTitleCache {
    async fn get(&self, key: &str) -> Option<String> {
        let hash = hash_key(key);
        self.run("get", SINGLE_DEADLINE, move |conn| {
            conn.query_row(
                "SELECT title FROM titles WHERE key_hash = ?1",
                params![hash],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .flatten()
    }

    async fn set(&self, key: &str, title: &str) {
        let hash = hash_key(key);
        let original = key.to_string();
        let title = title.to_string();
        let now = chrono::Utc::now().timestamp();
        let written = self
            .run("set", SINGLE_DEADLINE, move |conn| {
                conn.execute(
                    "INSERT OR REPLACE INTO titles (key_hash, title, original, updated_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![hash, title, original, now],
                )
            })
            .await;
        if written.is_some() {
            debug!(key, "Cached title");
        }
    }

    async fn get_multi(&self, keys: &[String]) -> HashMap<String, String> {
        if keys.is_empty() {
            return HashMap::new();
        }
        let by_hash: HashMap<String, String> =
            keys.iter().map(|k| (hash_key(k), k.clone())).collect();
        let hashes: Vec<String> = by_hash.keys().cloned().collect();

        let rows = self
            .run("get_multi", BATCH_DEADLINE, move |conn| {
                let mut found = Vec::new();
                for chunk in hashes.chunks(BATCH_CHUNK) {
                    let placeholders = vec!["?"; chunk.len()].join(",");
                    let sql = format!(
                        "SELECT key_hash, title FROM titles WHERE key_hash IN ({placeholders})"
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    let mapped = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                    })?;
                    for row in mapped {
                        found.push(row?);
                    }
                }
                Ok(found)
            })
            .await
            .unwrap_or_default();

        rows.into_iter()
            .filter_map(|(hash, title)| by_hash.get(&hash).map(|key| (key.clone(), title)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_hex_sha256() {
        let h = hash_key("https://example.com");
        assert_eq!(h.len(), 64);
        assert_eq!(h, hash_key("https://example.com"));
        assert_ne!(h, hash_key("https://example.com/"));
    }

    #[tokio::test]
    async fn sqlite_cache_roundtrip() {
        let cache = SqliteTitleCache::in_memory().expect("in-memory db");
        assert_eq!(cache.get("https://a.example").await, None);

        cache.set("https://a.example", "Title A").await;
        assert_eq!(cache.get("https://a.example").await.as_deref(), Some("Title A"));
        assert!(cache.updated_at("https://a.example").await.unwrap() > 0);

        cache.set("https://a.example", "Title A (new)").await;
        assert_eq!(
            cache.get("https://a.example").await.as_deref(),
            Some("Title A (new)")
        );
    }

    #[tokio::test]
    async fn get_multi_maps_back_to_original_keys() {
        let cache = SqliteTitleCache::in_memory().unwrap();
        cache.set("https://a.example", "A").await;
        cache.set("https://c.example", "C").await;

        let keys: Vec<String> = ["https://a.example", "https://b.example", "https://c.example"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let found = cache.get_multi(&keys).await;
        assert_eq!(found.len(), 2);
        assert_eq!(found["https://a.example"], "A");
        assert_eq!(found["https://c.example"], "C");
        assert!(cache.get_multi(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn get_multi_handles_more_keys_than_one_chunk() {
        let cache = SqliteTitleCache::in_memory().unwrap();
        let keys: Vec<String> = (0..(BATCH_CHUNK + 20))
            .map(|i| format!("https://example.com/{i}"))
            .collect();
        for key in keys.iter().step_by(7) {
            cache.set(key, "hit").await;
        }
        let found = cache.get_multi(&keys).await;
        assert_eq!(found.len(), keys.iter().step_by(7).count());
    }

    #[tokio::test]
    async fn file_backed_cache_persists_across_reopen() {
        let dir = std::env::temp_dir().join(format!("linktitle-cache-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("titles.db");
        {
            let cache = SqliteTitleCache::open(&path).unwrap();
            cache.set("k", "persisted").await;
        }
        let reopened = SqliteTitleCache::open(&path).unwrap();
        assert_eq!(reopened.get("k").await.as_deref(), Some("persisted"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
