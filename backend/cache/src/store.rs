use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use linktitle_core::TitleCache;
use tokio::sync::RwLock;

/// Non-persistent cache used when no database path is configured, and in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTitleCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryTitleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl TitleCache for InMemoryTitleCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, title: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), title.to_string());
    }

    async fn get_multi(&self, keys: &[String]) -> HashMap<String, String> {
        let entries = self.entries.read().await;
        keys.iter()
            .filter_map(|k| entries.get(k).map(|v| (k.clone(), v.clone())))
            .collect()
    }
}
