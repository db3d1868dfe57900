use std::collections::HashMap;

use async_trait::async_trait;

/// Key-value store mapping lookup keys to previously resolved titles.
///
/// Implementations must be safe for concurrent use and must never surface
/// backend failures: a failed read is a miss, a failed write is a no-op.
#[async_trait]
pub trait TitleCache: Send + Sync {
    /// Look up a single key.
    async fn get(&self, key: &str) -> Option<String>;

    /// Store the title for a key, replacing any previous value.
    async fn set(&self, key: &str, title: &str);

    /// Look up many keys at once. Missing keys are absent from the map.
    async fn get_multi(&self, keys: &[String]) -> HashMap<String, String>;
}
