use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: DateTime<Utc>,
}

/// Sailthru 課程內容查詢的行程內 TTL 快取
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Utc::now() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    /// 存入 `value` 並保留 `ttl`，同時清除已過期的項目
    /// 超出可表示範圍的 TTL 視為永不過期
    pub async fn set(&self, key: &str, value: Value, ttl: Duration) {
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(key.to_string(), CacheEntry { value, expires_at });
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = ContentCache::new();
        cache
            .set("edX/toy/2012_Fall:url", json!({"title": "Toy"}), Duration::from_secs(60))
            .await;

        assert_eq!(
            cache.get("edX/toy/2012_Fall:url").await,
            Some(json!({"title": "Toy"}))
        );
        assert_eq!(cache.get("other").await, None);
    }

    #[tokio::test]
    async fn test_expired_entries_are_evicted() {
        let cache = ContentCache::new();
        cache.set("key", json!({"title": "Toy"}), Duration::ZERO).await;

        assert_eq!(cache.get("key").await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_huge_ttl_never_expires() {
        let cache = ContentCache::new();
        cache
            .set("key", json!({"title": "x"}), Duration::from_secs(9_000_000_000_000))
            .await;
        cache.set("forever", json!({"title": "y"}), Duration::MAX).await;

        assert_eq!(cache.get("key").await, Some(json!({"title": "x"})));
        assert_eq!(cache.get("forever").await, Some(json!({"title": "y"})));
    }

    #[tokio::test]
    async fn test_set_prunes_expired_entries() {
        let cache = ContentCache::new();
        cache.set("course-a", json!({"title": "A"}), Duration::ZERO).await;
        cache.set("course-b", json!({"title": "B"}), Duration::ZERO).await;
        cache.set("course-c", json!({"title": "C"}), Duration::from_secs(60)).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("course-c").await, Some(json!({"title": "C"})));
    }
}
