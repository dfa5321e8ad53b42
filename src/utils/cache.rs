use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// 缓存项
#[derive(Debug, Clone)]
struct CacheItem<T> {
    value: T,
    expires_at: Instant,
}

/// 简单的内存TTL缓存
/// 读写不返回错误：锁中毒一律按未命中处理
#[derive(Debug, Clone)]
pub struct Cache<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<String, CacheItem<T>>>>,
    ttl: Duration,
}

impl<T: Clone + Send + Sync + 'static> Cache<T> {
    /// 创建新的缓存实例并启动后台清理任务
    pub fn new(ttl: Duration) -> Self {
        let cache = Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        };

        // 每5分钟清理一次过期项
        let data = cache.data.clone();
        tokio::spawn(async move {
            loop {
                sleep(Duration::from_secs(300)).await;
                Self::cleanup_expired(&data);
            }
        });

        cache
    }

    /// 获取缓存项；过期视同不存在
    pub fn get(&self, key: &str) -> Option<T> {
        let data = self.data.read().ok()?;
        data.get(key)
            .filter(|item| item.expires_at > Instant::now())
            .map(|item| item.value.clone())
    }

    /// 写入缓存项，使用默认TTL
    pub fn set(&self, key: &str, value: T) {
        self.set_with_ttl(key, value, self.ttl)
    }

    /// 写入带有自定义TTL的缓存项
    pub fn set_with_ttl(&self, key: &str, value: T, ttl: Duration) {
        if let Ok(mut data) = self.data.write() {
            data.insert(
                key.to_string(),
                CacheItem {
                    value,
                    expires_at: Instant::now() + ttl,
                },
            );
        }
    }

    /// 删除缓存项；返回键是否存在
    pub fn delete(&self, key: &str) -> bool {
        match self.data.write() {
            Ok(mut data) => data.remove(key).is_some(),
            Err(_) => false,
        }
    }

    /// 当前缓存条目数（含尚未清理的过期项）
    pub fn size(&self) -> usize {
        self.data.read().map(|data| data.len()).unwrap_or(0)
    }

    /// 清理过期项
    fn cleanup_expired(data: &Arc<RwLock<HashMap<String, CacheItem<T>>>>) {
        if let Ok(mut data) = data.write() {
            let now = Instant::now();
            data.retain(|_, item| item.expires_at > now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_basic_operations() {
        let cache = Cache::new(Duration::from_secs(1));

        cache.set("key1", "value1".to_string());
        assert_eq!(cache.get("key1"), Some("value1".to_string()));

        assert_eq!(cache.get("nonexistent"), None);

        assert!(cache.delete("key1"));
        assert!(!cache.delete("key1"));
        assert_eq!(cache.get("key1"), None);
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let cache = Cache::new(Duration::from_millis(50));

        cache.set("temp", "value".to_string());
        assert_eq!(cache.get("temp"), Some("value".to_string()));

        sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get("temp"), None);
    }

    #[test]
    fn test_cache_size_counts_entries() {
        tokio_test::block_on(async {
            let cache = Cache::new(Duration::from_secs(1));
            cache.set("a", 1);
            cache.set("b", 2);
            assert_eq!(cache.size(), 2);
        });
    }

    #[tokio::test]
    async fn test_cache_custom_ttl_overrides_default() {
        let cache = Cache::new(Duration::from_millis(50));

        cache.set_with_ttl("long", "value".to_string(), Duration::from_secs(60));
        sleep(Duration::from_millis(80)).await;
        assert_eq!(cache.get("long"), Some("value".to_string()));
    }
}
