use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::{Protocol, ResourceType, SchemaProvider};

/// Keeps fetched schema documents per (protocol, type); failures are not cached
#[derive(Clone)]
pub struct CachedSchemaProvider {
    inner: Arc<dyn SchemaProvider>,
    cache: Arc<RwLock<HashMap<(Protocol, ResourceType), Value>>>,
}

impl CachedSchemaProvider {
    pub fn new(inner: Arc<dyn SchemaProvider>) -> Self {
        Self {
            inner,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn invalidate(&self, protocol: Protocol, resource_type: ResourceType) {
        let mut cache = self.cache.write().await;
        cache.remove(&(protocol, resource_type));
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.clear();
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[async_trait]
impl SchemaProvider for CachedSchemaProvider {
    async fn fetch_schema(&self, protocol: Protocol, resource_type: ResourceType) -> anyhow::Result<Value> {
        let key = (protocol, resource_type);
        {
            let cache = self.cache.read().await;
            if let Some(schema) = cache.get(&key) {
                debug!("Schema cache hit for {} {}", protocol, resource_type);
                return Ok(schema.clone());
            }
        }

        let schema = self.inner.fetch_schema(protocol, resource_type).await?;
        let mut cache = self.cache.write().await;
        cache.insert(key, schema.clone());
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SchemaProvider for CountingProvider {
        async fn fetch_schema(&self, protocol: Protocol, _resource_type: ResourceType) -> anyhow::Result<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("unavailable");
            }
            Ok(json!({ "title": protocol.as_str() }))
        }
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let inner = Arc::new(CountingProvider::default());
        let cached = CachedSchemaProvider::new(inner.clone());

        cached.fetch_schema(Protocol::Http, ResourceType::Routers).await.unwrap();
        let again = cached.fetch_schema(Protocol::Http, ResourceType::Routers).await.unwrap();
        assert_eq!(again["title"], "http");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        cached.fetch_schema(Protocol::Tcp, ResourceType::Routers).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.len().await, 2);
    }

    #[tokio::test]
    async fn test_invalidate_refetches() {
        let inner = Arc::new(CountingProvider::default());
        let cached = CachedSchemaProvider::new(inner.clone());

        cached.fetch_schema(Protocol::Http, ResourceType::Services).await.unwrap();
        cached.invalidate(Protocol::Http, ResourceType::Services).await;
        cached.fetch_schema(Protocol::Http, ResourceType::Services).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let inner = Arc::new(CountingProvider { calls: AtomicUsize::new(0), fail: true });
        let cached = CachedSchemaProvider::new(inner.clone());

        assert!(cached.fetch_schema(Protocol::Http, ResourceType::Tls).await.is_err());
        assert!(cached.fetch_schema(Protocol::Http, ResourceType::Tls).await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.len().await, 0);
    }
}
