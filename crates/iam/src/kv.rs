//! The opaque key-value mapping backing IAM: conditional-create, get,
//! put, delete, and list-keys over named buckets with history.
//!
//! `create` must be atomic and its `key already exists` outcome must be
//! distinguishable from I/O failures; first-start bootstrap and
//! `CreateUser` both depend on that distinction.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use thiserror::Error;
use tokio::sync::RwLock;

/// Depth of per-bucket history kept for audit.
pub const BUCKET_HISTORY: i64 = 5;

/// A key-value failure.
#[derive(Debug, Error)]
pub enum KvError {
    /// Conditional create lost: the key is already present.
    #[error("key already exists")]
    AlreadyExists,
    /// Any other backend failure.
    #[error("kv backend error: {0}")]
    Backend(String),
}

impl KvError {
    /// True for the benign conditional-create outcome.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, KvError::AlreadyExists)
    }
}

/// The opaque mapping. Buckets are created on first use.
#[async_trait]
pub trait KeyValue: Send + Sync {
    /// Atomically creates `key`; fails with [`KvError::AlreadyExists`]
    /// when the key is present.
    async fn create(&self, bucket: &str, key: &str, value: Vec<u8>) -> Result<(), KvError>;

    /// Reads a key.
    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, KvError>;

    /// Writes a key unconditionally.
    async fn put(&self, bucket: &str, key: &str, value: Vec<u8>) -> Result<(), KvError>;

    /// Removes a key. Removing an absent key is not an error.
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), KvError>;

    /// Lists the live keys of a bucket.
    async fn keys(&self, bucket: &str) -> Result<Vec<String>, KvError>;
}

/// JetStream KV, riding the control-bus connection. Bucket handles are
/// opened lazily and cached.
pub struct JetStreamKv {
    context: async_nats::jetstream::Context,
    stores: RwLock<HashMap<String, async_nats::jetstream::kv::Store>>,
}

impl JetStreamKv {
    /// Wraps an established NATS client.
    pub fn new(client: async_nats::Client) -> JetStreamKv {
        JetStreamKv {
            context: async_nats::jetstream::new(client),
            stores: RwLock::new(HashMap::new()),
        }
    }

    async fn store(
        &self,
        bucket: &str,
    ) -> Result<async_nats::jetstream::kv::Store, KvError> {
        if let Some(store) = self.stores.read().await.get(bucket) {
            return Ok(store.clone());
        }
        let store = match self.context.get_key_value(bucket).await {
            Ok(store) => store,
            Err(_) => self
                .context
                .create_key_value(async_nats::jetstream::kv::Config {
                    bucket: bucket.to_string(),
                    history: BUCKET_HISTORY,
                    ..Default::default()
                })
                .await
                .map_err(|e| KvError::Backend(e.to_string()))?,
        };
        self.stores
            .write()
            .await
            .insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

#[async_trait]
impl KeyValue for JetStreamKv {
    async fn create(&self, bucket: &str, key: &str, value: Vec<u8>) -> Result<(), KvError> {
        let store = self.store(bucket).await?;
        match store.create(key, Bytes::from(value)).await {
            Ok(_) => Ok(()),
            Err(e)
                if e.kind()
                    == async_nats::jetstream::kv::CreateErrorKind::AlreadyExists =>
            {
                Err(KvError::AlreadyExists)
            }
            Err(e) => Err(KvError::Backend(e.to_string())),
        }
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        let store = self.store(bucket).await?;
        store
            .get(key)
            .await
            .map(|entry| entry.map(|bytes| bytes.to_vec()))
            .map_err(|e| KvError::Backend(e.to_string()))
    }

    async fn put(&self, bucket: &str, key: &str, value: Vec<u8>) -> Result<(), KvError> {
        let store = self.store(bucket).await?;
        store
            .put(key, Bytes::from(value))
            .await
            .map(|_| ())
            .map_err(|e| KvError::Backend(e.to_string()))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), KvError> {
        let store = self.store(bucket).await?;
        store
            .delete(key)
            .await
            .map_err(|e| KvError::Backend(e.to_string()))
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<String>, KvError> {
        let store = self.store(bucket).await?;
        let keys = store
            .keys()
            .await
            .map_err(|e| KvError::Backend(e.to_string()))?;
        keys.try_collect()
            .await
            .map_err(|e| KvError::Backend(e.to_string()))
    }
}

/// In-memory mapping for tests and single-process development.
#[derive(Default)]
pub struct MemoryKv {
    buckets: RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>,
}

impl MemoryKv {
    /// An empty mapping.
    pub fn new() -> MemoryKv {
        MemoryKv::default()
    }
}

#[async_trait]
impl KeyValue for MemoryKv {
    async fn create(&self, bucket: &str, key: &str, value: Vec<u8>) -> Result<(), KvError> {
        let mut buckets = self.buckets.write().await;
        let bucket = buckets.entry(bucket.to_string()).or_default();
        if bucket.contains_key(key) {
            return Err(KvError::AlreadyExists);
        }
        bucket.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        Ok(self
            .buckets
            .read()
            .await
            .get(bucket)
            .and_then(|b| b.get(key).cloned()))
    }

    async fn put(&self, bucket: &str, key: &str, value: Vec<u8>) -> Result<(), KvError> {
        self.buckets
            .write()
            .await
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), KvError> {
        if let Some(bucket) = self.buckets.write().await.get_mut(bucket) {
            bucket.remove(key);
        }
        Ok(())
    }

    async fn keys(&self, bucket: &str) -> Result<Vec<String>, KvError> {
        Ok(self
            .buckets
            .read()
            .await
            .get(bucket)
            .map(|b| b.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_is_conditional() {
        let kv = MemoryKv::new();
        kv.create("users", "a", b"1".to_vec()).await.unwrap();
        let err = kv.create("users", "a", b"2".to_vec()).await.unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(kv.get("users", "a").await.unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn delete_of_absent_key_is_quiet() {
        let kv = MemoryKv::new();
        kv.delete("users", "ghost").await.unwrap();
        assert!(kv.keys("users").await.unwrap().is_empty());
    }
}
