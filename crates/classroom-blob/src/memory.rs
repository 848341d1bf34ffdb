use crate::error::{BlobError, Result};
use crate::remote::{ObjectStore, RemoteObject};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-process object store.
///
/// Used when no remote endpoint is configured, and by tests that need to
/// count remote fetches.
#[derive(Debug)]
pub struct MemoryObjectStore {
    bucket: String,
    objects: RwLock<HashMap<String, (Bytes, String)>>,
    get_calls: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(HashMap::new()),
            get_calls: AtomicUsize::new(0),
        }
    }

    /// Number of `get_object` calls served so far, hits and misses alike.
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.read().get(key).map(|(_, ct)| ct.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        self.objects
            .write()
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<RemoteObject> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.objects
            .read()
            .get(key)
            .map(|(data, content_type)| RemoteObject {
                data: data.clone(),
                content_type: Some(content_type.clone()),
            })
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        Ok(vec![self.bucket.clone()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryObjectStore::new("images");
        store
            .put_object("a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();

        let object = store.get_object("a.png").await.unwrap();
        assert_eq!(object.data, Bytes::from_static(b"png"));
        assert_eq!(object.content_type.as_deref(), Some("image/png"));
        assert_eq!(store.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let store = MemoryObjectStore::new("images");
        let err = store.get_object("nope").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(store.get_calls(), 1);
    }

    #[tokio::test]
    async fn test_list_buckets_reports_own_bucket() {
        let store = MemoryObjectStore::new("images");
        assert_eq!(store.list_buckets().await.unwrap(), vec!["images"]);
    }
}
