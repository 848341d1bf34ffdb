//! Remote object storage.
//!
//! The remote store is the owner of truth for every image; the local cache
//! only ever mirrors what [`ObjectStore::get_object`] returns.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, AttributeValue, Attributes, PutOptions, PutPayload};
use std::sync::Arc;
use tracing::debug;

/// An object as returned by the remote store.
#[derive(Clone, Debug)]
pub struct RemoteObject {
    pub data: Bytes,
    /// Content type recorded at upload, when the store reports one.
    pub content_type: Option<String>,
}

/// Abstraction over a bucket in a remote object store.
///
/// The bucket is bound when the store is constructed.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<()>;
    async fn get_object(&self, key: &str) -> Result<RemoteObject>;
    /// Only used for the startup diagnostic log.
    async fn list_buckets(&self) -> Result<Vec<String>>;
}

/// Bucket-bound adapter over an `object_store` backend, normally S3.
#[derive(Debug)]
pub struct S3ObjectStore {
    inner: Arc<dyn object_store::ObjectStore>,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(inner: Arc<dyn object_store::ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            inner,
            bucket: bucket.into(),
        }
    }

    /// Build an S3 client for `bucket`. Credentials and region come from the
    /// standard `AWS_*` environment variables; `endpoint` points at an
    /// S3-compatible service such as MinIO, addressed path-style.
    pub fn from_env(bucket: &str, endpoint: Option<&str>) -> Result<Self> {
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        if let Some(endpoint) = endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        Ok(Self::new(Arc::new(builder.build()?), bucket))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        debug!("PUT object {} ({} bytes)", key, body.len());

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        let opts = PutOptions {
            attributes,
            ..Default::default()
        };

        self.inner
            .put_opts(&ObjectPath::from(key), PutPayload::from(body), opts)
            .await?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<RemoteObject> {
        debug!("GET object {}", key);
        let result = self.inner.get(&ObjectPath::from(key)).await?;
        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.to_string());
        let data = result.bytes().await?;

        Ok(RemoteObject { data, content_type })
    }

    /// `object_store` is scoped to one bucket, so this confirms the bound
    /// bucket is reachable and reports it.
    async fn list_buckets(&self) -> Result<Vec<String>> {
        self.inner.list_with_delimiter(None).await?;
        Ok(vec![self.bucket.clone()])
    }
}
