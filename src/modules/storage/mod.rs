//! Storage module for report artifacts
//!
//! Provides the object-store contract the report pipeline depends on and its
//! MinIO/S3-compatible implementation.

mod minio_client;

use async_trait::async_trait;

use crate::core::error::Result;

pub use minio_client::MinIOClient;

/// Reference to an object persisted in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object key within the bucket
    pub object_name: String,
    /// Retrievable URL, present when requested at upload time
    pub object_url: Option<String>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under a key derived from `filename`.
    ///
    /// When `generate_url` is set the returned reference carries a URL the
    /// object can be fetched from.
    async fn upload(
        &self,
        filename: &str,
        data: Vec<u8>,
        content_type: &str,
        generate_url: bool,
    ) -> Result<StoredObject>;

    /// Resolve an existing object key to a retrievable URL
    async fn resolve_url(&self, object_name: &str) -> Result<String>;
}
