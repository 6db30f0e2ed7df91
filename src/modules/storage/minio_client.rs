//! MinIO/S3-compatible storage client
//!
//! Uploads rendered report artifacts and turns object keys (both our own
//! artifacts and files referenced by activity fields) into retrievable URLs.
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ObjectStore, StoredObject};
use crate::core::config::MinIOConfig;
use crate::core::error::{AppError, Result};

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    public_endpoint: String,
    report_prefix: String,
    public_links: bool,
    presigned_url_expiry_secs: u32,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration
    pub fn new(config: MinIOConfig) -> Result<Self> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Storage(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Storage(format!("Failed to create MinIO bucket: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}, report_prefix: {}, public_links: {}",
            config.endpoint,
            bucket.name(),
            config.report_prefix,
            config.public_links
        );

        Ok(Self {
            bucket,
            region,
            credentials,
            public_endpoint: config.public_endpoint,
            report_prefix: config.report_prefix,
            public_links: config.public_links,
            presigned_url_expiry_secs: config.presigned_url_expiry_secs,
        })
    }

    /// Ensure the bucket exists, create if not
    pub async fn ensure_bucket_exists(&self) -> Result<()> {
        let response = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match response {
            Ok(created) if created.success() => {
                info!("Bucket '{}' created successfully", self.bucket.name());
            }
            Ok(created) => {
                if is_already_exists(&created.response_text) {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}' (HTTP {}). Assuming it exists.",
                        self.bucket.name(),
                        created.response_code
                    );
                }
            }
            Err(e) if is_already_exists(&e.to_string()) => {
                debug!("Bucket '{}' already exists", self.bucket.name());
            }
            Err(e) => {
                // Bucket may exist but be owned by a policy we cannot inspect
                warn!(
                    "Could not create bucket '{}': {}. Assuming it exists.",
                    self.bucket.name(),
                    e
                );
            }
        }

        Ok(())
    }

    /// Get the bucket name
    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }

    /// Object key for a new report artifact: `{prefix}/{uuid}-{filename}`
    fn generate_key(&self, filename: &str) -> String {
        build_key(&self.report_prefix, &Uuid::now_v7().to_string(), filename)
    }

    /// Unsigned URL through the public endpoint
    fn public_url(&self, key: &str) -> String {
        public_url(&self.public_endpoint, &self.bucket.name(), key)
    }

    async fn presigned_url(&self, key: &str) -> Result<String> {
        self.bucket
            .presign_get(key, self.presigned_url_expiry_secs, None)
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to generate presigned URL for '{}': {}",
                    key, e
                ))
            })
    }
}

#[async_trait]
impl ObjectStore for MinIOClient {
    async fn upload(
        &self,
        filename: &str,
        data: Vec<u8>,
        content_type: &str,
        generate_url: bool,
    ) -> Result<StoredObject> {
        let key = self.generate_key(filename);
        let content_length = data.len();

        let response = self
            .bucket
            .put_object_with_content_type(&key, &data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload file '{}': {}", key, e)))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(AppError::Storage(format!(
                "Failed to upload file '{}': HTTP {}",
                key, status
            )));
        }

        debug!(
            "Uploaded file '{}' ({} bytes) to bucket '{}'",
            key,
            content_length,
            self.bucket.name()
        );

        let object_url = if generate_url {
            Some(self.resolve_url(&key).await?)
        } else {
            None
        };

        Ok(StoredObject {
            object_name: key,
            object_url,
        })
    }

    async fn resolve_url(&self, object_name: &str) -> Result<String> {
        let key = object_name.trim().trim_start_matches('/');
        if key.is_empty() {
            return Err(AppError::Storage("Empty object key".to_string()));
        }

        if self.public_links {
            Ok(self.public_url(key))
        } else {
            self.presigned_url(key).await
        }
    }
}

fn is_already_exists(message: &str) -> bool {
    message.contains("BucketAlreadyOwnedByYou")
        || message.contains("BucketAlreadyExists")
        || message.contains("already own it")
}

fn build_key(prefix: &str, unique: &str, filename: &str) -> String {
    if prefix.is_empty() {
        format!("{}-{}", unique, filename)
    } else {
        format!("{}/{}-{}", prefix, unique, filename)
    }
}

fn public_url(endpoint: &str, bucket: &str, key: &str) -> String {
    let encoded = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{}/{}", endpoint, bucket, encoded)
}
