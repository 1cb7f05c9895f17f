//! Object-storage upload of finished parquet files.

use std::path::Path;

use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use rankimport_core::StorageConfig;
use tracing::info;

use crate::error::CliError;

/// S3-compatible client for the configured bucket.
pub fn s3_store(config: &StorageConfig) -> Result<AmazonS3, CliError> {
    let mut builder = AmazonS3Builder::new()
        .with_bucket_name(&config.bucket)
        .with_region(&config.region)
        .with_access_key_id(&config.access_key_id)
        .with_secret_access_key(&config.secret_access_key);
    if !config.endpoint.is_empty() {
        builder = builder.with_endpoint(&config.endpoint);
    }
    Ok(builder.build()?)
}

/// `{year}/{file_name}`.
pub fn object_key(year: i32, file_name: &str) -> ObjectPath {
    ObjectPath::from(format!("{year}/{file_name}"))
}

/// Put the local file at `key`; returns the uploaded size in bytes.
pub async fn upload(
    store: &dyn ObjectStore,
    local: &Path,
    key: &ObjectPath,
) -> Result<usize, CliError> {
    let bytes = tokio::fs::read(local).await?;
    let size = bytes.len();
    store.put(key, PutPayload::from(bytes)).await?;
    info!(key = %key, size, "uploaded file");
    Ok(size)
}
