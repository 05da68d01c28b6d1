use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::byte_reader::ByteReader;
use super::local_store::LocalStore;
use super::s3_store::S3Store;
use super::uri::DatasetUri;

/// An object found below the dataset root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Key relative to the dataset root, '/'-separated
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Listing and reading access to the objects of one dataset
///
/// All prefixes and keys are relative to the dataset root. An empty prefix
/// addresses the root itself.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Names of the immediate child directories of `prefix`
    async fn list_directories(&self, prefix: &str) -> Result<Vec<String>>;

    /// Every object below `prefix`, recursively
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectInfo>>;

    /// Open a ranged reader on a listed object
    fn open(&self, object: &ObjectInfo) -> Arc<dyn ByteReader>;
}

/// Join a relative prefix onto a root, yielding a directory-style prefix with
/// a trailing '/' (or an empty string when both are empty)
pub(crate) fn directory_prefix(root: &str, prefix: &str) -> String {
    let joined = [root.trim_matches('/'), prefix.trim_matches('/')]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");

    if joined.is_empty() {
        joined
    } else {
        format!("{}/", joined)
    }
}

/// Factory for creating DatasetStore instances based on the dataset URI
///
/// The S3 client only exists when an AWS configuration was loaded; local
/// datasets never need one.
pub struct StoreFactory {
    s3_client: Option<Arc<S3Client>>,
}

impl StoreFactory {
    /// Create a new StoreFactory
    ///
    /// Path-style addressing is forced when an endpoint override is configured,
    /// which is what S3-compatible stores expect.
    pub fn new(aws_config: Option<&SdkConfig>) -> Self {
        let s3_client = aws_config.map(|aws_config| {
            let mut builder = aws_sdk_s3::config::Builder::from(aws_config);
            if aws_config.endpoint_url().is_some() {
                builder = builder.force_path_style(true);
            }
            Arc::new(S3Client::from_conf(builder.build()))
        });
        Self { s3_client }
    }

    /// Create a DatasetStore rooted at the given URI
    pub fn create_store(&self, uri: &DatasetUri) -> Result<Arc<dyn DatasetStore>> {
        match uri {
            DatasetUri::Local(path) => Ok(Arc::new(LocalStore::new(path))),
            DatasetUri::S3 { bucket, prefix } => {
                let s3_client = self
                    .s3_client
                    .as_ref()
                    .ok_or_else(|| anyhow!("No AWS configuration loaded for {}", uri))?;
                Ok(Arc::new(S3Store::new(
                    Arc::clone(s3_client),
                    bucket.clone(),
                    prefix.clone(),
                )))
            }
        }
    }
}
