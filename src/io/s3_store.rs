use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::DateTime as S3DateTime;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use super::byte_reader::ByteReader;
use super::s3_reader::S3ByteReader;
use super::store::{DatasetStore, ObjectInfo, directory_prefix};
use crate::config::LIST_PAGE_SIZE;

/// DatasetStore backed by an S3 bucket prefix
pub struct S3Store {
    s3_client: Arc<S3Client>,
    bucket: String,
    root: String,
}

impl S3Store {
    pub fn new(s3_client: Arc<S3Client>, bucket: String, root: String) -> Self {
        Self {
            s3_client,
            bucket,
            root: root.trim_matches('/').to_string(),
        }
    }

    fn full_key(&self, key: &str) -> String {
        if self.root.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.root, key)
        }
    }
}

/// Strip the listing root from a full S3 key
fn relative_key<'a>(root_prefix: &str, key: &'a str) -> Option<&'a str> {
    key.strip_prefix(root_prefix).filter(|rest| !rest.is_empty())
}

fn to_chrono(timestamp: &S3DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

#[async_trait]
impl DatasetStore for S3Store {
    async fn list_directories(&self, prefix: &str) -> Result<Vec<String>> {
        let list_prefix = directory_prefix(&self.root, prefix);
        let mut directories = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .s3_client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&list_prefix)
                .delimiter("/")
                .max_keys(LIST_PAGE_SIZE);

            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request.send().await.with_context(|| {
                format!(
                    "Failed to list directories under s3://{}/{}",
                    self.bucket, list_prefix
                )
            })?;

            for common_prefix in response.common_prefixes() {
                if let Some(name) = common_prefix
                    .prefix()
                    .and_then(|p| relative_key(&list_prefix, p))
                {
                    directories.push(name.trim_end_matches('/').to_string());
                }
            }

            match response.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(
            bucket = %self.bucket,
            prefix = %list_prefix,
            count = directories.len(),
            "Listed S3 directories"
        );
        Ok(directories)
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let list_prefix = directory_prefix(&self.root, prefix);
        let root_prefix = directory_prefix(&self.root, "");
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .s3_client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(&list_prefix)
                .max_keys(LIST_PAGE_SIZE);

            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request.send().await.with_context(|| {
                format!(
                    "Failed to list objects under s3://{}/{}",
                    self.bucket, list_prefix
                )
            })?;

            for object in response.contents() {
                let Some(key) = object.key().and_then(|k| relative_key(&root_prefix, k)) else {
                    continue;
                };

                objects.push(ObjectInfo {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0).max(0) as u64,
                    last_modified: object.last_modified().and_then(to_chrono),
                });
            }

            match response.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(
            bucket = %self.bucket,
            prefix = %list_prefix,
            count = objects.len(),
            "Listed S3 objects"
        );
        Ok(objects)
    }

    fn open(&self, object: &ObjectInfo) -> Arc<dyn ByteReader> {
        Arc::new(S3ByteReader::new(
            Arc::clone(&self.s3_client),
            self.bucket.clone(),
            self.full_key(&object.key),
            object.size,
        ))
    }
}
