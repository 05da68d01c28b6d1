use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use std::sync::Arc;

use super::byte_reader::ByteReader;

/// ByteReader implementation for S3 objects
///
/// The object size comes from the listing that discovered the object, so only
/// ranged GETs are issued.
#[derive(Clone)]
pub struct S3ByteReader {
    s3_client: Arc<S3Client>,
    bucket: String,
    key: String,
    size: u64,
}

impl S3ByteReader {
    pub fn new(s3_client: Arc<S3Client>, bucket: String, key: String, size: u64) -> Self {
        Self {
            s3_client,
            bucket,
            key,
            size,
        }
    }
}

#[async_trait]
impl ByteReader for S3ByteReader {
    async fn size(&self) -> Result<u64> {
        Ok(self.size)
    }

    async fn read_range(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        if start >= end {
            return Ok(Vec::new());
        }

        // HTTP ranges are inclusive
        let range = format!("bytes={}-{}", start, end - 1);

        let response = self
            .s3_client
            .get_object()
            .bucket(&self.bucket)
            .key(&self.key)
            .range(range)
            .send()
            .await
            .with_context(|| {
                format!(
                    "Failed to read range {}..{} from s3://{}/{}",
                    start, end, self.bucket, self.key
                )
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .context("Failed to collect S3 response body")?
            .into_bytes()
            .to_vec();

        Ok(bytes)
    }
}
