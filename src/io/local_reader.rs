use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::byte_reader::ByteReader;

/// ByteReader implementation for local files
#[derive(Clone)]
pub struct LocalFileByteReader {
    file_path: PathBuf,
}

impl LocalFileByteReader {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl ByteReader for LocalFileByteReader {
    async fn size(&self) -> Result<u64> {
        let metadata = tokio::fs::metadata(&self.file_path)
            .await
            .with_context(|| format!("Failed to stat {}", self.file_path.display()))?;
        Ok(metadata.len())
    }

    async fn read_range(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        let mut file = File::open(&self.file_path)
            .await
            .with_context(|| format!("Failed to open {}", self.file_path.display()))?;

        file.seek(std::io::SeekFrom::Start(start)).await?;

        let mut buffer = Vec::with_capacity(end.saturating_sub(start) as usize);
        file.take(end.saturating_sub(start))
            .read_to_end(&mut buffer)
            .await
            .with_context(|| format!("Failed to read {}", self.file_path.display()))?;

        Ok(buffer)
    }
}
