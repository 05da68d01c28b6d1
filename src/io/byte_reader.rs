use anyhow::Result;
use async_trait::async_trait;

/// Abstraction for byte-level I/O operations
/// This trait enables reading files from different sources (local, S3, etc.)
/// with a unified interface for ranged reads
#[async_trait]
pub trait ByteReader: Send + Sync {
    /// Get the total size of the file/object in bytes
    async fn size(&self) -> Result<u64>;

    /// Read a range of bytes from the file/object
    /// Returns the bytes read (may be less than requested if EOF is reached)
    async fn read_range(&self, start: u64, end: u64) -> Result<Vec<u8>>;
}

/// Read the last `len` bytes of a file (or the whole file if it is shorter)
/// Returns the file size together with the bytes, which start at `file_size - bytes.len()`
pub async fn read_tail(reader: &dyn ByteReader, len: u64) -> Result<(u64, Vec<u8>)> {
    let file_size = reader.size().await?;
    if file_size == 0 {
        return Ok((0, Vec::new()));
    }

    let start = file_size.saturating_sub(len);
    let bytes = reader.read_range(start, file_size).await?;

    if bytes.len() as u64 != file_size - start {
        anyhow::bail!(
            "Short read at end of file: expected {} bytes, got {}",
            file_size - start,
            bytes.len()
        );
    }

    Ok((file_size, bytes))
}
