//! Parquet footer reader.

use anyhow::{Context, Result, bail};
use parquet::file::FOOTER_SIZE;
use parquet::file::metadata::{ParquetMetaData, ParquetMetaDataReader};
use tracing::debug;

use crate::config::{FOOTER_PREFETCH_SIZE, MIN_PARQUET_FILE_SIZE};
use crate::io::{ByteReader, read_tail};

/// Read and decode the footer metadata of a Parquet file
///
/// The last `FOOTER_PREFETCH_SIZE` bytes are fetched first; a second ranged
/// read is issued only when the metadata block does not fit in that window.
pub async fn read_metadata(reader: &dyn ByteReader) -> Result<ParquetMetaData> {
    let (file_size, tail) = read_tail(reader, FOOTER_PREFETCH_SIZE).await?;

    if file_size < MIN_PARQUET_FILE_SIZE {
        bail!(
            "File of {} bytes is too small to be a Parquet file",
            file_size
        );
    }

    let footer: &[u8; FOOTER_SIZE] = tail[tail.len() - FOOTER_SIZE..].try_into()?;
    let footer = ParquetMetaDataReader::decode_footer_tail(footer)
        .context("Not a Parquet file: footer magic is missing")?;
    if footer.is_encrypted_footer() {
        bail!("Parquet files with encrypted footers are not supported");
    }
    let metadata_len = footer.metadata_length() as u64;

    // Leading magic + metadata + footer must fit in the file
    let footer_start = file_size - FOOTER_SIZE as u64;
    if metadata_len + MIN_PARQUET_FILE_SIZE > file_size {
        bail!(
            "Corrupt Parquet footer: metadata length {} exceeds file size {}",
            metadata_len,
            file_size
        );
    }
    let metadata_start = footer_start - metadata_len;
    let tail_start = file_size - tail.len() as u64;

    let metadata = if metadata_start >= tail_start {
        let offset = (metadata_start - tail_start) as usize;
        ParquetMetaDataReader::decode_metadata(&tail[offset..offset + metadata_len as usize])
    } else {
        debug!(
            metadata_len,
            prefetched = tail.len(),
            "Parquet metadata exceeds prefetch window, issuing second read"
        );
        let bytes = reader
            .read_range(metadata_start, footer_start)
            .await
            .context("Failed to read Parquet metadata block")?;
        if bytes.len() as u64 != metadata_len {
            bail!(
                "Short read of Parquet metadata: expected {} bytes, got {}",
                metadata_len,
                bytes.len()
            );
        }
        ParquetMetaDataReader::decode_metadata(&bytes)
    };

    metadata.context("Failed to decode Parquet metadata")
}
