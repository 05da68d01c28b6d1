//! Configuration constants for the statement generator
//!
//! This module centralizes all tunable parameters and constants used throughout
//! the application.

// ============================================================================
// Parquet Footer Layout
// ============================================================================

/// Leading magic + trailing footer; anything smaller cannot be a Parquet file
pub const MIN_PARQUET_FILE_SIZE: u64 = 12;

/// Number of trailing bytes fetched in the first footer read
///
/// Set to 64KB so that the footer of typical files (a few hundred columns, a
/// handful of row groups) arrives in a single ranged GET. Larger metadata
/// blocks trigger exactly one additional read.
pub const FOOTER_PREFETCH_SIZE: u64 = 64 * 1024; // 64 KB

// ============================================================================
// Listing Configuration
// ============================================================================

/// Keys requested per ListObjectsV2 page (the S3 maximum)
pub const LIST_PAGE_SIZE: i32 = 1000;

/// Upper bound on footers fetched at the same time when several versions
/// are published in one run
pub const MAX_CONCURRENT_FOOTER_READS: usize = 8;

// ============================================================================
// Dataset Layout
// ============================================================================

pub const DEFAULT_VERSION_REGEX: &str = "v[0-9]+";

/// Marker object written by Hadoop/Spark jobs into completed output directories
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Suffix of the placeholder objects some S3 clients create for directories
pub const FOLDER_MARKER_SUFFIX: &str = "_$folder$";

// ============================================================================
// Hive Limits
// ============================================================================

pub const MAX_DECIMAL_PRECISION: u32 = 38;
