//! File format readers

pub mod parquet;
