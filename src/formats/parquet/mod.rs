//! Parquet support for the statement generator.
//!
//! This module provides functionality to read the footer of Apache Parquet
//! files and describe their schema in Hive terms. It includes:
//! - Footer reading over any ByteReader with at most two ranged reads
//! - Mapping of primitive, LIST, MAP and struct fields to Hive types

mod reader;
mod schema;

pub use reader::read_metadata;
pub use schema::hive_columns;
