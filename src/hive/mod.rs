//! Hive types and DDL generation

pub mod ddl;
pub mod types;

pub use ddl::{
    DdlOptions, PartitionEntry, PartitionStrategy, TableDefinitionBuilder, render_script,
    table_statements,
};
pub use types::{HiveColumn, HiveType, table_name};
