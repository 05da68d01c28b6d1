//! Hive DDL statement generation.

use anyhow::{Result, bail};
use derive_builder::Builder;

use super::types::{HiveColumn, quote_identifier, quote_literal};
use crate::dataset::PartitionValue;

/// How partitions are registered after the table is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartitionStrategy {
    /// One `ALTER TABLE ... ADD PARTITION` per discovered partition
    #[default]
    Explicit,
    /// A single `MSCK REPAIR TABLE`, letting the metastore scan the location
    MsckRepair,
}

/// Statement generation options
#[derive(Debug, Clone)]
pub struct DdlOptions {
    /// Emit `DROP TABLE IF EXISTS` before the CREATE; otherwise use `IF NOT EXISTS`
    pub drop_existing: bool,
    pub partition_strategy: PartitionStrategy,
}

impl Default for DdlOptions {
    fn default() -> Self {
        Self {
            drop_existing: true,
            partition_strategy: PartitionStrategy::Explicit,
        }
    }
}

/// An external table over one dataset version
#[derive(Debug, Clone, Builder)]
pub struct TableDefinition {
    #[builder(setter(into))]
    pub name: String,
    pub columns: Vec<HiveColumn>,
    #[builder(default)]
    pub partition_keys: Vec<String>,
    #[builder(setter(into))]
    pub location: String,
}

impl TableDefinition {
    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            bail!("Table '{}' has no columns", self.name);
        }

        for key in &self.partition_keys {
            if let Some(column) = self
                .columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(key))
            {
                bail!(
                    "Partition key '{}' of table '{}' collides with data column '{}'",
                    key,
                    self.name,
                    column.name
                );
            }
        }

        Ok(())
    }
}

/// A partition to register, with its absolute location
#[derive(Debug, Clone)]
pub struct PartitionEntry<'a> {
    pub values: &'a [PartitionValue],
    pub location: String,
}

/// Generate the statements that (re)create `table` and register `partitions`
///
/// Statements are returned without a trailing ';'; see [`render_script`].
pub fn table_statements(
    table: &TableDefinition,
    partitions: &[PartitionEntry<'_>],
    options: &DdlOptions,
) -> Result<Vec<String>> {
    table.validate()?;

    let name = quote_identifier(&table.name);
    let mut statements = Vec::new();

    let create = if options.drop_existing {
        statements.push(format!("DROP TABLE IF EXISTS {}", name));
        "CREATE EXTERNAL TABLE"
    } else {
        "CREATE EXTERNAL TABLE IF NOT EXISTS"
    };

    let column_defs: Vec<String> = table
        .columns
        .iter()
        .map(|col| format!("  {} {}", quote_identifier(&col.name), col.hive_type))
        .collect();

    let mut ddl = format!("{} {} (\n", create, name);
    ddl.push_str(&column_defs.join(",\n"));
    ddl.push_str("\n)");

    if !table.partition_keys.is_empty() {
        let partition_defs: Vec<String> = table
            .partition_keys
            .iter()
            .map(|key| format!("  {} string", quote_identifier(key)))
            .collect();
        ddl.push_str("\nPARTITIONED BY (\n");
        ddl.push_str(&partition_defs.join(",\n"));
        ddl.push_str("\n)");
    }

    ddl.push_str("\nSTORED AS PARQUET\nLOCATION ");
    ddl.push_str(&quote_literal(&table.location));
    statements.push(ddl);

    if table.partition_keys.is_empty() {
        return Ok(statements);
    }

    match options.partition_strategy {
        PartitionStrategy::MsckRepair => {
            statements.push(format!("MSCK REPAIR TABLE {}", name));
        }
        PartitionStrategy::Explicit => {
            for partition in partitions {
                statements.push(add_partition_statement(table, partition)?);
            }
        }
    }

    Ok(statements)
}

fn add_partition_statement(
    table: &TableDefinition,
    partition: &PartitionEntry<'_>,
) -> Result<String> {
    let keys_match = partition.values.len() == table.partition_keys.len()
        && partition
            .values
            .iter()
            .zip(&table.partition_keys)
            .all(|(value, key)| &value.key == key);

    if !keys_match {
        bail!(
            "Partition at '{}' does not match the partition keys of table '{}'",
            partition.location,
            table.name
        );
    }

    let values: Vec<String> = partition
        .values
        .iter()
        .map(|v| format!("{}={}", quote_identifier(&v.key), quote_literal(&v.value)))
        .collect();

    Ok(format!(
        "ALTER TABLE {} ADD IF NOT EXISTS PARTITION ({}) LOCATION {}",
        quote_identifier(&table.name),
        values.join(", "),
        quote_literal(&partition.location)
    ))
}

/// Join statements into a script, each terminated by ";" and a newline
pub fn render_script(statements: &[String]) -> String {
    statements.iter().map(|s| format!("{};\n", s)).collect()
}
