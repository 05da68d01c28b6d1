//! High-level runner API for the Hive statement generator.
//!
//! This module provides a simplified public interface that encapsulates all the
//! internal complexity of listing datasets, reading Parquet footers and
//! rendering DDL.
//!
//! This is the primary API for external users and for the CLI.

use anyhow::{Context, Result, anyhow, bail};
use aws_config::{BehaviorVersion, Region};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::MAX_CONCURRENT_FOOTER_READS;
use crate::dataset::{VersionLayout, VersionRequest, VersionSelector, pick_versions};
use crate::formats::parquet::{hive_columns, read_metadata};
use crate::hive::{
    DdlOptions, HiveColumn, PartitionEntry, TableDefinitionBuilder, render_script, table_name,
    table_statements,
};
use crate::io::{DatasetStore, DatasetUri, StoreFactory};

pub use crate::config::DEFAULT_VERSION_REGEX;
pub use crate::hive::PartitionStrategy;

/// Arguments for generating the statements of one dataset
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    // Source configuration
    pub dataset_uri: String,
    /// Table name to use instead of the dataset directory name
    pub alias: Option<String>,

    // Version selection
    /// Publish exactly this version (takes precedence over `use_last_versions`)
    pub version: Option<String>,
    pub use_last_versions: usize,
    pub version_regex: String,

    // Statement options
    pub success_only: bool,
    pub partition_strategy: PartitionStrategy,
    pub drop_existing: bool,

    // AWS configuration
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
}

impl GenerateArgs {
    /// Arguments with the CLI defaults for the given dataset
    pub fn new(dataset_uri: impl Into<String>) -> Self {
        Self {
            dataset_uri: dataset_uri.into(),
            alias: None,
            version: None,
            use_last_versions: 1,
            version_regex: DEFAULT_VERSION_REGEX.to_string(),
            success_only: false,
            partition_strategy: PartitionStrategy::Explicit,
            drop_existing: true,
            region: None,
            endpoint_url: None,
        }
    }

    fn version_request(&self) -> VersionRequest {
        match &self.version {
            Some(version) => VersionRequest::Exact(version.clone()),
            None => VersionRequest::Latest(self.use_last_versions),
        }
    }
}

/// A table that will be created over one dataset version
#[derive(Debug, Clone)]
pub struct TablePlan {
    pub table_name: String,
    pub version: String,
    pub location: String,
    pub partition_keys: Vec<String>,
    /// Partitions holding data files
    pub partition_count: usize,
    /// Partitions that will get an ADD PARTITION statement
    pub partitions_to_add: usize,
    pub data_file_count: usize,
    /// Location of the file whose footer defines the schema
    pub schema_source: String,
    layout: Arc<VersionLayout>,
}

/// Result of dataset discovery
#[derive(Debug, Clone)]
pub struct DatasetPlan {
    pub dataset: String,
    pub base_name: String,
    /// All version directories found, oldest first
    pub available_versions: Vec<String>,
    pub tables: Vec<TablePlan>,
}

/// Per-table outcome of statement generation
#[derive(Debug, Clone)]
pub struct TableSummary {
    pub table_name: String,
    pub version: String,
    pub column_count: usize,
    pub partitions_added: usize,
}

/// Result of a completed generation
#[derive(Debug)]
pub struct GenerateResult {
    pub plan: DatasetPlan,
    pub tables: Vec<TableSummary>,
    /// Statements in execution order, without trailing ';'
    pub statements: Vec<String>,
}

impl GenerateResult {
    /// The statements as a script, each terminated by ';'
    pub fn script(&self) -> String {
        render_script(&self.statements)
    }
}

/// Discover the versions and partitions of a dataset without reading any footer
pub async fn plan_dataset(args: &GenerateArgs) -> Result<DatasetPlan> {
    let (uri, store) = open_dataset(args).await?;
    plan_with_store(store.as_ref(), &uri, args).await
}

/// Generate the Hive statements for a dataset
///
/// This is the main entry point. It handles all the internal setup including:
/// - Loading AWS configuration for S3 datasets
/// - Listing version directories and partitions
/// - Reading one Parquet footer per published version
/// - Rendering DROP/CREATE/ALTER statements
///
/// # Example
///
/// ```no_run
/// use parquet2hive::runner::{GenerateArgs, run_generate};
///
/// # async fn example() -> anyhow::Result<()> {
/// let mut args = GenerateArgs::new("s3://my-bucket/telemetry/main_summary");
/// args.use_last_versions = 2;
///
/// let result = run_generate(args).await?;
/// print!("{}", result.script());
/// # Ok(())
/// # }
/// ```
pub async fn run_generate(args: GenerateArgs) -> Result<GenerateResult> {
    let (uri, store) = open_dataset(&args).await?;
    let plan = plan_with_store(store.as_ref(), &uri, &args).await?;
    generate_with_store(store, &uri, plan, &args).await
}

/// Parse the dataset URI and create the matching store
///
/// AWS configuration is only loaded for S3 datasets.
async fn open_dataset(args: &GenerateArgs) -> Result<(DatasetUri, Arc<dyn DatasetStore>)> {
    let uri = DatasetUri::parse(&args.dataset_uri)?;

    let aws_config = match &uri {
        DatasetUri::Local(_) => None,
        DatasetUri::S3 { .. } => {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(region) = &args.region {
                loader = loader.region(Region::new(region.clone()));
            }
            if let Some(endpoint_url) = &args.endpoint_url {
                loader = loader.endpoint_url(endpoint_url);
            }
            Some(loader.load().await)
        }
    };

    let store = StoreFactory::new(aws_config.as_ref()).create_store(&uri)?;
    Ok((uri, store))
}

async fn plan_with_store(
    store: &dyn DatasetStore,
    uri: &DatasetUri,
    args: &GenerateArgs,
) -> Result<DatasetPlan> {
    if args.success_only && args.partition_strategy == PartitionStrategy::MsckRepair {
        bail!(
            "Success-only mode needs explicit partitions and cannot be combined with MSCK REPAIR"
        );
    }

    let base_name = args
        .alias
        .clone()
        .or_else(|| uri.dataset_name())
        .map(|name| table_name(&name))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| anyhow!("Cannot derive a table name from {}; use an alias", uri))?;

    let selector = VersionSelector::new(&args.version_regex)?;
    let directories = store
        .list_directories("")
        .await
        .with_context(|| format!("Failed to list versions of {}", uri))?;
    let available = selector.select(&directories);

    if available.is_empty() {
        bail!(
            "No version directories matching '{}' found under {}",
            args.version_regex,
            uri
        );
    }

    let picked = pick_versions(&available, &args.version_request())?;
    info!(
        dataset = %uri,
        available = available.len(),
        picked = picked.len(),
        "Resolved dataset versions"
    );

    let mut layouts = Vec::with_capacity(picked.len());
    for version in picked {
        let objects = store
            .list_objects(&version.name)
            .await
            .with_context(|| format!("Failed to list objects of version {}", version))?;
        let layout = VersionLayout::from_objects(version, &objects)?;
        info!(
            version = %layout.version,
            data_files = layout.data_files.len(),
            partitions = layout.partitions.len(),
            "Discovered version layout"
        );
        layouts.push(Arc::new(layout));
    }

    let mut tables = Vec::new();
    if let Some(latest) = layouts.last() {
        tables.push(table_plan(base_name.clone(), latest, uri, args)?);
    }
    if layouts.len() > 1 {
        for layout in &layouts {
            let name = format!("{}_{}", base_name, table_name(&layout.version.name));
            tables.push(table_plan(name, layout, uri, args)?);
        }
    }

    Ok(DatasetPlan {
        dataset: uri.to_string(),
        base_name,
        available_versions: available.into_iter().map(|v| v.name).collect(),
        tables,
    })
}

fn table_plan(
    table_name: String,
    layout: &Arc<VersionLayout>,
    uri: &DatasetUri,
    args: &GenerateArgs,
) -> Result<TablePlan> {
    let partitions_to_add = layout.partitions_to_add(args.success_only).len();

    if args.success_only && layout.is_partitioned() && partitions_to_add == 0 {
        warn!(
            table = %table_name,
            version = %layout.version,
            "No partition of this version has a _SUCCESS marker; the table will be empty"
        );
    }
    if args.success_only && !layout.is_partitioned() && !layout.root_success_marker {
        warn!(
            table = %table_name,
            version = %layout.version,
            "Unpartitioned version has no _SUCCESS marker"
        );
    }

    Ok(TablePlan {
        table_name,
        version: layout.version.name.clone(),
        location: uri.location(&layout.version.name),
        partition_keys: layout.partition_keys.clone(),
        partition_count: layout.partitions.len(),
        partitions_to_add,
        data_file_count: layout.data_files.len(),
        schema_source: uri.location(&layout.schema_source()?.key),
        layout: Arc::clone(layout),
    })
}

async fn generate_with_store(
    store: Arc<dyn DatasetStore>,
    uri: &DatasetUri,
    plan: DatasetPlan,
    args: &GenerateArgs,
) -> Result<GenerateResult> {
    // One footer per distinct version; the latest version may back two tables
    let mut layouts: Vec<Arc<VersionLayout>> = Vec::new();
    for table in &plan.tables {
        if !layouts.iter().any(|l| l.version == table.layout.version) {
            layouts.push(Arc::clone(&table.layout));
        }
    }

    let schemas: HashMap<String, Vec<HiveColumn>> = stream::iter(layouts)
        .map(|layout| {
            let store = Arc::clone(&store);
            let uri = uri.clone();
            async move {
                let source = layout.schema_source()?;
                let location = uri.location(&source.key);
                info!(version = %layout.version, source = %location, "Reading Parquet footer");

                let reader = store.open(source);
                let metadata = read_metadata(reader.as_ref())
                    .await
                    .with_context(|| format!("Failed to read Parquet footer of {}", location))?;
                let columns = hive_columns(metadata.file_metadata().schema())
                    .with_context(|| format!("Unsupported Parquet schema in {}", location))?;

                Ok::<_, anyhow::Error>((layout.version.name.clone(), columns))
            }
        })
        .buffered(MAX_CONCURRENT_FOOTER_READS)
        .try_collect()
        .await?;

    let options = DdlOptions {
        drop_existing: args.drop_existing,
        partition_strategy: args.partition_strategy,
    };

    let mut statements = Vec::new();
    let mut summaries = Vec::with_capacity(plan.tables.len());

    for table in &plan.tables {
        let columns = schemas
            .get(&table.version)
            .cloned()
            .ok_or_else(|| anyhow!("Missing schema for version {}", table.version))?;
        let column_count = columns.len();

        let definition = TableDefinitionBuilder::default()
            .name(table.table_name.as_str())
            .columns(columns)
            .partition_keys(table.partition_keys.clone())
            .location(table.location.as_str())
            .build()?;

        let partitions: Vec<PartitionEntry<'_>> = table
            .layout
            .partitions_to_add(args.success_only)
            .into_iter()
            .map(|partition| PartitionEntry {
                values: &partition.values,
                location: uri.location(&partition.path),
            })
            .collect();

        let table_statements = table_statements(&definition, &partitions, &options)
            .with_context(|| format!("Failed to generate DDL for table {}", table.table_name))?;

        let partitions_added = match options.partition_strategy {
            PartitionStrategy::Explicit if definition.partition_keys.is_empty() => 0,
            PartitionStrategy::Explicit => partitions.len(),
            PartitionStrategy::MsckRepair => 0,
        };

        info!(
            table = %table.table_name,
            version = %table.version,
            columns = column_count,
            partitions = partitions_added,
            "Generated table statements"
        );

        statements.extend(table_statements);
        summaries.push(TableSummary {
            table_name: table.table_name.clone(),
            version: table.version.clone(),
            column_count,
            partitions_added,
        });
    }

    Ok(GenerateResult {
        plan,
        tables: summaries,
        statements,
    })
}
