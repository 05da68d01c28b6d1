use anyhow::Context;
use clap::Parser;
use parquet2hive::runner::{
    DEFAULT_VERSION_REGEX, DatasetPlan, GenerateArgs, GenerateResult, PartitionStrategy,
    plan_dataset, run_generate,
};
use std::path::PathBuf;

/// Generate Hive DDL for a versioned Parquet dataset on S3 or a local disk
#[derive(Parser, Clone)]
#[command(name = "parquet2hive", version)]
struct Args {
    /// Dataset root (s3://bucket/path/to/dataset or a local directory)
    dataset: String,

    /// Table name to use instead of the dataset directory name
    #[arg(short, long)]
    alias: Option<String>,

    /// Publish exactly this version (e.g. v3)
    #[arg(short = 'd', long, conflicts_with = "use_last_versions")]
    dataset_version: Option<String>,

    /// Publish the last N versions; each also gets a {table}_{version} table when N > 1
    #[arg(short = 'l', long, default_value = "1")]
    use_last_versions: usize,

    /// Pattern a directory name must fully match to count as a version
    #[arg(long, default_value = DEFAULT_VERSION_REGEX)]
    version_regex: String,

    /// Only add partitions that contain a _SUCCESS file
    #[arg(short, long)]
    success_only: bool,

    /// Register partitions with MSCK REPAIR TABLE instead of ALTER TABLE statements
    #[arg(long, conflicts_with = "success_only")]
    msck: bool,

    /// Emit CREATE ... IF NOT EXISTS instead of DROP + CREATE
    #[arg(long)]
    no_drop: bool,

    /// AWS region (default: provider chain)
    #[arg(short, long)]
    region: Option<String>,

    /// S3-compatible endpoint URL
    #[arg(long, env = "AWS_ENDPOINT_URL_S3")]
    endpoint_url: Option<String>,

    /// Write statements to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show the discovered versions and partitions without reading footers
    #[arg(long)]
    dry_run: bool,

    /// Quiet mode - only warnings and errors on stderr
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn generate_args(&self) -> GenerateArgs {
        let mut args = GenerateArgs::new(&self.dataset);
        args.alias = self.alias.clone();
        args.version = self.dataset_version.clone();
        args.use_last_versions = self.use_last_versions;
        args.version_regex = self.version_regex.clone();
        args.success_only = self.success_only;
        args.partition_strategy = if self.msck {
            PartitionStrategy::MsckRepair
        } else {
            PartitionStrategy::Explicit
        };
        args.drop_existing = !self.no_drop;
        args.region = self.region.clone();
        args.endpoint_url = self.endpoint_url.clone();
        args
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing; stdout is reserved for DDL
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let filter = if let Ok(directives) = std::env::var("RUST_LOG") {
        EnvFilter::new(directives)
    } else if args.quiet {
        EnvFilter::new("parquet2hive=warn,aws_config=error,aws_smithy_runtime=error")
    } else {
        EnvFilter::new("parquet2hive=info,aws_config=warn,aws_smithy_runtime=warn")
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let generate_args = args.generate_args();

    // Handle dry-run mode
    if args.dry_run {
        let plan = plan_dataset(&generate_args).await?;
        print_plan(&plan);
        return Ok(());
    }

    let result = run_generate(generate_args).await?;
    let script = result.script();

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &script)
                .await
                .with_context(|| format!("Failed to write statements to {}", path.display()))?;
        }
        None => print!("{}", script),
    }

    if !args.quiet {
        print_summary(&result, args.output.as_deref());
    }

    Ok(())
}

fn print_plan(plan: &DatasetPlan) {
    println!("DRY RUN MODE - No statements will be generated");
    println!();
    println!("Dataset: {}", plan.dataset);
    println!("Available versions: {}", plan.available_versions.join(", "));
    println!();
    for table in &plan.tables {
        println!("Table: {}", table.table_name);
        println!("  Version: {}", table.version);
        println!("  Location: {}", table.location);
        println!("  Data files: {}", table.data_file_count);
        println!("  Schema source: {}", table.schema_source);
        if table.partition_keys.is_empty() {
            println!("  Partitioned: no");
        } else {
            println!("  Partitioned by: {}", table.partition_keys.join(", "));
            println!(
                "  Partitions: {} ({} to add)",
                table.partition_count, table.partitions_to_add
            );
        }
    }
    println!();
    println!("To generate statements, run without --dry-run");
}

fn print_summary(result: &GenerateResult, output: Option<&std::path::Path>) {
    eprintln!();
    eprintln!("Summary");
    eprintln!("=======");
    for table in &result.tables {
        eprintln!(
            "{} ({}): {} columns, {} partitions",
            table.table_name, table.version, table.column_count, table.partitions_added
        );
    }
    eprintln!("Statements: {}", result.statements.len());
    if let Some(path) = output {
        eprintln!("Written to: {}", path.display());
    }
}
