//! Integration tests for dataset discovery and statement generation
//!
//! These tests build real Parquet datasets in temporary directories and run
//! the public runner API end to end against the local store.

#[cfg(test)]
mod tests {
    use crate::runner::{GenerateArgs, PartitionStrategy, plan_dataset, run_generate};
    use arrow::array::{Array, ArrayRef, Int64Array, ListArray, StringArray};
    use arrow::datatypes::{DataType, Field, Int32Type, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use tempfile::TempDir;

    // ============ Test Helpers ============

    /// Helper to write a small Parquet file with id,name (and optionally tags) columns
    fn write_parquet(path: &Path, with_tags: bool) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();

        let mut fields = vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ];
        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(vec![1, 2, 3])),
            Arc::new(StringArray::from(vec!["a", "b", "c"])),
        ];

        if with_tags {
            let tags = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![
                Some(vec![Some(1), Some(2)]),
                None,
                Some(vec![]),
            ]);
            fields.push(Field::new("tags", tags.data_type().clone(), true));
            columns.push(Arc::new(tags));
        }

        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();

        let file = std::fs::File::create(path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
    }

    /// Helper to create an empty marker file
    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"").unwrap();
    }

    /// Helper to create an `events` dataset root inside a temp dir
    fn dataset_root(dir: &TempDir) -> PathBuf {
        let root = dir.path().join("events");
        std::fs::create_dir_all(&root).unwrap();
        root
    }

    /// Helper to build a dataset with versions v1, v2 and v10; only v10 has tags
    fn create_versioned_dataset(dir: &TempDir) -> PathBuf {
        let root = dataset_root(dir);
        write_parquet(&root.join("v1/part-00000.parquet"), false);
        write_parquet(&root.join("v2/part-00000.parquet"), false);
        write_parquet(&root.join("v10/part-00000.parquet"), true);
        root
    }

    /// Helper to build a dataset partitioned by submission_date; only the
    /// first partition is marked complete
    fn create_partitioned_dataset(dir: &TempDir) -> PathBuf {
        let root = dataset_root(dir);
        let complete = root.join("v1/submission_date=20160101");
        write_parquet(&complete.join("part-00000.parquet"), false);
        write_parquet(&complete.join("part-00001.parquet"), false);
        touch(&complete.join("_SUCCESS"));
        let pending = root.join("v1/submission_date=20160102");
        write_parquet(&pending.join("part-00000.parquet"), false);
        root
    }

    fn location(root: &Path, relative: &str) -> String {
        format!("file://{}/{}", root.display(), relative)
    }

    fn args_for(root: &Path) -> GenerateArgs {
        GenerateArgs::new(root.to_str().unwrap())
    }

    // ============ Version Selection ============

    #[tokio::test]
    async fn test_latest_version_is_numeric() {
        let dir = TempDir::new().unwrap();
        let root = create_versioned_dataset(&dir);

        let result = run_generate(args_for(&root)).await.unwrap();

        assert_eq!(result.tables.len(), 1);
        assert_eq!(result.tables[0].table_name, "events");
        assert_eq!(result.tables[0].version, "v10");
        assert_eq!(result.tables[0].column_count, 3);
        assert_eq!(result.plan.available_versions, vec!["v1", "v2", "v10"]);

        assert_eq!(result.statements.len(), 2);
        assert_eq!(result.statements[0], "DROP TABLE IF EXISTS `events`");
        assert_eq!(
            result.statements[1],
            format!(
                "CREATE EXTERNAL TABLE `events` (\n  `id` bigint,\n  `name` string,\n  \
                 `tags` array<int>\n)\nSTORED AS PARQUET\nLOCATION '{}'",
                location(&root, "v10")
            )
        );
    }

    #[tokio::test]
    async fn test_exact_version() {
        let dir = TempDir::new().unwrap();
        let root = create_versioned_dataset(&dir);

        let mut args = args_for(&root);
        args.version = Some("v2".to_string());
        let result = run_generate(args).await.unwrap();

        assert_eq!(result.tables.len(), 1);
        assert_eq!(result.tables[0].version, "v2");
        assert_eq!(result.tables[0].column_count, 2);
        assert!(result.statements[1].ends_with(&format!("LOCATION '{}'", location(&root, "v2"))));
    }

    #[tokio::test]
    async fn test_unknown_exact_version_lists_available() {
        let dir = TempDir::new().unwrap();
        let root = create_versioned_dataset(&dir);

        let mut args = args_for(&root);
        args.version = Some("v3".to_string());
        let err = run_generate(args).await.unwrap_err().to_string();

        assert!(err.contains("v3"));
        assert!(err.contains("v1, v2, v10"));
    }

    #[tokio::test]
    async fn test_use_last_versions_creates_versioned_tables() {
        let dir = TempDir::new().unwrap();
        let root = create_versioned_dataset(&dir);

        let mut args = args_for(&root);
        args.use_last_versions = 2;
        let result = run_generate(args).await.unwrap();

        let names: Vec<&str> = result.tables.iter().map(|t| t.table_name.as_str()).collect();
        assert_eq!(names, vec!["events", "events_v2", "events_v10"]);
        assert_eq!(result.tables[0].version, "v10");
        assert_eq!(result.tables[1].column_count, 2);
        assert_eq!(result.tables[2].column_count, 3);
        assert_eq!(result.statements.len(), 6);
    }

    #[tokio::test]
    async fn test_custom_version_regex_and_other_directories() {
        let dir = TempDir::new().unwrap();
        let root = dataset_root(&dir);
        write_parquet(&root.join("version_1/part-00000.parquet"), false);
        write_parquet(&root.join("version_2/part-00000.parquet"), true);
        write_parquet(&root.join("v9/part-00000.parquet"), false);
        std::fs::create_dir_all(root.join("_temporary")).unwrap();

        let mut args = args_for(&root);
        args.version_regex = "version_[0-9]+".to_string();
        let result = run_generate(args).await.unwrap();

        let available = &result.plan.available_versions;
        assert_eq!(available, &vec!["version_1", "version_2"]);
        assert_eq!(result.tables[0].version, "version_2");
    }

    #[tokio::test]
    async fn test_no_versions_is_error() {
        let dir = TempDir::new().unwrap();
        let root = dataset_root(&dir);
        write_parquet(&root.join("part-00000.parquet"), false);

        let err = run_generate(args_for(&root)).await.unwrap_err().to_string();
        assert!(err.contains("No version directories"));
    }

    #[tokio::test]
    async fn test_missing_dataset_is_error() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("does_not_exist");

        assert!(run_generate(args_for(&root)).await.is_err());
    }

    // ============ Partitions ============

    #[tokio::test]
    async fn test_partitions_are_added() {
        let dir = TempDir::new().unwrap();
        let root = create_partitioned_dataset(&dir);

        let result = run_generate(args_for(&root)).await.unwrap();

        assert_eq!(result.tables[0].partitions_added, 2);
        assert_eq!(result.statements.len(), 4);
        assert!(result.statements[1].contains("PARTITIONED BY (\n  `submission_date` string\n)"));
        assert_eq!(
            result.statements[2],
            format!(
                "ALTER TABLE `events` ADD IF NOT EXISTS \
                 PARTITION (`submission_date`='20160101') LOCATION '{}'",
                location(&root, "v1/submission_date=20160101")
            )
        );
        assert!(result.statements[3].contains("`submission_date`='20160102'"));
    }

    #[tokio::test]
    async fn test_success_only() {
        let dir = TempDir::new().unwrap();
        let root = create_partitioned_dataset(&dir);

        let mut args = args_for(&root);
        args.success_only = true;
        let result = run_generate(args).await.unwrap();

        assert_eq!(result.tables[0].partitions_added, 1);
        assert_eq!(result.statements.len(), 3);
        assert!(result.statements[2].contains("20160101"));
    }

    #[tokio::test]
    async fn test_success_only_without_markers_creates_empty_table() {
        let dir = TempDir::new().unwrap();
        let root = dataset_root(&dir);
        write_parquet(&root.join("v1/day=1/part-00000.parquet"), false);

        let mut args = args_for(&root);
        args.success_only = true;
        let result = run_generate(args).await.unwrap();

        assert_eq!(result.tables[0].partitions_added, 0);
        assert_eq!(result.statements.len(), 2);
    }

    #[tokio::test]
    async fn test_msck_repair() {
        let dir = TempDir::new().unwrap();
        let root = create_partitioned_dataset(&dir);

        let mut args = args_for(&root);
        args.partition_strategy = PartitionStrategy::MsckRepair;
        args.drop_existing = false;
        let result = run_generate(args).await.unwrap();

        assert_eq!(result.statements.len(), 2);
        assert!(result.statements[0].starts_with("CREATE EXTERNAL TABLE IF NOT EXISTS `events`"));
        assert_eq!(result.statements[1], "MSCK REPAIR TABLE `events`");
        assert_eq!(result.tables[0].partitions_added, 0);
    }

    #[tokio::test]
    async fn test_success_only_with_msck_is_rejected() {
        let dir = TempDir::new().unwrap();
        let root = create_partitioned_dataset(&dir);

        let mut args = args_for(&root);
        args.success_only = true;
        args.partition_strategy = PartitionStrategy::MsckRepair;
        assert!(run_generate(args).await.is_err());
    }

    #[tokio::test]
    async fn test_inconsistent_partitioning_is_error() {
        let dir = TempDir::new().unwrap();
        let root = dataset_root(&dir);
        write_parquet(&root.join("v1/day=1/part-00000.parquet"), false);
        write_parquet(&root.join("v1/day=2/hour=3/part-00000.parquet"), false);

        let err = run_generate(args_for(&root)).await.unwrap_err().to_string();
        assert!(err.contains("Inconsistent partitioning"));
    }

    #[tokio::test]
    async fn test_partition_key_colliding_with_column_is_error() {
        let dir = TempDir::new().unwrap();
        let root = dataset_root(&dir);
        write_parquet(&root.join("v1/id=1/part-00000.parquet"), false);

        let err = format!("{:#}", run_generate(args_for(&root)).await.unwrap_err());
        assert!(err.contains("collides"));
    }

    // ============ Naming and Errors ============

    #[tokio::test]
    async fn test_alias() {
        let dir = TempDir::new().unwrap();
        let root = create_versioned_dataset(&dir);

        let mut args = args_for(&root);
        args.alias = Some("telemetry-events".to_string());
        args.use_last_versions = 2;
        let result = run_generate(args).await.unwrap();

        assert_eq!(result.plan.base_name, "telemetry_events");
        assert_eq!(result.tables[0].table_name, "telemetry_events");
        assert_eq!(result.tables[1].table_name, "telemetry_events_v2");
        assert!(result.script().starts_with("DROP TABLE IF EXISTS `telemetry_events`;\n"));
    }

    #[tokio::test]
    async fn test_invalid_parquet_file_is_error() {
        let dir = TempDir::new().unwrap();
        let root = dataset_root(&dir);
        let path = root.join("v1/part-00000.parquet");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"definitely not a parquet file").unwrap();

        let err = format!("{:#}", run_generate(args_for(&root)).await.unwrap_err());
        assert!(err.contains("Failed to read Parquet footer"));
        assert!(err.contains("Not a Parquet file"));
    }

    #[tokio::test]
    async fn test_hidden_and_tiny_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        let root = dataset_root(&dir);
        write_parquet(&root.join("v1/part-00000.parquet"), false);
        touch(&root.join("v1/.part-00000.parquet.crc"));
        touch(&root.join("v1/_SUCCESS"));
        std::fs::write(root.join("v1/empty.parquet"), b"PAR1").unwrap();

        let plan = plan_dataset(&args_for(&root)).await.unwrap();
        assert_eq!(plan.tables[0].data_file_count, 1);
    }

    // ============ Dry Run ============

    #[tokio::test]
    async fn test_plan_dataset() {
        let dir = TempDir::new().unwrap();
        let root = create_partitioned_dataset(&dir);

        let mut args = args_for(&root);
        args.success_only = true;
        let plan = plan_dataset(&args).await.unwrap();

        assert_eq!(plan.base_name, "events");
        assert_eq!(plan.available_versions, vec!["v1"]);
        assert_eq!(plan.tables.len(), 1);

        let table = &plan.tables[0];
        assert_eq!(table.location, location(&root, "v1"));
        assert_eq!(table.partition_keys, vec!["submission_date"]);
        assert_eq!(table.partition_count, 2);
        assert_eq!(table.partitions_to_add, 1);
        assert_eq!(table.data_file_count, 3);
        assert!(table.schema_source.starts_with(&location(&root, "v1/submission_date=")));
    }
}
