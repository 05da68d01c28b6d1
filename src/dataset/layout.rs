//! Partition layout of a single dataset version.
//!
//! Objects below `VERSION/` are classified into data files, `_SUCCESS` markers
//! and entries Hive would ignore anyway. Directory segments between the
//! version and the file must follow the `key=value` convention; their keys
//! become the table's partition columns.

use anyhow::{Result, anyhow, bail};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::version::DatasetVersion;
use crate::config::{FOLDER_MARKER_SUFFIX, MIN_PARQUET_FILE_SIZE, SUCCESS_MARKER};
use crate::io::ObjectInfo;

/// One `key=value` path segment
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PartitionValue {
    pub key: String,
    pub value: String,
}

impl PartitionValue {
    /// Parse a `key=value` directory name. The value may be empty, the key may not.
    pub fn parse(segment: &str) -> Option<Self> {
        let (key, value) = segment.split_once('=')?;
        if key.is_empty() {
            return None;
        }
        Some(Self {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

/// A leaf partition directory holding data files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub values: Vec<PartitionValue>,
    /// Path relative to the dataset root, e.g. `v2/submission_date=20160101`
    pub path: String,
    pub file_count: usize,
    pub has_success_marker: bool,
}

/// Data files and partitions discovered for one version
#[derive(Debug, Clone)]
pub struct VersionLayout {
    pub version: DatasetVersion,
    pub partition_keys: Vec<String>,
    /// Sorted by path; empty for unpartitioned versions
    pub partitions: Vec<Partition>,
    pub data_files: Vec<ObjectInfo>,
    /// Whether the version root itself carries a `_SUCCESS` marker
    pub root_success_marker: bool,
}

/// What an object key means for the layout
enum Entry<'a> {
    Data {
        directory: &'a str,
        values: Vec<PartitionValue>,
    },
    SuccessMarker {
        directory: &'a str,
    },
    Ignored,
}

fn classify<'a>(object: &ObjectInfo, relative: &'a str) -> Entry<'a> {
    if relative.is_empty() || relative.ends_with('/') || relative.ends_with(FOLDER_MARKER_SUFFIX) {
        return Entry::Ignored;
    }

    let (directory, file_name) = match relative.rsplit_once('/') {
        Some((directory, file_name)) => (directory, file_name),
        None => ("", relative),
    };

    if file_name == SUCCESS_MARKER {
        return Entry::SuccessMarker { directory };
    }

    if file_name.starts_with('_') || file_name.starts_with('.') {
        debug!(key = %object.key, "Skipping hidden file");
        return Entry::Ignored;
    }

    let mut values = Vec::new();
    for segment in directory.split('/').filter(|s| !s.is_empty()) {
        match PartitionValue::parse(segment) {
            Some(value) => values.push(value),
            None => {
                warn!(
                    key = %object.key,
                    segment,
                    "Skipping file outside a key=value partition directory"
                );
                return Entry::Ignored;
            }
        }
    }

    if object.size < MIN_PARQUET_FILE_SIZE {
        warn!(
            key = %object.key,
            size = object.size,
            "Skipping file too small to be Parquet"
        );
        return Entry::Ignored;
    }

    Entry::Data { directory, values }
}

fn keys_of(values: &[PartitionValue]) -> Vec<String> {
    values.iter().map(|v| v.key.clone()).collect()
}

fn describe_keys(keys: &[String]) -> String {
    if keys.is_empty() {
        "(unpartitioned)".to_string()
    } else {
        keys.join("/")
    }
}

impl VersionLayout {
    /// Build the layout of `version` from the objects listed below it
    ///
    /// Object keys are relative to the dataset root, so each must start with
    /// `VERSION/`; anything else is ignored.
    pub fn from_objects(version: DatasetVersion, objects: &[ObjectInfo]) -> Result<Self> {
        let version_prefix = format!("{}/", version.name);

        let mut partition_keys: Option<Vec<String>> = None;
        let mut first_file_of_layout = String::new();
        let mut partitions: BTreeMap<String, Partition> = BTreeMap::new();
        let mut success_dirs: Vec<&str> = Vec::new();
        let mut data_files = Vec::new();

        for object in objects {
            let Some(relative) = object.key.strip_prefix(&version_prefix) else {
                continue;
            };

            match classify(object, relative) {
                Entry::Ignored => {}
                Entry::SuccessMarker { directory } => success_dirs.push(directory),
                Entry::Data { directory, values } => {
                    let keys = keys_of(&values);

                    // Hive column names are case-insensitive
                    for (i, key) in keys.iter().enumerate() {
                        if keys[..i].iter().any(|k| k.eq_ignore_ascii_case(key)) {
                            bail!(
                                "Partition key '{}' appears more than once in '{}'",
                                key,
                                object.key
                            );
                        }
                    }

                    if let Some(expected) = &partition_keys {
                        if *expected != keys {
                            bail!(
                                "Inconsistent partitioning in version {}: \
                                 '{}' is partitioned by {} but '{}' is partitioned by {}",
                                version,
                                first_file_of_layout,
                                describe_keys(expected),
                                object.key,
                                describe_keys(&keys)
                            );
                        }
                    } else {
                        partition_keys = Some(keys);
                        first_file_of_layout = object.key.clone();
                    }

                    if !values.is_empty() {
                        let path = format!("{}{}", version_prefix, directory);
                        partitions
                            .entry(directory.to_string())
                            .or_insert_with(|| Partition {
                                values,
                                path,
                                file_count: 0,
                                has_success_marker: false,
                            })
                            .file_count += 1;
                    }

                    data_files.push(object.clone());
                }
            }
        }

        let Some(partition_keys) = partition_keys else {
            bail!("Version {} contains no Parquet data files", version);
        };

        let mut root_success_marker = false;
        for directory in success_dirs {
            if directory.is_empty() {
                root_success_marker = true;
            } else if let Some(partition) = partitions.get_mut(directory) {
                partition.has_success_marker = true;
            }
        }

        Ok(Self {
            version,
            partition_keys,
            partitions: partitions.into_values().collect(),
            data_files,
            root_success_marker,
        })
    }

    pub fn is_partitioned(&self) -> bool {
        !self.partition_keys.is_empty()
    }

    /// The data file whose footer defines the table schema: the most recently
    /// modified one, ties broken by the greatest key
    pub fn schema_source(&self) -> Result<&ObjectInfo> {
        self.data_files
            .iter()
            .max_by(|a, b| {
                a.last_modified
                    .cmp(&b.last_modified)
                    .then_with(|| a.key.cmp(&b.key))
            })
            .ok_or_else(|| anyhow!("Version {} has no data files", self.version))
    }

    /// Partitions to register, optionally restricted to completed ones
    pub fn partitions_to_add(&self, success_only: bool) -> Vec<&Partition> {
        self.partitions
            .iter()
            .filter(|p| !success_only || p.has_success_marker)
            .collect()
    }
}
