use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::byte_reader::ByteReader;
use super::local_reader::LocalFileByteReader;
use super::store::{DatasetStore, ObjectInfo};

/// DatasetStore backed by a local directory tree
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn resolve(&self, prefix: &str) -> PathBuf {
        prefix
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

fn join_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

#[async_trait]
impl DatasetStore for LocalStore {
    async fn list_directories(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = self.resolve(prefix);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;

        let mut directories = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                directories.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        directories.sort();
        Ok(directories)
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let prefix = prefix.trim_matches('/').to_string();
        let mut pending = vec![(self.resolve(&prefix), prefix)];
        let mut objects = Vec::new();

        while let Some((dir, key_prefix)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .with_context(|| format!("Failed to read directory {}", dir.display()))?;

            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                let key = join_key(&key_prefix, &name);
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    pending.push((entry.path(), key));
                } else if file_type.is_file() {
                    let metadata = entry
                        .metadata()
                        .await
                        .with_context(|| format!("Failed to stat {}", entry.path().display()))?;

                    objects.push(ObjectInfo {
                        key,
                        size: metadata.len(),
                        last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                    });
                }
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    fn open(&self, object: &ObjectInfo) -> Arc<dyn ByteReader> {
        Arc::new(LocalFileByteReader::new(self.resolve(&object.key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str, contents: &[u8]) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[tokio::test]
    async fn test_list_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "v1/a.parquet", b"x");
        touch(dir.path(), "v2/b.parquet", b"x");
        touch(dir.path(), "README", b"x");

        let store = LocalStore::new(dir.path());
        let dirs = store.list_directories("").await.unwrap();
        assert_eq!(dirs, vec!["v1", "v2"]);
    }

    #[tokio::test]
    async fn test_list_objects_recursive() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "v1/day=1/a.parquet", b"abc");
        touch(dir.path(), "v1/day=2/b.parquet", b"abcd");
        touch(dir.path(), "v1/day=2/_SUCCESS", b"");
        touch(dir.path(), "v2/c.parquet", b"x");

        let store = LocalStore::new(dir.path());
        let objects = store.list_objects("v1").await.unwrap();
        let keys: Vec<&str> = objects.iter().map(|o| o.key.as_str()).collect();

        assert_eq!(
            keys,
            vec![
                "v1/day=1/a.parquet",
                "v1/day=2/_SUCCESS",
                "v1/day=2/b.parquet",
            ]
        );
        assert_eq!(objects[0].size, 3);
        assert!(objects[0].last_modified.is_some());
    }

    #[tokio::test]
    async fn test_open_reads_listed_object() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "v1/day=1/a.parquet", b"hello");

        let store = LocalStore::new(dir.path());
        let objects = store.list_objects("v1").await.unwrap();
        let reader = store.open(&objects[0]);

        assert_eq!(reader.size().await.unwrap(), 5);
        assert_eq!(reader.read_range(1, 4).await.unwrap(), b"ell");
    }

    #[tokio::test]
    async fn test_missing_root_is_error() {
        let store = LocalStore::new("/definitely/not/here");
        assert!(store.list_directories("").await.is_err());
    }
}
