use anyhow::{Context, Result, anyhow, bail};
use std::path::PathBuf;
use url::Url;

/// Represents the parsed root of a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetUri {
    Local(PathBuf),
    /// `prefix` never has a leading or trailing '/'
    S3 { bucket: String, prefix: String },
}

impl DatasetUri {
    /// Parse a URI string into a DatasetUri
    pub fn parse(uri: &str) -> Result<Self> {
        // S3 keys are taken verbatim; URL parsing would percent-encode spaces
        // and cut the key at '#' or '?'
        if let Some((scheme, rest)) = uri.split_once("://")
            && matches!(scheme.to_ascii_lowercase().as_str(), "s3" | "s3a" | "s3n")
        {
            return Self::s3(uri, rest);
        }

        // Try parsing as URL first
        if let Ok(url) = Url::parse(uri) {
            match url.scheme() {
                "file" => {
                    let path = url
                        .to_file_path()
                        .map_err(|_| anyhow!("Invalid file:// URI: {}", uri))?;
                    Ok(DatasetUri::Local(path))
                }
                // Windows drive letters parse as one-letter schemes
                scheme if scheme.len() == 1 => Self::local(uri),
                scheme => Err(anyhow!("Unsupported URI scheme: {}", scheme)),
            }
        } else {
            // Treat as local directory path
            Self::local(uri)
        }
    }

    fn s3(uri: &str, rest: &str) -> Result<Self> {
        let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            bail!("S3 URI missing bucket: {}", uri);
        }

        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            bail!(
                "S3 URI missing dataset prefix: {} (expected s3://BUCKET/DATASET)",
                uri
            );
        }

        Ok(DatasetUri::S3 {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        })
    }

    fn local(path: &str) -> Result<Self> {
        let trimmed = path.trim_end_matches(['/', '\\']);
        let path = if trimmed.is_empty() { path } else { trimmed };
        let absolute = std::path::absolute(path)
            .with_context(|| format!("Failed to resolve dataset path {}", path))?;
        Ok(DatasetUri::Local(absolute))
    }

    /// Last path segment of the dataset root, used as the default table name
    pub fn dataset_name(&self) -> Option<String> {
        match self {
            DatasetUri::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            DatasetUri::S3 { prefix, .. } => prefix.rsplit('/').next().map(str::to_string),
        }
    }

    /// Location string for a path relative to the dataset root, as written into
    /// a Hive LOCATION clause
    pub fn location(&self, relative: &str) -> String {
        let relative = relative.trim_matches('/');
        let base = match self {
            DatasetUri::Local(path) => {
                let path = path.to_string_lossy().replace('\\', "/");
                if path.starts_with('/') {
                    format!("file://{}", path.trim_end_matches('/'))
                } else {
                    format!("file:///{}", path.trim_end_matches('/'))
                }
            }
            DatasetUri::S3 { bucket, prefix } => format!("s3://{}/{}", bucket, prefix),
        };

        if relative.is_empty() {
            base
        } else {
            format!("{}/{}", base, relative)
        }
    }
}

impl std::fmt::Display for DatasetUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetUri::Local(path) => write!(f, "{}", path.display()),
            DatasetUri::S3 { bucket, prefix } => write!(f, "s3://{}/{}", bucket, prefix),
        }
    }
}
