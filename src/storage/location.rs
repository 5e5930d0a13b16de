//! Storage locations (S3, R2, GCS, Azure, local filesystem)

use crate::error::{Error, Result};
use crate::storage::glob::GlobPattern;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// A root inside an object store, parsed from a URL or local path
///
/// All keys handed to a location are relative to its root; the root
/// prefix is never visible to callers.
#[derive(Clone)]
pub struct StorageLocation {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Root prefix within the bucket/container
    prefix: ObjectPath,
    /// URL scheme (s3, r2, gs, az, file)
    scheme: String,
    /// Original URL, for logging
    url: String,
}

impl fmt::Debug for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageLocation")
            .field("url", &self.url)
            .field("scheme", &self.scheme)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl StorageLocation {
    /// Open an existing location for reading
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `/local/path/`, `./path/` or `file:///path` - Local filesystem
    pub fn parse(url: &str) -> Result<Self> {
        Self::open(url, false)
    }

    /// Open a location for writing, creating local directories on demand
    pub fn parse_output(url: &str) -> Result<Self> {
        Self::open(url, true)
    }

    /// Wrap an existing store, for callers that build their own client
    pub fn from_store(store: Arc<dyn ObjectStore>, prefix: &str, scheme: &str) -> Self {
        Self {
            store,
            prefix: join_segments(&ObjectPath::default(), prefix),
            scheme: scheme.to_string(),
            url: format!("{scheme}://{prefix}"),
        }
    }

    fn open(url: &str, create: bool) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(Error::location(url, "location cannot be empty"));
        }

        if url.starts_with("s3://") {
            Self::parse_s3(url, false)
        } else if url.starts_with("r2://") {
            Self::parse_s3(url, true)
        } else if url.starts_with("gs://") {
            Self::parse_gcs(url)
        } else if url.starts_with("az://") {
            Self::parse_azure(url)
        } else {
            Self::parse_local(url, create)
        }
    }

    /// Split a bucket URL into (bucket, prefix)
    fn split_bucket_url(url: &str) -> Result<(String, String)> {
        let parsed = Url::parse(url)?;
        let bucket = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::location(url, "missing bucket or container name"))?
            .to_string();
        let prefix = parsed.path().trim_matches('/').to_string();
        Ok((bucket, prefix))
    }

    /// Parse S3 or R2 URL
    fn parse_s3(url: &str, is_r2: bool) -> Result<Self> {
        let scheme = if is_r2 { "r2" } else { "s3" };
        let (bucket, prefix) = Self::split_bucket_url(url)?;

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(&bucket);

        // AWS_ENDPOINT is read by from_env(); R2 also honours its own variable
        if is_r2 {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::location(url, format!("failed to create {scheme} client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: join_segments(&ObjectPath::default(), &prefix),
            scheme: scheme.to_string(),
            url: url.to_string(),
        })
    }

    /// Parse GCS URL
    fn parse_gcs(url: &str) -> Result<Self> {
        let (bucket, prefix) = Self::split_bucket_url(url)?;

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(&bucket)
            .build()
            .map_err(|e| Error::location(url, format!("failed to create GCS client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: join_segments(&ObjectPath::default(), &prefix),
            scheme: "gs".to_string(),
            url: url.to_string(),
        })
    }

    /// Parse Azure Blob URL
    fn parse_azure(url: &str) -> Result<Self> {
        let (container, prefix) = Self::split_bucket_url(url)?;

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(&container)
            .build()
            .map_err(|e| Error::location(url, format!("failed to create Azure client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: join_segments(&ObjectPath::default(), &prefix),
            scheme: "az".to_string(),
            url: url.to_string(),
        })
    }

    /// Parse local filesystem path
    fn parse_local(url: &str, create: bool) -> Result<Self> {
        let path = url.strip_prefix("file://").unwrap_or(url);

        if create {
            std::fs::create_dir_all(path)
                .map_err(|e| Error::location(url, format!("failed to create directory: {e}")))?;
        } else if !std::path::Path::new(path).is_dir() {
            return Err(Error::location(url, "directory does not exist"));
        }

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::location(url, format!("failed to open local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: ObjectPath::default(),
            scheme: "file".to_string(),
            url: url.to_string(),
        })
    }

    /// Get the scheme (s3, r2, gs, az, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Get the URL this location was opened from
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Resolve a `/`-separated key relative to the root
    pub fn path(&self, relative: &str) -> ObjectPath {
        join_segments(&self.prefix, relative)
    }

    /// Logical (decoded) segments of `path` below the root
    ///
    /// Returns `None` when `path` is not under this location.
    pub fn relative_segments(&self, path: &ObjectPath) -> Option<Vec<String>> {
        let parts = path.prefix_match(&self.prefix)?;
        Some(parts.map(|p| percent_decode(p.as_ref())).collect())
    }

    /// Logical key of `path` below the root, `/`-joined
    pub fn relative_key(&self, path: &ObjectPath) -> Option<String> {
        self.relative_segments(path).map(|s| s.join("/"))
    }

    /// List every object below `relative`, sorted by key
    pub async fn list(&self, relative: &str) -> Result<Vec<ObjectPath>> {
        let base = self.path(relative);
        let prefix = if base.as_ref().is_empty() {
            None
        } else {
            Some(&base)
        };

        let mut paths: Vec<ObjectPath> = self
            .store
            .list(prefix)
            .map_ok(|meta| meta.location)
            .try_collect()
            .await?;
        paths.sort();
        Ok(paths)
    }

    /// List objects whose relative key matches a glob pattern, sorted by key
    pub async fn list_matching(&self, pattern: &GlobPattern) -> Result<Vec<ObjectPath>> {
        let candidates = self.list(pattern.literal_prefix()).await?;
        Ok(candidates
            .into_iter()
            .filter(|p| {
                self.relative_key(p)
                    .is_some_and(|key| pattern.matches(&key))
            })
            .collect())
    }

    /// Read a whole object
    pub async fn get(&self, path: &ObjectPath) -> Result<Bytes> {
        let result = self.store.get(path).await?;
        Ok(result.bytes().await?)
    }

    /// Check whether an object exists
    pub async fn exists(&self, path: &ObjectPath) -> Result<bool> {
        match self.store.head(path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Write bytes to an object, returning its full path for logging
    pub async fn put(&self, path: &ObjectPath, data: Bytes) -> Result<String> {
        self.store.put(path, data.into()).await.map_err(|e| {
            Error::output(format!("Failed to write {}: {e}", self.display(path)))
        })?;
        Ok(self.display(path))
    }

    /// Delete every object below `relative`, returning how many were removed
    pub async fn delete_prefix(&self, relative: &str) -> Result<usize> {
        let paths = self.list(relative).await?;
        for path in &paths {
            match self.store.delete(path).await {
                Ok(()) | Err(object_store::Error::NotFound { .. }) => {}
                Err(e) => {
                    return Err(Error::output(format!(
                        "Failed to delete {}: {e}",
                        self.display(path)
                    )))
                }
            }
        }
        Ok(paths.len())
    }

    /// Full path of an object for logging
    pub fn display(&self, path: &ObjectPath) -> String {
        format!("{}://{path}", self.scheme)
    }
}

/// Append each `/`-separated segment of `relative` to `base`, encoding
/// characters the object store reserves
fn join_segments(base: &ObjectPath, relative: &str) -> ObjectPath {
    relative
        .split('/')
        .filter(|s| !s.is_empty())
        .fold(base.clone(), |path, segment| path.child(segment))
}

/// Decode `%XX` escapes; malformed escapes are kept verbatim
pub(crate) fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
