//! Object store abstraction and backends
//!
//! The proxy core only speaks [`ObjectStore`]: given an object path and an
//! optional byte range, a backend hands back metadata plus a byte stream,
//! or reports the object as absent. "Missing" and "denied" are deliberately
//! indistinguishable at this seam.

use crate::error::{ProxyError, Result};
use crate::models::{ObjectMetadata, RangeRequest};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use futures::Stream;
use http::HeaderValue;
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::pin::Pin;
use std::sync::RwLock;
use std::time::UNIX_EPOCH;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

/// A stream of body chunks read from a backend
pub type ByteStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Read size for streaming file bodies
const READ_CHUNK_SIZE: u64 = 64 * 1024;

/// One successful backend read: metadata plus the (possibly partial) body
pub struct ObjectRead {
    /// Metadata for the whole object, regardless of range
    pub metadata: ObjectMetadata,
    /// Body bytes covering the requested range, or the full object
    pub body: ByteStream,
}

/// Backend object storage interface
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object, optionally restricted to a byte range
    ///
    /// # Arguments
    /// * `path` - Backend object key (percent-decoded, no leading slash)
    /// * `range` - Optional byte range; `None` reads the full object
    ///
    /// # Returns
    /// * `Ok(Some(ObjectRead))` for a readable object
    /// * `Ok(None)` for a nonexistent or inaccessible object
    /// * `Err(ProxyError)` only for backend failures
    async fn get(&self, path: &str, range: Option<&RangeRequest>) -> Result<Option<ObjectRead>>;
}

/// Filesystem-backed object store
///
/// Serves objects from files under a root directory. The object path maps
/// directly to the relative file path; anything that escapes the root or
/// cannot be opened reads as absent.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsObjectStore { root: root.into() }
    }

    /// Resolve an object path to a file path inside the root
    ///
    /// Rejects empty paths, absolute paths and any `..` component.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        if path.is_empty() {
            return None;
        }
        let relative = Path::new(path);
        let safe = relative.components().all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn get(&self, path: &str, range: Option<&RangeRequest>) -> Result<Option<ObjectRead>> {
        let Some(file_path) = self.resolve(path) else {
            debug!("rejected object path: {}", path);
            return Ok(None);
        };

        let mut file = match File::open(&file_path).await {
            Ok(file) => file,
            Err(e) => {
                debug!("cannot open {}: {}", file_path.display(), e);
                return Ok(None);
            }
        };

        let file_meta = file
            .metadata()
            .await
            .map_err(|e| ProxyError::StoreError(format!("stat {}: {}", path, e)))?;
        if !file_meta.is_file() {
            return Ok(None);
        }
        let size = file_meta.len();

        let mut metadata = ObjectMetadata::new(size, file_etag(&file_meta, size));
        if let Some(content_type) = content_type_for(path) {
            metadata
                .content_hints
                .insert(http::header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }

        // Work out which byte window to stream
        let (offset, remaining) = match range {
            None => (0, size),
            Some(range) => {
                if range.offset >= size {
                    debug!(
                        "range offset {} beyond object size {} for {}",
                        range.offset, size, path
                    );
                    return Ok(None);
                }
                let end = range.resolved_end(size).min(size.saturating_sub(1));
                if end < range.offset {
                    debug!(
                        "unsatisfiable range {}-{} for {}",
                        range.offset, end, path
                    );
                    return Ok(None);
                }
                (range.offset, end - range.offset + 1)
            }
        };

        if offset > 0 {
            file.seek(io::SeekFrom::Start(offset))
                .await
                .map_err(|e| ProxyError::StoreError(format!("seek {}: {}", path, e)))?;
        }

        let body = stream::try_unfold((file, remaining), |(mut file, remaining)| async move {
            if remaining == 0 {
                return Ok(None);
            }
            let want = READ_CHUNK_SIZE.min(remaining) as usize;
            let mut buf = vec![0u8; want];
            let n = file.read(&mut buf).await?;
            if n == 0 {
                // File shrank underneath us; end the stream
                return Ok(None);
            }
            buf.truncate(n);
            Ok(Some((Bytes::from(buf), (file, remaining - n as u64))))
        });

        Ok(Some(ObjectRead {
            metadata,
            body: Box::pin(body),
        }))
    }
}

/// In-memory object store
///
/// Holds objects in a map; the backend of choice for tests and embedded use.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, (ObjectMetadata, Bytes)>>,
}

impl MemoryObjectStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object under the given path
    pub fn insert(&self, path: impl Into<String>, metadata: ObjectMetadata, body: Bytes) {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(path.into(), (metadata, body));
        }
    }

    /// Remove an object; subsequent reads report it as absent
    pub fn remove(&self, path: &str) {
        if let Ok(mut objects) = self.objects.write() {
            objects.remove(path);
        }
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, path: &str, range: Option<&RangeRequest>) -> Result<Option<ObjectRead>> {
        let (metadata, body) = {
            let objects = self
                .objects
                .read()
                .map_err(|_| ProxyError::StoreError("object map poisoned".to_string()))?;
            match objects.get(path) {
                Some((metadata, body)) => (metadata.clone(), body.clone()),
                None => return Ok(None),
            }
        };

        let window = match range {
            None => body,
            Some(range) => {
                if range.offset >= metadata.size {
                    return Ok(None);
                }
                let end = range
                    .resolved_end(metadata.size)
                    .min(metadata.size.saturating_sub(1));
                if end < range.offset {
                    return Ok(None);
                }
                body.slice(range.offset as usize..=(end as usize).min(body.len() - 1))
            }
        };

        Ok(Some(ObjectRead {
            metadata,
            body: Box::pin(stream::once(async move { Ok(window) })),
        }))
    }
}

/// Derive a strong-enough ETag from file modification time and size
fn file_etag(meta: &std::fs::Metadata, size: u64) -> String {
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("\"{:x}-{:x}\"", mtime, size)
}

/// Map a file extension to a Content-Type hint
fn content_type_for(path: &str) -> Option<&'static str> {
    let ext = path.rsplit('.').next()?;
    match ext {
        "html" => Some("text/html"),
        "txt" => Some("text/plain"),
        "json" => Some("application/json"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "mp3" => Some("audio/mpeg"),
        "mp4" => Some("video/mp4"),
        "pdf" => Some("application/pdf"),
        "zip" => Some("application/zip"),
        _ => None,
    }
}
