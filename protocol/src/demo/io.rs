//! # File In, File Out
//!
//! The browser demo read from a file picker and wrote through a synthesized
//! download link. Here the input is a [`SelectedFile`] (bytes plus a name)
//! and the output is anything implementing [`DownloadSink`].
//!
//! [`DirectorySink`] writes to `<name>.part` first and renames into place,
//! removing the partial file if anything fails. That is the counterpart of
//! revoking the temporary object URL once the browser has taken the bytes.
//! Delivery runs inside the async purchase, so sinks do their I/O through
//! `tokio::fs`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

/// A file the user picked, held entirely in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a whole file from disk. The name is the final path component.
    pub async fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Where a delivered file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub file_name: String,
    pub bytes: usize,
    /// Filesystem location, for sinks that have one.
    pub location: Option<PathBuf>,
}

/// Receives the decrypted file at the end of a purchase.
#[async_trait]
pub trait DownloadSink: Send {
    async fn deliver(&mut self, file_name: &str, contents: &[u8]) -> io::Result<DeliveryReceipt>;
}

/// Collects deliveries in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub deliveries: Vec<(String, Vec<u8>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&(String, Vec<u8>)> {
        self.deliveries.last()
    }
}

#[async_trait]
impl DownloadSink for MemorySink {
    async fn deliver(&mut self, file_name: &str, contents: &[u8]) -> io::Result<DeliveryReceipt> {
        self.deliveries
            .push((file_name.to_string(), contents.to_vec()));
        Ok(DeliveryReceipt {
            file_name: file_name.to_string(),
            bytes: contents.len(),
            location: None,
        })
    }
}

/// Saves deliveries into a directory, never overwriting an existing file.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Pick a free path for `file_name` in the target directory, adding
    /// ` (1)`, ` (2)`, ... before the extension on collision.
    async fn free_path(&self, file_name: &str) -> io::Result<PathBuf> {
        // Only the last component: a stored name must not escape the directory.
        let safe = Path::new(file_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "download.bin".to_string());

        let candidate = self.dir.join(&safe);
        if !tokio::fs::try_exists(&candidate).await? {
            return Ok(candidate);
        }

        let path = Path::new(&safe);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut n = 1u32;
        loop {
            let candidate = self.dir.join(format!("{stem} ({n}){ext}"));
            if !tokio::fs::try_exists(&candidate).await? {
                return Ok(candidate);
            }
            n += 1;
        }
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn deliver(&mut self, file_name: &str, contents: &[u8]) -> io::Result<DeliveryReceipt> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let target = self.free_path(file_name).await?;
        let mut partial = target.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        let written = match tokio::fs::write(&partial, contents).await {
            Ok(()) => tokio::fs::rename(&partial, &target).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }

        debug!(path = %target.display(), bytes = contents.len(), "download saved");
        Ok(DeliveryReceipt {
            file_name: file_name.to_string(),
            bytes: contents.len(),
            location: Some(target),
        })
    }
}
