//! Durable load/save of one opaque blob per logical store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::StoreError;

pub trait BlobStore: Send + Sync {
    /// Returns `Ok(None)` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if existing data cannot be read.
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replaces the stored blob. Readers never observe a partial write.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the blob cannot be written.
    fn save(&self, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Single JSON file on disk, replaced atomically via write-then-rename.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    path: PathBuf,
}

impl FileBlobStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_err(path: &Path, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl BlobStore for FileBlobStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_err(&self.path, e)),
        }
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Self::io_err(parent, e))?;
        }

        let tmp = self.temp_path();
        let mut file = fs::File::create(&tmp).map_err(|e| Self::io_err(&tmp, e))?;
        file.write_all(bytes).map_err(|e| Self::io_err(&tmp, e))?;
        file.sync_all().map_err(|e| Self::io_err(&tmp, e))?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| Self::io_err(&self.path, e))
    }
}

/// In-process blob, shared between clones. Used by tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    bytes: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_contents(bytes: &[u8]) -> Self {
        Self {
            bytes: Arc::new(Mutex::new(Some(bytes.to_vec()))),
        }
    }

    /// Current contents as UTF-8, if any.
    #[must_use]
    pub fn contents(&self) -> Option<String> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StoreError> {
        *self.bytes.lock().unwrap_or_else(PoisonError::into_inner) = Some(bytes.to_vec());
        Ok(())
    }
}

/// Blob whose writes always fail, for exercising the degraded persistence path.
#[cfg(test)]
pub(crate) struct FailingBlobStore;

#[cfg(test)]
impl BlobStore for FailingBlobStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(None)
    }

    fn save(&self, _bytes: &[u8]) -> Result<(), StoreError> {
        Err(StoreError::Io {
            path: "unwritable.json".to_owned(),
            source: std::io::Error::other("disk full"),
        })
    }
}
