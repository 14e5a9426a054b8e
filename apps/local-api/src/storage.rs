//! Local document store — owns the single persisted key-value entry holding
//! the serialized `{ user, resumes }` document. Reads and writes are
//! synchronous by contract; the normalizer runs on every load.

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{debug, info};

use crate::errors::AppError;
use crate::models::Document;
use crate::schema;

/// Raw string storage for the single document entry. Implementations must be
/// synchronous — a repository operation never suspends mid-cycle.
pub trait StorageBackend: Send + Sync {
    fn read(&self) -> Result<Option<String>, AppError>;
    fn write(&self, raw: &str) -> Result<(), AppError>;
    fn remove(&self) -> Result<(), AppError>;
}

/// File-backed storage, one JSON file per document.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStorage { path: path.into() }
    }
}

impl StorageBackend for FileStorage {
    fn read(&self) -> Result<Option<String>, AppError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, raw: &str) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, raw)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), AppError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory storage for isolated test instances.
#[derive(Default)]
pub struct MemoryStorage {
    value: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }
}

impl StorageBackend for MemoryStorage {
    fn read(&self) -> Result<Option<String>, AppError> {
        Ok(self.value.lock().expect("storage mutex poisoned").clone())
    }

    fn write(&self, raw: &str) -> Result<(), AppError> {
        *self.value.lock().expect("storage mutex poisoned") = Some(raw.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), AppError> {
        *self.value.lock().expect("storage mutex poisoned") = None;
        Ok(())
    }
}

pub struct DocumentStore {
    backend: Box<dyn StorageBackend>,
}

impl DocumentStore {
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        DocumentStore { backend }
    }

    pub fn in_memory() -> Self {
        DocumentStore::new(Box::new(MemoryStorage::new()))
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        DocumentStore::new(Box::new(FileStorage::new(path)))
    }

    /// Loads the document, normalizing on every load. Seeds a default user
    /// (and persists the seed) when no stored value exists; recovers to the
    /// empty document when the stored value fails to parse.
    pub fn load(&self) -> Result<Document, AppError> {
        match self.backend.read()? {
            Some(raw) => Ok(schema::normalize(&raw)),
            None => {
                let doc = Document::seeded();
                self.save(&doc)?;
                info!("seeded local document store with default user");
                Ok(doc)
            }
        }
    }

    pub fn save(&self, doc: &Document) -> Result<(), AppError> {
        let raw = serde_json::to_string(doc)?;
        self.backend.write(&raw)?;
        debug!(resumes = doc.resumes.len(), "persisted document");
        Ok(())
    }

    /// Erases the document entirely; the next read reseeds defaults.
    pub fn clear(&self) -> Result<(), AppError> {
        self.backend.remove()?;
        info!("cleared local document store");
        Ok(())
    }

    /// Manual fix-up routine: re-applies the normalizer to data written by
    /// older versions and writes the repaired document back. Same code path
    /// as load-time normalization.
    pub fn repair(&self) -> Result<(), AppError> {
        let doc = self.load()?;
        self.save(&doc)?;
        info!("repaired stored document");
        Ok(())
    }
}
