mod document;
mod settings;

pub use document::{deep_merge, Document, UserProfile};
pub use settings::{Settings, Theme};

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{Local, NaiveDateTime};

use crate::error::StorageError;

const DATA_FILE: &str = "focusflick_data.json";

/// Returns `~/.config/focusflick[-dev]/` based on FOCUSFLICK_ENV.
///
/// Set FOCUSFLICK_ENV=dev to use development data directory.
/// Set FOCUSFLICK_HOME to use an explicit directory instead.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("FOCUSFLICK_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSFLICK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusflick-dev")
            } else {
                base_dir.join("focusflick")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| StorageError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// Load/save collaborator for the document.
pub trait Storage {
    /// Read and merge the stored document.
    ///
    /// # Errors
    /// Fails when the stored data exists but cannot be read or parsed. A
    /// missing document is not an error.
    fn try_load(&self, now: NaiveDateTime) -> Result<Document, StorageError>;

    /// # Errors
    /// Fails when the document cannot be written.
    fn save(&self, doc: &Document) -> Result<(), StorageError>;

    /// Like [`try_load`](Storage::try_load), but falls back to defaults.
    fn load(&self, now: NaiveDateTime) -> Document {
        match self.try_load(now) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load data, using defaults");
                Document::new(now)
            }
        }
    }
}

/// Document stored as pretty-printed JSON on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `data_dir()/focusflick_data.json`.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self::new(data_dir()?.join(DATA_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for JsonFileStore {
    fn try_load(&self, now: NaiveDateTime) -> Result<Document, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no data file yet");
                return Ok(Document::new(now));
            }
            Err(e) => {
                return Err(StorageError::LoadFailed {
                    path: self.path.clone(),
                    message: e.to_string(),
                })
            }
        };
        read_document(&content, now)
    }

    fn save(&self, doc: &Document) -> Result<(), StorageError> {
        write_document(&self.path, doc)
    }
}

/// Parse a serialized document and merge it over the defaults.
///
/// # Errors
/// Fails when the text is not JSON or the root is not an object.
pub fn read_document(content: &str, now: NaiveDateTime) -> Result<Document, StorageError> {
    let raw: serde_json::Value =
        serde_json::from_str(content).map_err(|e| StorageError::ParseFailed(e.to_string()))?;
    Document::from_json(raw, now)
}

/// Write `doc` to `path` through a sibling temporary file so a crash never
/// leaves a half-written document behind.
///
/// # Errors
/// Fails when serialization, the write or the rename fails.
pub fn write_document(path: &Path, doc: &Document) -> Result<(), StorageError> {
    let save_failed = |message: String| StorageError::SaveFailed {
        path: path.to_path_buf(),
        message,
    };
    let content = serde_json::to_string_pretty(doc).map_err(|e| save_failed(e.to_string()))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content).map_err(|e| save_failed(e.to_string()))?;
    std::fs::rename(&tmp, path).map_err(|e| save_failed(e.to_string()))?;
    Ok(())
}

/// In-memory store, mainly for tests. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved document as JSON text.
    pub fn contents(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    pub fn set_contents(&self, json: impl Into<String>) {
        *self.slot.borrow_mut() = Some(json.into());
    }
}

impl Storage for MemoryStore {
    fn try_load(&self, now: NaiveDateTime) -> Result<Document, StorageError> {
        match self.slot.borrow().as_deref() {
            Some(content) => read_document(content, now),
            None => Ok(Document::new(now)),
        }
    }

    fn save(&self, doc: &Document) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(doc)
            .map_err(|e| StorageError::ParseFailed(e.to_string()))?;
        *self.slot.borrow_mut() = Some(content);
        Ok(())
    }
}

/// Local wall-clock now, for callers that have no [`Clock`](crate::Clock).
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
