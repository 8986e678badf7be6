// apps/storefront/src/persistence/kv.rs

use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MirrorError {
  #[error("storage I/O failed: {0}")]
  Io(#[from] std::io::Error),

  #[error("stored value is not valid JSON: {0}")]
  Encoding(#[from] serde_json::Error),

  #[error("storage unavailable: {0}")]
  Unavailable(String),
}

/// String key-value storage. Every operation may fail.
pub trait KeyValueStore: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<String>, MirrorError>;
  fn set(&self, key: &str, value: &str) -> Result<(), MirrorError>;
  fn remove(&self, key: &str) -> Result<(), MirrorError>;
}

#[derive(Default)]
pub struct MemoryKv {
  entries: RwLock<HashMap<String, String>>,
  read_only: AtomicBool,
}

impl MemoryKv {
  pub fn new() -> Self {
    Self::default()
  }

  /// Rejects writes while set, like a full or disabled browser storage.
  pub fn set_read_only(&self, read_only: bool) {
    self.read_only.store(read_only, Ordering::SeqCst);
  }

  fn check_writable(&self) -> Result<(), MirrorError> {
    if self.read_only.load(Ordering::SeqCst) {
      return Err(MirrorError::Unavailable("storage is read-only".to_string()));
    }
    Ok(())
  }
}

impl KeyValueStore for MemoryKv {
  fn get(&self, key: &str) -> Result<Option<String>, MirrorError> {
    Ok(self.entries.read().get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), MirrorError> {
    self.check_writable()?;
    self.entries.write().insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), MirrorError> {
    self.check_writable()?;
    self.entries.write().remove(key);
    Ok(())
  }
}

/// One file per key under a directory.
pub struct FileKv {
  dir: PathBuf,
}

impl FileKv {
  pub fn open(dir: impl AsRef<Path>) -> Result<Self, MirrorError> {
    std::fs::create_dir_all(dir.as_ref())?;
    Ok(Self {
      dir: dir.as_ref().to_path_buf(),
    })
  }

  fn path_for(&self, key: &str) -> PathBuf {
    let file_name: String = key
      .chars()
      .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
      .collect();
    self.dir.join(format!("{}.json", file_name))
  }
}

impl KeyValueStore for FileKv {
  fn get(&self, key: &str) -> Result<Option<String>, MirrorError> {
    match std::fs::read_to_string(self.path_for(key)) {
      Ok(contents) => Ok(Some(contents)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  fn set(&self, key: &str, value: &str) -> Result<(), MirrorError> {
    let path = self.path_for(key);
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, value)?;
    std::fs::rename(&tmp, &path)?;
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), MirrorError> {
    match std::fs::remove_file(self.path_for(key)) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e.into()),
    }
  }
}
