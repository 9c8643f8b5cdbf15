use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{Storage, StorageError};

/// Storage file name in the data directory
pub const STORAGE_FILE: &str = "storage.json";

/// Storage kept as one JSON object on disk.
///
/// The whole document is rewritten on every change, via a temporary file
/// and a rename so a crash never leaves a truncated document behind.
pub struct FileStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open the store at `path`. A missing file is an empty store; an
    /// unreadable document is discarded with a warning.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let items = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            match serde_json::from_str(&contents) {
                Ok(items) => items,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Discarding unreadable storage file");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = items.len(), "Storage opened");
        Ok(Self { path, items })
    }

    /// Open `storage.json` inside `dir`
    pub fn in_dir(dir: &Path) -> Result<Self, StorageError> {
        Self::open(dir.join(STORAGE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.items)?;
        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, contents.as_bytes())?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Write `contents` to `path`, readable by the owner only on unix
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file: File = options.open(path)?;
    // `mode` only applies on creation; a leftover temp file keeps its old bits
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents)?;
    file.sync_all()
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let previous = self.items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush() {
            // Keep memory matching what is on disk
            match previous {
                Some(old) => self.items.insert(key.to_string(), old),
                None => self.items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        let Some(previous) = self.items.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush() {
            self.items.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }
}
