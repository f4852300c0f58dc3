use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tempfile::NamedTempFile;

use crate::error::Error;

/// String key/value storage with `localStorage` semantics.
///
/// Each call is atomic on its own key; there are no multi-key transactions.
pub trait KeyValueStorage: Send + Sync + 'static {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), Error>;
    fn remove_item(&self, key: &str) -> Result<(), Error>;
}

/// In-process storage. Lives as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every key, like wiping browser storage.
    pub fn wipe(&self) {
        self.items.lock().clear();
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        self.items.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), Error> {
        self.items.lock().remove(key);
        Ok(())
    }
}

/// Storage persisted as one JSON object in a file.
///
/// Writes go to a uniquely named temp file in the same directory which is
/// then renamed over the target, so a crash never leaves a half-written file
/// behind.
///
/// Updates are serialized per instance only. Use one `FileStorage` per path
/// (share it through an `Arc`); two instances on the same file can lose each
/// other's writes.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, Error> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(Error::Store(format!("{}: {e}", self.path.display()))),
        };
        match serde_json::from_slice(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Storage file is corrupt, starting empty");
                Ok(HashMap::new())
            }
        }
    }

    fn write_all(&self, items: &HashMap<String, String>) -> Result<(), Error> {
        let store_err = |e: std::io::Error| Error::Store(format!("{}: {e}", self.path.display()));
        let raw = serde_json::to_vec(items).map_err(|e| Error::Store(e.to_string()))?;
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir).map_err(store_err)?;
        tmp.write_all(&raw).map_err(store_err)?;
        tmp.persist(&self.path).map_err(|e| store_err(e.error))?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, Error> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), Error> {
        let _guard = self.lock.lock();
        let mut items = self.read_all()?;
        items.insert(key.to_owned(), value.to_owned());
        self.write_all(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), Error> {
        let _guard = self.lock.lock();
        let mut items = self.read_all()?;
        if items.remove(key).is_some() {
            self.write_all(&items)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_roundtrip_and_wipe() {
        let storage = MemoryStorage::new();
        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
        storage.wipe();
        assert_eq!(storage.get_item("k").unwrap(), None);
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");

        FileStorage::new(&path).set_item("device_id", "01ABC").unwrap();
        let reopened = FileStorage::new(&path);

        assert_eq!(reopened.get_item("device_id").unwrap().as_deref(), Some("01ABC"));
    }

    #[test]
    fn file_storage_remove_missing_key_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("storage.json"));

        storage.remove_item("nothing").unwrap();
        assert!(!storage.path().exists());
    }

    #[test]
    fn writes_leave_no_temp_files_behind() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("storage.json"));

        storage.set_item("a", "1").unwrap();
        storage.set_item("b", "2").unwrap();
        storage.remove_item("a").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("storage.json")]);
        assert_eq!(storage.get_item("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn shared_instance_keeps_concurrent_writes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = std::sync::Arc::new(FileStorage::new(dir.path().join("storage.json")));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let storage = storage.clone();
                std::thread::spawn(move || storage.set_item(&format!("k{i}"), "v").unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for i in 0..8 {
            assert_eq!(storage.get_item(&format!("k{i}")).unwrap().as_deref(), Some("v"));
        }
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, b"{not json").unwrap();

        let storage = FileStorage::new(&path);
        assert_eq!(storage.get_item("anything").unwrap(), None);
        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));
    }
}
