use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, MutexGuard};

use crate::dataset::{Dataset, Storage, WriteTransaction};
use crate::error::StorageError;
use crate::modules::{LABELS_KEY, OFFSET_KEY, TDB_KEY};

/// A dataset whose facets are plain paths on the local filesystem.
pub struct DirectoryDataset {
    name: String,
    data_dir: PathBuf,
    labels_dir: Option<PathBuf>,
    offset_state: Option<PathBuf>,
    storage: DirectoryStorage,
}

impl DirectoryDataset {
    pub fn new(name: impl Into<String>, data_dir: PathBuf) -> Self {
        let name = name.into();
        Self {
            storage: DirectoryStorage::new(&name),
            name,
            data_dir,
            labels_dir: None,
            offset_state: None,
        }
    }

    pub fn with_labels(mut self, labels_dir: PathBuf) -> Self {
        self.labels_dir = Some(labels_dir);
        self
    }

    pub fn with_offset_state(mut self, state_file: PathBuf) -> Self {
        self.offset_state = Some(state_file);
        self
    }

    /// Number of committed write transactions.
    pub fn generation(&self) -> u64 {
        self.storage.generation.load(Ordering::SeqCst)
    }
}

impl Dataset for DirectoryDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn facet_path(&self, key: &str) -> Option<PathBuf> {
        match key {
            TDB_KEY => Some(self.data_dir.clone()),
            LABELS_KEY => self.labels_dir.clone(),
            OFFSET_KEY => self.offset_state.clone(),
            _ => None,
        }
    }

    fn storage(&self) -> Option<&dyn Storage> {
        Some(&self.storage)
    }
}

struct DirectoryStorage {
    name: String,
    write_lock: Mutex<()>,
    generation: AtomicU64,
}

impl DirectoryStorage {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            write_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }
}

impl Storage for DirectoryStorage {
    fn begin_write(&self) -> Result<Box<dyn WriteTransaction + '_>, StorageError> {
        let guard = self.write_lock.lock();
        tracing::debug!(dataset = %self.name, "write transaction started");
        Ok(Box::new(DirectoryTransaction {
            storage: self,
            _guard: guard,
        }))
    }
}

struct DirectoryTransaction<'a> {
    storage: &'a DirectoryStorage,
    _guard: MutexGuard<'a, ()>,
}

impl WriteTransaction for DirectoryTransaction<'_> {
    fn commit(self: Box<Self>) -> Result<(), StorageError> {
        let generation = self.storage.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(dataset = %self.storage.name, generation, "write transaction committed");
        Ok(())
    }

    fn abort(self: Box<Self>) {
        tracing::warn!(dataset = %self.storage.name, "write transaction aborted");
    }
}
