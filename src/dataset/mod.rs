//! Live datasets as the coordinator sees them.
//!
//! A dataset exposes its name, which modules it can take part in, where each
//! facet lives, and a storage handle able to open write transactions. The
//! coordinator never looks past these traits.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::StorageError;

pub mod directory;

pub use directory::DirectoryDataset;

pub trait Dataset: Send + Sync {
    fn name(&self) -> &str;

    /// Location of the facet a module with this key owns, if the dataset has one.
    fn facet_path(&self, key: &str) -> Option<PathBuf>;

    fn supports_module(&self, key: &str) -> bool {
        self.facet_path(key).is_some()
    }

    /// `None` when the dataset has no usable storage; restore refuses such datasets.
    fn storage(&self) -> Option<&dyn Storage>;
}

pub trait Storage: Send + Sync {
    fn begin_write(&self) -> Result<Box<dyn WriteTransaction + '_>, StorageError>;
}

pub trait WriteTransaction {
    fn commit(self: Box<Self>) -> Result<(), StorageError>;
    fn abort(self: Box<Self>);
}

pub trait DatasetRegistry: Send + Sync {
    fn datasets(&self) -> Vec<Arc<dyn Dataset>>;

    fn get(&self, name: &str) -> Option<Arc<dyn Dataset>> {
        self.datasets().into_iter().find(|ds| ds.name() == name)
    }
}

/// In-memory registry of the datasets currently served.
#[derive(Default)]
pub struct LiveDatasets {
    inner: RwLock<Vec<Arc<dyn Dataset>>>,
}

impl LiveDatasets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the dataset with the same name.
    pub fn insert(&self, dataset: Arc<dyn Dataset>) {
        let mut datasets = self.inner.write();
        match datasets.iter().position(|ds| ds.name() == dataset.name()) {
            Some(idx) => datasets[idx] = dataset,
            None => datasets.push(dataset),
        }
    }

    pub fn remove(&self, name: &str) -> Option<Arc<dyn Dataset>> {
        let mut datasets = self.inner.write();
        let idx = datasets.iter().position(|ds| ds.name() == name)?;
        Some(datasets.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl DatasetRegistry for LiveDatasets {
    fn datasets(&self) -> Vec<Arc<dyn Dataset>> {
        self.inner.read().clone()
    }
}
