//! Backup and restore coordination.
//!
//! [`BackupCoordinator`] serializes backup and restore behind one non-blocking
//! lock, allocates numbered backup sets under the backup root, and hands every
//! live dataset to each registered module. Module failures are folded into the
//! report; only failures of the coordinator itself surface as errors.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::dataset::{Dataset, DatasetRegistry, WriteTransaction};
use crate::error::{Result, StorageError, VaultError};
use crate::types::{request_is_empty, strip_request_path, BackupId, Operation};
use crate::util::paths::{
    delete_recursively, ensure_directory, exists_as_dir, is_safe_name, list_directory_as_report,
    next_directory_number_and_create, parse_numeric_name, subdirectory_names,
};

pub mod registry;
pub mod report;

pub use registry::{ModuleFn, ModuleHandler, ModuleRegistration, ModuleRegistry};
pub use report::{
    BackupReport, DatasetResult, DeleteReport, ListReport, ModuleResult, RestoreReport,
};

use report::now_stamp;

/// Held for the duration of a backup or restore.
struct InFlight<'a> {
    _guard: MutexGuard<'a, ()>,
    operation: Operation,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        debug!(operation = self.operation.as_str(), "lock released");
    }
}

/// Aborts the wrapped transaction unless it was committed.
struct TxnGuard<'a> {
    txn: Option<Box<dyn WriteTransaction + 'a>>,
}

impl<'a> TxnGuard<'a> {
    fn new(txn: Box<dyn WriteTransaction + 'a>) -> Self {
        Self { txn: Some(txn) }
    }

    fn commit(mut self) -> std::result::Result<(), StorageError> {
        match self.txn.take() {
            Some(txn) => txn.commit(),
            None => Ok(()),
        }
    }
}

impl Drop for TxnGuard<'_> {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            txn.abort();
        }
    }
}

pub struct BackupCoordinator {
    lock: Mutex<()>,
    datasets: Arc<dyn DatasetRegistry>,
    modules: Arc<ModuleRegistry>,
    root: PathBuf,
}

impl BackupCoordinator {
    pub fn new(
        root: PathBuf,
        datasets: Arc<dyn DatasetRegistry>,
        modules: Arc<ModuleRegistry>,
    ) -> Self {
        Self {
            lock: Mutex::new(()),
            datasets,
            modules,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    fn try_begin(&self, operation: Operation) -> Result<InFlight<'_>> {
        match self.lock.try_lock() {
            Some(guard) => {
                debug!(operation = operation.as_str(), "lock acquired");
                Ok(InFlight {
                    _guard: guard,
                    operation,
                })
            }
            None => {
                warn!(
                    operation = operation.as_str(),
                    "rejected: another backup or restore is in progress"
                );
                Err(VaultError::Busy)
            }
        }
    }

    /// Back up every live dataset, or only the one named by `dataset_filter`,
    /// into a freshly numbered backup set.
    pub fn run_backup(
        &self,
        dataset_filter: Option<&str>,
        description: Option<&str>,
    ) -> Result<BackupReport> {
        let _in_flight = self.try_begin(Operation::Backup)?;

        let backup_id = next_directory_number_and_create(&self.root)?;
        let backup_dir = self.root.join(backup_id.to_string());
        info!(backup_id, path = %backup_dir.display(), "backup started");

        let filter = if request_is_empty(dataset_filter) {
            None
        } else {
            dataset_filter.map(strip_request_path)
        };

        let mut datasets = Vec::new();
        for dataset in self.datasets.datasets() {
            let name = dataset.name();
            if filter.is_some_and(|wanted| wanted != name) {
                continue;
            }
            if !is_safe_name(name) {
                warn!(dataset = name, "dataset name cannot be used as a directory");
                datasets.push(DatasetResult::failed(
                    name,
                    format!("Dataset name unsuitable for backup: {}", name),
                ));
                continue;
            }
            datasets.push(self.backup_dataset(dataset.as_ref(), &backup_dir.join(name)));
        }
        if datasets.is_empty() {
            warn!(backup_id, filter = ?filter, "no dataset matched");
        }

        let report = BackupReport {
            backup_id,
            date: now_stamp(),
            description: description.map(str::to_string),
            datasets,
        };
        info!(
            backup_id,
            datasets = report.datasets.len(),
            complete = report.all_succeeded(),
            "backup finished"
        );
        Ok(report)
    }

    fn backup_dataset(&self, dataset: &dyn Dataset, dataset_dir: &Path) -> DatasetResult {
        let mut result = DatasetResult::new(dataset.name());
        if !ensure_directory(dataset_dir) {
            warn!(path = %dataset_dir.display(), "cannot create dataset directory");
        }
        for module in self.modules.iter() {
            let folder = dataset_dir.join(&module.key);
            let outcome = if ensure_directory(&folder) {
                invoke(&module.backup, dataset, &module.key, &folder)
            } else {
                ModuleResult::failed(
                    &folder,
                    format!("Cannot create backup directory: {}", folder.display()),
                )
            };
            result.modules.insert(module.key.clone(), outcome);
        }
        result
    }

    /// Restore every dataset present in backup set `backup_id`.
    pub fn run_restore(&self, backup_id: &str) -> Result<RestoreReport> {
        let _in_flight = self.try_begin(Operation::Restore)?;

        let requested = strip_request_path(backup_id);
        let restore_path = self.root.join(requested);
        let mut report = RestoreReport {
            restore_id: requested.to_string(),
            restore_path: restore_path.clone(),
            date: now_stamp(),
            success: None,
            reason: None,
            datasets: Vec::new(),
        };

        let names = match requested.parse::<BackupId>() {
            Ok(_) => subdirectory_names(&restore_path),
            Err(err) => {
                debug!("restore id rejected: {}", err);
                Vec::new()
            }
        };
        if names.is_empty() {
            warn!(path = %restore_path.display(), "restore path unsuitable");
            report.success = Some(false);
            report.reason = Some(format!("Restore path unsuitable: {}", restore_path.display()));
            return Ok(report);
        }

        info!(path = %restore_path.display(), datasets = names.len(), "restore started");
        for name in names {
            report.datasets.push(self.restore_dataset(&restore_path, &name));
        }
        info!(path = %restore_path.display(), "restore finished");
        Ok(report)
    }

    fn restore_dataset(&self, restore_path: &Path, name: &str) -> DatasetResult {
        let Some(dataset) = self.datasets.get(name) else {
            warn!(dataset = name, "restore skipped: dataset is not live");
            return DatasetResult::failed(name, format!("{} does not exist", name));
        };
        let Some(storage) = dataset.storage() else {
            warn!(dataset = name, "restore skipped: dataset has no storage");
            return DatasetResult::failed(name, format!("{} does not exist", name));
        };

        let txn = match storage.begin_write() {
            Ok(txn) => TxnGuard::new(txn),
            Err(err) => {
                warn!(dataset = name, "restore aborted: {}", err);
                return DatasetResult::failed(name, err.to_string());
            }
        };

        let dataset_dir = restore_path.join(name);
        let mut modules = BTreeMap::new();
        for module in self.modules.iter() {
            let folder = dataset_dir.join(&module.key);
            let outcome = if exists_as_dir(&folder) {
                invoke(&module.restore, dataset.as_ref(), &module.key, &folder)
            } else {
                ModuleResult::failed(
                    &folder,
                    format!("Restore path not found: {}", folder.display()),
                )
            };
            modules.insert(module.key.clone(), outcome);
        }

        match txn.commit() {
            Ok(()) => {
                let mut result = DatasetResult::new(name);
                result.modules = modules;
                result
            }
            Err(err) => {
                warn!(dataset = name, "restore aborted: {}", err);
                DatasetResult::failed(name, err.to_string())
            }
        }
    }

    /// Numbered backup sets under the root with their file listings.
    pub fn list_backups(&self) -> ListReport {
        let mut backups = BTreeMap::new();
        for name in subdirectory_names(&self.root) {
            if let Some(id) = parse_numeric_name(&name) {
                backups.insert(id, list_directory_as_report(&self.root.join(&name)));
            }
        }
        ListReport {
            date: now_stamp(),
            backups,
        }
    }

    // Does not take the backup/restore lock.
    pub fn delete_backup(&self, backup_id: &str) -> Result<DeleteReport> {
        let requested = strip_request_path(backup_id);
        let delete_path = self.root.join(requested);
        let mut report = DeleteReport {
            delete_id: requested.to_string(),
            delete_path: delete_path.clone(),
            date: now_stamp(),
            success: false,
            reason: None,
        };
        if requested.parse::<BackupId>().is_err() || !exists_as_dir(&delete_path) {
            report.reason = Some(format!("Backup path unsuitable: {}", delete_path.display()));
            return Ok(report);
        }
        delete_recursively(&delete_path).map_err(|e| {
            VaultError::message(format!("delete {}: {}", delete_path.display(), e))
        })?;
        info!(path = %delete_path.display(), "backup deleted");
        report.success = true;
        Ok(report)
    }
}

fn invoke(callback: &ModuleFn, dataset: &dyn Dataset, key: &str, folder: &Path) -> ModuleResult {
    match panic::catch_unwind(AssertUnwindSafe(|| callback(dataset, folder))) {
        Ok(Ok(())) => {
            debug!(dataset = dataset.name(), module = key, "module finished");
            ModuleResult::succeeded(folder, list_directory_as_report(folder))
        }
        Ok(Err(err)) => {
            warn!(dataset = dataset.name(), module = key, "module failed: {:#}", err);
            ModuleResult::failed(folder, format!("{:#}", err))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(dataset = dataset.name(), module = key, "module panicked: {}", message);
            ModuleResult::failed(folder, message)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "module panicked".to_string()
    }
}
