use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

pub fn now_stamp() -> String {
    Local::now().format(DATE_TIME_FORMAT).to_string()
}

/// Outcome of one module for one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub folder: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
}

impl ModuleResult {
    pub fn succeeded(folder: &Path, files: Vec<String>) -> Self {
        Self {
            success: true,
            reason: None,
            folder: folder.to_path_buf(),
            files: Some(files),
        }
    }

    pub fn failed(folder: &Path, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: Some(reason.into()),
            folder: folder.to_path_buf(),
            files: None,
        }
    }
}

/// Per-dataset results; module entries sit beside `dataset-id` when serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetResult {
    #[serde(rename = "dataset-id")]
    pub dataset_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub modules: BTreeMap<String, ModuleResult>,
}

impl DatasetResult {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            success: None,
            reason: None,
            modules: BTreeMap::new(),
        }
    }

    /// A dataset-level failure carries no module detail.
    pub fn failed(dataset_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            success: Some(false),
            reason: Some(reason.into()),
            modules: BTreeMap::new(),
        }
    }

    pub fn module(&self, key: &str) -> Option<&ModuleResult> {
        self.modules.get(key)
    }

    pub fn all_succeeded(&self) -> bool {
        self.success != Some(false) && self.modules.values().all(|m| m.success)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    #[serde(rename = "backup-id")]
    pub backup_id: u64,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub datasets: Vec<DatasetResult>,
}

impl BackupReport {
    pub fn dataset(&self, name: &str) -> Option<&DatasetResult> {
        self.datasets.iter().find(|d| d.dataset_id == name)
    }

    pub fn all_succeeded(&self) -> bool {
        self.datasets.iter().all(DatasetResult::all_succeeded)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    #[serde(rename = "restore-id")]
    pub restore_id: String,
    #[serde(rename = "restorePath")]
    pub restore_path: PathBuf,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub datasets: Vec<DatasetResult>,
}

impl RestoreReport {
    pub fn dataset(&self, name: &str) -> Option<&DatasetResult> {
        self.datasets.iter().find(|d| d.dataset_id == name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListReport {
    pub date: String,
    /// Keyed by backup number so the listing comes out in numeric order.
    pub backups: BTreeMap<u64, Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteReport {
    #[serde(rename = "delete-id")]
    pub delete_id: String,
    #[serde(rename = "deletePath")]
    pub delete_path: PathBuf,
    pub date: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
