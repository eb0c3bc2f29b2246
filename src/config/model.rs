use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default, rename = "backupsDir", skip_serializing_if = "Option::is_none")]
    pub backups_dir: Option<String>,
    #[serde(default)]
    pub datasets: Vec<DatasetConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatasetConfig {
    pub name: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    #[serde(default, rename = "offsetState", skip_serializing_if = "Option::is_none")]
    pub offset_state: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DatasetEntry {
    pub name: String,
    pub path: PathBuf,
    pub labels: Option<PathBuf>,
    pub offset_state: Option<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub datasets: Vec<DatasetEntry>,
    pub backups_dir: Option<String>,
}
