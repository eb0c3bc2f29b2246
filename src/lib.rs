pub mod backup;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod modules;
pub mod types;
pub mod util;

pub use backup::{
    BackupCoordinator, BackupReport, DatasetResult, DeleteReport, ListReport, ModuleHandler,
    ModuleRegistry, ModuleResult, RestoreReport,
};
pub use dataset::{Dataset, DatasetRegistry, DirectoryDataset, LiveDatasets, Storage, WriteTransaction};
pub use error::{Result, VaultError};
