use crate::backup::BackupCoordinator;
use crate::cli::args::CreateArgs;
use crate::error::{Result, VaultError};

pub fn run_create(coordinator: &BackupCoordinator, args: &CreateArgs) -> Result<serde_json::Value> {
    let report = coordinator.run_backup(args.dataset.as_deref(), args.description.as_deref())?;
    for dataset in &report.datasets {
        for (key, module) in &dataset.modules {
            if !module.success {
                tracing::warn!(
                    backup_id = report.backup_id,
                    dataset = %dataset.dataset_id,
                    module = %key,
                    "module failed: {}",
                    module.reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }
    serde_json::to_value(&report).map_err(|e| VaultError::message(format!("encode report: {}", e)))
}
