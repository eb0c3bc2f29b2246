use crate::backup::BackupCoordinator;
use crate::error::{Result, VaultError};

pub fn run_delete(coordinator: &BackupCoordinator, id: &str) -> Result<serde_json::Value> {
    let report = coordinator.delete_backup(id)?;
    serde_json::to_value(&report).map_err(|e| VaultError::message(format!("encode report: {}", e)))
}
