use crate::backup::BackupCoordinator;
use crate::error::{Result, VaultError};

pub fn run_restore(coordinator: &BackupCoordinator, id: &str) -> Result<serde_json::Value> {
    let report = coordinator.run_restore(id)?;
    if let Some(reason) = &report.reason {
        tracing::warn!(id, "restore refused: {}", reason);
    }
    serde_json::to_value(&report).map_err(|e| VaultError::message(format!("encode report: {}", e)))
}
