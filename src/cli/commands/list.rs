use serde_json::json;

use crate::backup::BackupCoordinator;

pub fn run_list(coordinator: &BackupCoordinator) -> serde_json::Value {
    let report = coordinator.list_backups();
    serde_json::to_value(&report).unwrap_or_else(|e| json!({ "error": e.to_string() }))
}
