pub mod create;
pub mod delete;
pub mod list;
pub mod restore;

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::backup::{BackupCoordinator, ModuleRegistry};
use crate::config::{backup_root_setting, load_config, resolve_backup_root, RuntimeConfig};
use crate::dataset::{DirectoryDataset, LiveDatasets};
use crate::error::{Result, VaultError};
use crate::modules::register_builtin;

const CONFIG_FILE: &str = "/etc/graphvault.yaml";

pub fn build_coordinator(
    config_path: Option<&Path>,
    backups_dir: Option<&Path>,
) -> Result<BackupCoordinator> {
    let cfg = match config_path {
        Some(path) => load_config(path)?,
        None if Path::new(CONFIG_FILE).exists() => load_config(Path::new(CONFIG_FILE))?,
        None => {
            tracing::warn!("no config at {}; no datasets are live", CONFIG_FILE);
            RuntimeConfig::default()
        }
    };
    let root = resolve_backup_root(backup_root_setting(backups_dir, &cfg).as_deref())?;

    let live = LiveDatasets::new();
    for entry in cfg.datasets {
        let mut dataset = DirectoryDataset::new(entry.name, entry.path);
        if let Some(labels) = entry.labels {
            dataset = dataset.with_labels(labels);
        }
        if let Some(state) = entry.offset_state {
            dataset = dataset.with_offset_state(state);
        }
        live.insert(Arc::new(dataset));
    }

    let mut modules = ModuleRegistry::new();
    register_builtin(&mut modules)?;

    tracing::debug!(
        root = %root.display(),
        datasets = live.len(),
        modules = modules.len(),
        "coordinator ready"
    );
    Ok(BackupCoordinator::new(root, Arc::new(live), Arc::new(modules)))
}

pub fn error_body(err: &VaultError) -> serde_json::Value {
    json!({ "error": err.to_string() })
}

pub fn exit_code(err: &VaultError) -> i32 {
    match err {
        VaultError::Busy => 3,
        VaultError::Config(_) => 2,
        _ => 1,
    }
}

pub fn exit_for_error(err: &VaultError) -> ! {
    println!("{}", error_body(err));
    std::process::exit(exit_code(err));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::CreateArgs;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path) -> std::path::PathBuf {
        let data = dir.join("graph/ds1");
        let labels = dir.join("graph/ds1-labels");
        fs::create_dir_all(&data).expect("mkdir");
        fs::create_dir_all(&labels).expect("mkdir");
        fs::write(data.join("nodes.dat"), b"nodes").expect("write");
        fs::write(labels.join("labels.sst"), b"labels").expect("write");
        let state = dir.join("graph/ds1.state");
        fs::write(&state, r#"{"dataset": "/ds1", "topic": "t", "offset": 5}"#).expect("write");
        let cfg = format!(
            "datasets:\n  - name: ds1\n    path: {}\n    labels: {}\n    offsetState: {}\n",
            data.display(),
            labels.display(),
            state.display()
        );
        let path = dir.join("graphvault.yaml");
        fs::write(&path, cfg).expect("write");
        path
    }

    #[test]
    fn create_list_restore_delete_through_commands() {
        let dir = TempDir::new().expect("tempdir");
        let config = write_config(dir.path());
        let backups = dir.path().join("backups");
        let coord = build_coordinator(Some(config.as_path()), Some(backups.as_path())).expect("build");
        assert_eq!(coord.root(), backups.as_path());

        let created = create::run_create(&coord, &CreateArgs::default()).expect("create");
        assert_eq!(created["backup-id"], 1);
        let ds1 = &created["datasets"][0];
        assert_eq!(ds1["dataset-id"], "ds1");
        assert_eq!(ds1["tdb"]["files"], json!(["nodes.dat"]));
        assert_eq!(ds1["labels"]["files"], json!(["labels.sst"]));
        assert_eq!(ds1["kafka"]["files"], json!(["ds1.json"]));

        let listed = list::run_list(&coord);
        assert_eq!(listed["backups"]["1"].as_array().expect("array").len(), 3);

        fs::write(dir.path().join("graph/ds1/nodes.dat"), b"changed").expect("write");
        let restored = restore::run_restore(&coord, "1").expect("restore");
        assert_eq!(restored["datasets"][0]["tdb"]["success"], true);
        assert_eq!(
            fs::read(dir.path().join("graph/ds1/nodes.dat")).expect("read"),
            b"nodes"
        );

        let deleted = delete::run_delete(&coord, "1").expect("delete");
        assert_eq!(deleted["success"], true);
        let deleted = delete::run_delete(&coord, "1").expect("delete");
        assert_eq!(deleted["success"], false);
    }

    #[test]
    fn missing_config_file_exits_as_config_error() {
        let dir = TempDir::new().expect("tempdir");
        let missing = dir.path().join("absent.yaml");
        let err = match build_coordinator(Some(missing.as_path()), Some(dir.path())) {
            Err(err) => err,
            Ok(_) => panic!("missing config accepted"),
        };
        assert!(matches!(err, VaultError::Config(_)));
        assert_eq!(exit_code(&err), 2);
        assert!(error_body(&err)["error"]
            .as_str()
            .expect("message")
            .contains("absent.yaml"));
    }

    #[test]
    fn exit_codes() {
        assert_eq!(exit_code(&VaultError::Busy), 3);
        assert_eq!(exit_code(&VaultError::message("boom")), 1);
    }

    #[test]
    fn busy_error_body() {
        let body = error_body(&VaultError::Busy);
        assert_eq!(
            body["error"],
            "Another conflicting operation is already in progress. Please try again later."
        );
    }
}
