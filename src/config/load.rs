use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::model::{Config, DatasetEntry, RuntimeConfig};
use crate::error::{ConfigError, Result, VaultError};
use crate::util::paths::{backup_root_fallback, ensure_directory, is_safe_name};

pub const ENV_BACKUPS_DIR: &str = "BACKUPS_DIR";

pub fn load_config(path: &Path) -> Result<RuntimeConfig> {
    let read_err =
        |e: std::io::Error| ConfigError::Read(path.display().to_string(), e.to_string());
    let mut contents = String::new();
    File::open(path)
        .map_err(read_err)?
        .read_to_string(&mut contents)
        .map_err(read_err)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<RuntimeConfig> {
    let cfg: Config =
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    parse_runtime(cfg)
}

pub fn parse_runtime(cfg: Config) -> Result<RuntimeConfig> {
    let mut datasets = Vec::new();
    let mut names = std::collections::HashSet::new();

    for ds in cfg.datasets {
        if ds.name.trim().is_empty() {
            return Err(ConfigError::Invalid("dataset name is required".to_string()).into());
        }
        if !is_safe_name(&ds.name) {
            return Err(ConfigError::Invalid(format!(
                "dataset {} name must use only letters, digits, '.', '-', '_'",
                ds.name
            ))
            .into());
        }
        if !names.insert(ds.name.clone()) {
            return Err(ConfigError::Invalid(format!("duplicate dataset name {}", ds.name)).into());
        }
        if ds.path.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("dataset {}: path is empty", ds.name)).into());
        }
        datasets.push(DatasetEntry {
            name: ds.name,
            path: PathBuf::from(ds.path),
            labels: ds.labels.filter(|p| !p.trim().is_empty()).map(PathBuf::from),
            offset_state: ds.offset_state.filter(|p| !p.trim().is_empty()).map(PathBuf::from),
        });
    }

    Ok(RuntimeConfig {
        datasets,
        backups_dir: cfg.backups_dir,
    })
}

/// First non-empty of: command line, `BACKUPS_DIR`, config file.
pub fn backup_root_setting(cli: Option<&Path>, cfg: &RuntimeConfig) -> Option<String> {
    pick_backup_root(cli, std::env::var(ENV_BACKUPS_DIR).ok(), cfg)
}

fn pick_backup_root(
    cli: Option<&Path>,
    env: Option<String>,
    cfg: &RuntimeConfig,
) -> Option<String> {
    cli.map(|p| p.to_string_lossy().to_string())
        .filter(|v| !v.trim().is_empty())
        .or_else(|| env.filter(|v| !v.trim().is_empty()))
        .or_else(|| cfg.backups_dir.clone().filter(|v| !v.trim().is_empty()))
}

/// Use the configured directory if it exists or can be created, else `<cwd>/backups`.
pub fn resolve_backup_root(configured: Option<&str>) -> Result<PathBuf> {
    resolve_backup_root_or(configured, &backup_root_fallback())
}

fn resolve_backup_root_or(configured: Option<&str>, fallback: &Path) -> Result<PathBuf> {
    if let Some(value) = configured.map(str::trim).filter(|v| !v.is_empty()) {
        let path = PathBuf::from(value);
        if ensure_directory(&path) {
            return Ok(path);
        }
        tracing::warn!(
            "backup directory {} is not usable; falling back to default",
            path.display()
        );
    }
    if !ensure_directory(fallback) {
        return Err(VaultError::message(format!(
            "create {}: cannot create default backup directory",
            fallback.display()
        )));
    }
    Ok(fallback.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn load_config_with_datasets() {
        let mut file = NamedTempFile::new().expect("tempfile");
        let yaml = r#"
backupsDir: "/var/lib/graphvault/backups"
datasets:
  - name: "knowledge"
    path: "/var/lib/graph/knowledge/tdb"
    labels: "/var/lib/graph/knowledge/labels"
    offsetState: "/var/lib/graph/knowledge.state"
  - name: "scratch"
    path: "/var/lib/graph/scratch"
"#;
        file.write_all(yaml.as_bytes()).expect("write");
        let cfg = load_config(file.path()).expect("load");
        assert_eq!(cfg.datasets.len(), 2);
        assert_eq!(cfg.backups_dir.as_deref(), Some("/var/lib/graphvault/backups"));
        assert_eq!(
            cfg.datasets[0].offset_state,
            Some(PathBuf::from("/var/lib/graph/knowledge.state"))
        );
        assert!(cfg.datasets[1].labels.is_none());
    }

    #[test]
    fn rejects_duplicate_and_unsafe_names() {
        let dup = "datasets:\n  - {name: a, path: /x}\n  - {name: a, path: /y}\n";
        assert!(matches!(
            parse_config(dup),
            Err(VaultError::Config(ConfigError::Invalid(_)))
        ));
        let unsafe_name = "datasets:\n  - {name: ../a, path: /x}\n";
        assert!(parse_config(unsafe_name).is_err());
        let no_path = "datasets:\n  - {name: a, path: ''}\n";
        assert!(parse_config(no_path).is_err());
        assert!(matches!(
            parse_config("datasets: [["),
            Err(VaultError::Config(ConfigError::Parse(_)))
        ));
    }

    #[test]
    fn resolve_uses_configured_directory() {
        let dir = TempDir::new().expect("tempdir");
        let wanted = dir.path().join("nested/backups");
        let resolved = resolve_backup_root(Some(wanted.to_string_lossy().as_ref())).expect("resolve");
        assert_eq!(resolved, wanted);
        assert!(wanted.is_dir());
    }

    #[test]
    fn resolve_falls_back_when_unusable() {
        let dir = TempDir::new().expect("tempdir");
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").expect("write");
        let fallback = dir.path().join("default/backups");
        let unusable = blocker.join("sub");
        let resolved = resolve_backup_root_or(Some(unusable.to_string_lossy().as_ref()), &fallback)
            .expect("resolve");
        assert_eq!(resolved, fallback);
        assert!(fallback.is_dir());
        assert_eq!(resolve_backup_root_or(Some("  "), &fallback).expect("resolve"), fallback);
        assert_eq!(resolve_backup_root_or(None, &fallback).expect("resolve"), fallback);
    }

    #[test]
    fn resolve_fails_when_fallback_unusable() {
        let dir = TempDir::new().expect("tempdir");
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").expect("write");
        assert!(resolve_backup_root_or(None, &blocker.join("backups")).is_err());
    }

    #[test]
    fn fallback_is_under_working_directory() {
        let cwd = std::env::current_dir().expect("cwd");
        assert_eq!(backup_root_fallback(), cwd.join("backups"));
    }

    #[test]
    fn command_line_setting_wins() {
        let cfg = RuntimeConfig {
            datasets: Vec::new(),
            backups_dir: Some("/from/file".to_string()),
        };
        assert_eq!(
            backup_root_setting(Some(Path::new("/from/cli")), &cfg).as_deref(),
            Some("/from/cli")
        );
    }

    #[test]
    fn environment_beats_config_file() {
        let cfg = RuntimeConfig {
            datasets: Vec::new(),
            backups_dir: Some("/from/file".to_string()),
        };
        let env = Some("/from/env".to_string());
        assert_eq!(
            pick_backup_root(Some(Path::new("/from/cli")), env.clone(), &cfg).as_deref(),
            Some("/from/cli")
        );
        assert_eq!(pick_backup_root(None, env, &cfg).as_deref(), Some("/from/env"));
        assert_eq!(
            pick_backup_root(None, Some("  ".to_string()), &cfg).as_deref(),
            Some("/from/file")
        );
        assert_eq!(pick_backup_root(None, None, &cfg).as_deref(), Some("/from/file"));
        assert_eq!(pick_backup_root(None, None, &RuntimeConfig::default()), None);
    }

    #[test]
    fn reads_backups_dir_from_environment() {
        let cfg = RuntimeConfig {
            datasets: Vec::new(),
            backups_dir: Some("/from/file".to_string()),
        };
        std::env::set_var(ENV_BACKUPS_DIR, "/from/env");
        let setting = backup_root_setting(None, &cfg);
        std::env::remove_var(ENV_BACKUPS_DIR);
        assert_eq!(setting.as_deref(), Some("/from/env"));
    }

    #[test]
    fn unreadable_config_is_a_config_error() {
        let dir = TempDir::new().expect("tempdir");
        assert!(matches!(
            load_config(&dir.path().join("absent.yaml")),
            Err(VaultError::Config(ConfigError::Read(_, _)))
        ));
        assert!(matches!(
            load_config(dir.path()),
            Err(VaultError::Config(ConfigError::Read(_, _)))
        ));
    }
}
