use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backup::ModuleHandler;
use crate::dataset::Dataset;
use crate::modules::OFFSET_KEY;

/// Persisted cursor of a dataset's message-queue connector.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OffsetState {
    #[serde(default)]
    pub dataset: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub topic: String,
    pub offset: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl OffsetState {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        if contents.trim().is_empty() {
            bail!("{} is empty", path.display());
        }
        serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> anyhow::Result<()> {
        let data = serde_json::to_string_pretty(self).context("encode offset state")?;
        fs::write(path, data).with_context(|| format!("write {}", path.display()))
    }
}

/// Backs up and restores the queue replay offset as `<dataset>.json`.
pub struct OffsetModule;

impl OffsetModule {
    fn state_file(dataset: &dyn Dataset) -> Option<PathBuf> {
        if !dataset.supports_module(OFFSET_KEY) {
            return None;
        }
        dataset.facet_path(OFFSET_KEY)
    }

    fn backup_file(dataset: &dyn Dataset, dir: &Path) -> PathBuf {
        dir.join(format!("{}.json", dataset.name()))
    }
}

impl ModuleHandler for OffsetModule {
    fn backup(&self, dataset: &dyn Dataset, target: &Path) -> anyhow::Result<()> {
        let Some(state_file) = Self::state_file(dataset) else {
            bail!(
                "Unable to back up queue offset as dataset {} not recognised",
                dataset.name()
            );
        };
        let destination = Self::backup_file(dataset, target);
        fs::copy(&state_file, &destination).with_context(|| {
            format!("copy {} to {}", state_file.display(), destination.display())
        })?;
        info!(dataset = dataset.name(), source = %state_file.display(), "queue offset backed up");
        Ok(())
    }

    fn restore(&self, dataset: &dyn Dataset, source: &Path) -> anyhow::Result<()> {
        let Some(state_file) = Self::state_file(dataset) else {
            bail!(
                "Unable to restore queue offset as dataset {} not recognised",
                dataset.name()
            );
        };
        let backup_file = Self::backup_file(dataset, source);
        let state = OffsetState::read(&backup_file).map_err(|err| {
            anyhow::anyhow!(
                "Unable to restore queue offset for dataset ({}) as restore file ({}) not suitable: {:#}",
                dataset.name(),
                backup_file.display(),
                err
            )
        })?;
        state.write(&state_file)?;
        info!(dataset = dataset.name(), offset = state.offset, "queue offset restored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DirectoryDataset;
    use tempfile::TempDir;

    const STATE: &str = r#"{
  "dataset" : "/matchingdataset" ,
  "endpoint" : "" ,
  "topic" : "test" ,
  "offset" : 18723
}"#;

    fn dataset_with_state(dir: &Path) -> DirectoryDataset {
        let state = dir.join("kafka.state");
        fs::write(&state, STATE).expect("write");
        DirectoryDataset::new("matchingdataset", dir.join("data")).with_offset_state(state)
    }

    #[test]
    fn backup_copies_state_file() {
        let dir = TempDir::new().expect("tempdir");
        let ds = dataset_with_state(dir.path());
        let target = dir.path().join("backup");
        fs::create_dir(&target).expect("mkdir");
        OffsetModule.backup(&ds, &target).expect("backup");
        let copied = target.join("matchingdataset.json");
        assert_eq!(OffsetState::read(&copied).expect("read").offset, 18723);
    }

    #[test]
    fn unknown_dataset_fails_both_ways() {
        let dir = TempDir::new().expect("tempdir");
        let ds = DirectoryDataset::new("missing dataset", dir.path().to_path_buf());
        let err = OffsetModule.backup(&ds, dir.path()).unwrap_err();
        assert!(err.to_string().contains("not recognised"));
        let err = OffsetModule.restore(&ds, dir.path()).unwrap_err();
        assert!(err.to_string().contains("not recognised"));
    }

    #[test]
    fn restore_requires_backup_file() {
        let dir = TempDir::new().expect("tempdir");
        let ds = dataset_with_state(dir.path());
        let source = dir.path().join("restore");
        fs::create_dir(&source).expect("mkdir");
        let err = OffsetModule.restore(&ds, &source).unwrap_err();
        assert!(err.to_string().contains("not suitable"));

        fs::write(source.join("matchingdataset.json"), "").expect("write");
        let err = OffsetModule.restore(&ds, &source).unwrap_err();
        assert!(err.to_string().contains("not suitable"));
    }

    #[test]
    fn restore_writes_offset_back() {
        let dir = TempDir::new().expect("tempdir");
        let ds = dataset_with_state(dir.path());
        let source = dir.path().join("restore");
        fs::create_dir(&source).expect("mkdir");
        fs::write(
            source.join("matchingdataset.json"),
            r#"{"dataset": "/matchingdataset", "topic": "test", "offset": 42, "partition": 0}"#,
        )
        .expect("write");

        OffsetModule.restore(&ds, &source).expect("restore");
        let state = OffsetState::read(&dir.path().join("kafka.state")).expect("read");
        assert_eq!(state.offset, 42);
        assert_eq!(state.topic, "test");
        assert_eq!(state.extra.get("partition"), Some(&serde_json::json!(0)));
    }
}
