use std::path::Path;

use anyhow::{bail, Context};
use tracing::info;

use crate::backup::ModuleHandler;
use crate::dataset::Dataset;
use crate::util::paths::{clear_directory, copy_tree, exists_as_dir};

/// Copies a directory facet (bulk store, label index) in and out of a backup set.
pub struct TreeCopyModule {
    key: &'static str,
}

impl TreeCopyModule {
    pub fn new(key: &'static str) -> Self {
        Self { key }
    }
}

impl ModuleHandler for TreeCopyModule {
    fn backup(&self, dataset: &dyn Dataset, target: &Path) -> anyhow::Result<()> {
        let source = match dataset.facet_path(self.key) {
            Some(path) if dataset.supports_module(self.key) => path,
            _ => bail!("No {} store to back up", self.key),
        };
        if !exists_as_dir(&source) {
            bail!("{} store not found: {}", self.key, source.display());
        }
        let copied = copy_tree(&source, target)
            .with_context(|| format!("copy {} to {}", source.display(), target.display()))?;
        info!(dataset = dataset.name(), module = self.key, files = copied, "facet backed up");
        Ok(())
    }

    fn restore(&self, dataset: &dyn Dataset, source: &Path) -> anyhow::Result<()> {
        let dest = match dataset.facet_path(self.key) {
            Some(path) if dataset.supports_module(self.key) => path,
            _ => bail!("No {} store to restore", self.key),
        };
        if !exists_as_dir(source) {
            bail!("Restore directory not found: {}", source.display());
        }
        clear_directory(&dest).with_context(|| format!("clear {}", dest.display()))?;
        let copied = copy_tree(source, &dest)
            .with_context(|| format!("copy {} to {}", source.display(), dest.display()))?;
        info!(dataset = dataset.name(), module = self.key, files = copied, "facet restored");
        Ok(())
    }
}
