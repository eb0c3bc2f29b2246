use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::dataset::Dataset;
use crate::error::{Result, VaultError};
use crate::util::paths::is_safe_name;

/// Report fields a module key would collide with once results are flattened.
const RESERVED_KEYS: [&str; 3] = ["dataset-id", "success", "reason"];

/// Callback a module registers for one direction of work. Return an error to fail.
pub type ModuleFn = Arc<dyn Fn(&dyn Dataset, &Path) -> anyhow::Result<()> + Send + Sync>;

/// A module handler implemented as a type rather than a pair of closures.
pub trait ModuleHandler: Send + Sync + 'static {
    fn backup(&self, dataset: &dyn Dataset, target: &Path) -> anyhow::Result<()>;
    fn restore(&self, dataset: &dyn Dataset, source: &Path) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct ModuleRegistration {
    pub key: String,
    pub backup: ModuleFn,
    pub restore: ModuleFn,
}

impl fmt::Debug for ModuleRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistration")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

/// Modules to invoke for every dataset, in first-registration order.
#[derive(Debug, Default, Clone)]
pub struct ModuleRegistry {
    modules: Vec<ModuleRegistration>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-registering a key replaces the earlier callbacks but keeps its position.
    ///
    /// The key names the module's folder under each dataset directory and its
    /// entry in the report, so it must be a safe name and not a report field.
    pub fn register<B, R>(&mut self, key: impl Into<String>, backup: B, restore: R) -> Result<()>
    where
        B: Fn(&dyn Dataset, &Path) -> anyhow::Result<()> + Send + Sync + 'static,
        R: Fn(&dyn Dataset, &Path) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let key = key.into();
        if !is_safe_name(&key) {
            return Err(VaultError::message(format!(
                "module key {:?} is not a safe directory name",
                key
            )));
        }
        if RESERVED_KEYS.contains(&key.as_str()) {
            return Err(VaultError::message(format!("module key {} is reserved", key)));
        }
        let registration = ModuleRegistration {
            key,
            backup: Arc::new(backup),
            restore: Arc::new(restore),
        };
        match self.modules.iter_mut().find(|m| m.key == registration.key) {
            Some(existing) => *existing = registration,
            None => self.modules.push(registration),
        }
        Ok(())
    }

    pub fn register_handler<H: ModuleHandler>(
        &mut self,
        key: impl Into<String>,
        handler: H,
    ) -> Result<()> {
        let handler = Arc::new(handler);
        let for_restore = Arc::clone(&handler);
        self.register(
            key,
            move |ds: &dyn Dataset, dir: &Path| handler.backup(ds, dir),
            move |ds: &dyn Dataset, dir: &Path| for_restore.restore(ds, dir),
        )
    }

    pub fn get(&self, key: &str) -> Option<&ModuleRegistration> {
        self.modules.iter().find(|m| m.key == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.key.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleRegistration> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
