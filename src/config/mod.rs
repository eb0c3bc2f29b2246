pub mod load;
pub mod model;

pub use load::{backup_root_setting, load_config, resolve_backup_root, ENV_BACKUPS_DIR};
pub use model::{Config, DatasetConfig, DatasetEntry, RuntimeConfig};
