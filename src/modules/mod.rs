//! Handlers for the facets every graph dataset carries.

use crate::backup::ModuleRegistry;
use crate::error::Result;

pub mod offset;
pub mod tree;

pub use offset::{OffsetModule, OffsetState};
pub use tree::TreeCopyModule;

pub const TDB_KEY: &str = "tdb";
pub const LABELS_KEY: &str = "labels";
pub const OFFSET_KEY: &str = "kafka";

pub fn register_builtin(registry: &mut ModuleRegistry) -> Result<()> {
    registry.register_handler(TDB_KEY, TreeCopyModule::new(TDB_KEY))?;
    registry.register_handler(LABELS_KEY, TreeCopyModule::new(LABELS_KEY))?;
    registry.register_handler(OFFSET_KEY, OffsetModule)
}
