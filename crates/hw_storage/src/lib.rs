use std::path::Path;
use std::sync::Arc;

use hw_core::{CheckpointStore, Error, Result};

pub mod backends;

pub use backends::json::JsonFileStore;
pub use backends::memory::MemoryStore;

/// Builds the checkpoint store named on the command line.
pub fn create_store(kind: &str, path: &Path) -> Result<Arc<dyn CheckpointStore>> {
    match kind {
        "json" => Ok(Arc::new(JsonFileStore::new(path))),
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => Err(Error::Configuration(format!(
            "Unknown storage backend: {other} (expected json or memory)"
        ))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_store;
}
