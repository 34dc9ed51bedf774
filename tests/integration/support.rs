use lesson_catalog::schema::presets;
use lesson_catalog::{Catalog, MemoryStore, PartitionAddress};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub fn n5() -> PartitionAddress {
    PartitionAddress::new("N5")
}

pub fn memory_catalog() -> Catalog {
    Catalog::new(presets::vocabulary(), Arc::new(MemoryStore::new())).unwrap()
}

/// Write a `catalog.toml` into `workspace` and return its path.
pub fn write_config(workspace: &Path, body: &str) -> PathBuf {
    fs::create_dir_all(workspace).unwrap();
    let path = workspace.join("catalog.toml");
    fs::write(&path, body).unwrap();
    path
}

pub const MEMORY_CONFIG: &str = r#"
[store]
backend = "memory"

[logging]
enabled = false
"#;

pub const SLED_CONFIG: &str = r#"
[store]
backend = "sled"
path = "store"

[logging]
enabled = false
"#;
