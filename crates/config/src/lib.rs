pub mod schema;
pub mod store;

pub use schema::{keys, ConfigSchema, SchemaEntry, Theme, Validator};
pub use store::{ConfigChange, ConfigStore};

use std::path::PathBuf;

/// Directory name shared with the external tool's packaging.
pub const APP_DIR: &str = "a14-charge-keeper";

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join(APP_DIR).join("config.json")
}
