use crate::schema::{keys, ConfigSchema, Theme};
use keeper_core::{CallbackResult, KeeperError, Listeners, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// A single setting that changed value.
///
/// `old` is `None` for a newly added key, `new` is `None` for a key removed
/// by [`ConfigStore::reset_to_defaults`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigChange {
    pub key: String,
    pub old: Option<Value>,
    pub new: Option<Value>,
}

/// Validated user settings backed by a pretty-printed JSON file.
///
/// The store is the only writer of its file. Every schema key is always
/// present; unknown keys are carried through unchanged.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    schema: ConfigSchema,
    values: Map<String, Value>,
    listeners: Listeners<ConfigChange>,
}

impl ConfigStore {
    /// Create a store holding the schema defaults. Nothing is read from disk
    /// until [`load`](Self::load) is called.
    pub fn new(path: impl Into<PathBuf>, schema: ConfigSchema) -> Self {
        Self {
            path: path.into(),
            values: schema.defaults(),
            schema,
            listeners: Listeners::default(),
        }
    }

    /// Standard schema at [`crate::default_path`], loaded from disk.
    pub fn open_default() -> Self {
        let mut store = Self::new(crate::default_path(), ConfigSchema::standard());
        store.load();
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> &ConfigSchema {
        &self.schema
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Value for `key`, or `default` when the key is unset.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.values.get(key).cloned().unwrap_or(default)
    }

    /// Copy of every setting.
    pub fn get_all(&self) -> Map<String, Value> {
        self.values.clone()
    }

    /// Validate and store a single value, notifying listeners if it changed.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        self.update([(key.into(), value.into())])
    }

    /// Validate every pair first, then apply them in order.
    ///
    /// Either all values are stored or, on the first validation failure,
    /// none are.
    pub fn update<I, K>(&mut self, pairs: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let pairs: Vec<(String, Value)> = pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        for (key, value) in &pairs {
            self.schema.validate(key, value)?;
        }

        for (key, value) in pairs {
            let old = self.values.insert(key.clone(), value.clone());
            if old.as_ref() != Some(&value) {
                self.listeners.emit(&ConfigChange {
                    key,
                    old,
                    new: Some(value),
                });
            }
        }
        Ok(())
    }

    /// Write every setting to the config file, creating its directory.
    pub fn save(&self) -> Result<()> {
        let persist = |e: &dyn std::fmt::Display| {
            KeeperError::Persistence(format!("cannot write '{}': {e}", self.path.display()))
        };

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| persist(&e))?;
        }
        let raw = serde_json::to_string_pretty(&self.values).map_err(|e| persist(&e))?;
        std::fs::write(&self.path, raw).map_err(|e| persist(&e))?;

        info!("Saved configuration to {}", self.path.display());
        Ok(())
    }

    /// Merge settings from the config file into the store.
    ///
    /// Never fails: a missing or unreadable file keeps the current values,
    /// and each key that fails validation keeps its current value while the
    /// remaining keys are still applied. Listeners are not notified.
    pub fn load(&mut self) {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No config file at '{}'; using defaults", self.path.display());
                return;
            }
            Err(e) => {
                warn!("Cannot read '{}': {e}; using defaults", self.path.display());
                return;
            }
        };

        let data: Map<String, Value> = match serde_json::from_str(&raw) {
            Ok(data) => data,
            Err(e) => {
                warn!("Corrupt config file '{}': {e}; using defaults", self.path.display());
                return;
            }
        };

        for (key, value) in data {
            match self.schema.validate(&key, &value) {
                Ok(()) => {
                    self.values.insert(key, value);
                }
                Err(e) => warn!("Skipping config key '{key}': {e}"),
            }
        }
    }

    /// Register a listener called once per changed key.
    pub fn register_change_callback(
        &mut self,
        callback: impl Fn(&ConfigChange) -> CallbackResult + Send + 'static,
    ) {
        self.listeners.register(callback);
    }

    /// Restore the schema defaults, dropping unknown keys.
    ///
    /// Listeners hear about every key whose value actually changed.
    pub fn reset_to_defaults(&mut self) {
        let old = std::mem::replace(&mut self.values, self.schema.defaults());

        let mut changed: Vec<ConfigChange> = old
            .iter()
            .filter(|(key, value)| self.values.get(key.as_str()) != Some(*value))
            .map(|(key, value)| ConfigChange {
                key: key.clone(),
                old: Some(value.clone()),
                new: self.values.get(key).cloned(),
            })
            .collect();
        changed.extend(
            self.values
                .iter()
                .filter(|(key, _)| !old.contains_key(key.as_str()))
                .map(|(key, value)| ConfigChange {
                    key: key.clone(),
                    old: None,
                    new: Some(value.clone()),
                }),
        );

        for change in &changed {
            self.listeners.emit(change);
        }
    }

    // ── Typed accessors ───────────────────────────────────────────────────────

    pub fn auto_start(&self) -> bool {
        self.bool_or(keys::AUTO_START, false)
    }

    pub fn show_notifications(&self) -> bool {
        self.bool_or(keys::SHOW_NOTIFICATIONS, true)
    }

    pub fn default_threshold(&self) -> u8 {
        self.get(keys::DEFAULT_THRESHOLD)
            .and_then(Value::as_u64)
            .and_then(|n| u8::try_from(n).ok())
            .unwrap_or(80)
    }

    pub fn theme(&self) -> Theme {
        self.get(keys::THEME)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    pub fn refresh_interval(&self) -> Duration {
        let secs = self
            .get(keys::REFRESH_INTERVAL)
            .and_then(Value::as_u64)
            .unwrap_or(30);
        Duration::from_secs(secs)
    }

    fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("config.json"), ConfigSchema::standard())
    }

    fn recorder(store: &mut ConfigStore) -> Arc<Mutex<Vec<ConfigChange>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        store.register_change_callback(move |change| {
            sink.lock().unwrap().push(change.clone());
            Ok(())
        });
        seen
    }

    #[test]
    fn starts_with_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(!store.auto_start());
        assert_eq!(store.default_threshold(), 80);
        assert_eq!(store.theme(), Theme::Dark);
        assert_eq!(store.refresh_interval(), Duration::from_secs(30));
        assert!(store.show_notifications());
        assert_eq!(store.get_or("missing", json!("fallback")), json!("fallback"));
    }

    #[test]
    fn rejects_invalid_theme() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let err = store.set(keys::THEME, "rainbow").unwrap_err();
        assert!(err.to_string().contains("'dark' or 'light'"));
        assert_eq!(store.theme(), Theme::Dark);
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        assert!(store.set(keys::DEFAULT_THRESHOLD, 19).is_err());
        assert!(store.set(keys::DEFAULT_THRESHOLD, 101).is_err());
        assert!(store.set(keys::REFRESH_INTERVAL, 4).is_err());
        assert!(store.set(keys::REFRESH_INTERVAL, 301).is_err());
        assert!(store.set(keys::AUTO_START, "yes").is_err());
        assert!(store.set(keys::DEFAULT_THRESHOLD, 20).is_ok());
        assert!(store.set(keys::REFRESH_INTERVAL, 300).is_ok());
    }

    #[test]
    fn unknown_keys_are_accepted() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set("window_position", json!([10, 20])).unwrap();
        assert_eq!(store.get("window_position"), Some(&json!([10, 20])));
    }

    #[test]
    fn batch_update_is_atomic() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let seen = recorder(&mut store);

        let result = store.update([
            (keys::DEFAULT_THRESHOLD, json!(60)),
            (keys::THEME, json!("rainbow")),
        ]);
        assert!(result.is_err());
        assert_eq!(store.default_threshold(), 80);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn notifies_changed_keys_in_order() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let seen = recorder(&mut store);

        store
            .update([
                (keys::THEME, json!("light")),
                (keys::DEFAULT_THRESHOLD, json!(80)), // unchanged
                (keys::REFRESH_INTERVAL, json!(60)),
            ])
            .unwrap();

        let seen = seen.lock().unwrap();
        let changed: Vec<&str> = seen.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(changed, [keys::THEME, keys::REFRESH_INTERVAL]);
        assert_eq!(seen[0].old, Some(json!("dark")));
        assert_eq!(seen[0].new, Some(json!("light")));
    }

    #[test]
    fn failing_listener_does_not_corrupt_store() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.register_change_callback(|_| Err("listener failed".into()));
        let seen = recorder(&mut store);

        store.set(keys::AUTO_START, true).unwrap();
        assert!(store.auto_start());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store
            .update([
                (keys::AUTO_START, json!(true)),
                (keys::DEFAULT_THRESHOLD, json!(65)),
                (keys::THEME, json!("light")),
                (keys::REFRESH_INTERVAL, json!(5)),
                (keys::SHOW_NOTIFICATIONS, json!(false)),
                ("future_key", json!({"nested": 1})),
            ])
            .unwrap();
        store.save().unwrap();

        let mut reloaded = store_in(&dir);
        reloaded.load();
        assert_eq!(reloaded.get_all(), store.get_all());
        assert_eq!(reloaded.theme(), Theme::Light);
        assert_eq!(reloaded.refresh_interval(), Duration::from_secs(5));
    }

    #[test]
    fn save_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("config.json");
        let store = ConfigStore::new(&path, ConfigSchema::standard());
        store.save().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn save_failure_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        // The target path is an existing directory.
        let store = ConfigStore::new(dir.path(), ConfigSchema::standard());
        assert!(matches!(store.save(), Err(KeeperError::Persistence(_))));
    }

    #[test]
    fn load_missing_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.load();
        assert_eq!(store.get_all(), ConfigSchema::standard().defaults());
    }

    #[test]
    fn load_corrupted_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), "{ not json").unwrap();
        let mut store = store_in(&dir);
        store.load();
        assert_eq!(store.get_all(), ConfigSchema::standard().defaults());
    }

    #[test]
    fn load_skips_only_invalid_keys() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.json"),
            r#"{"default_threshold": 150, "theme": "light", "refresh_interval": "fast", "extra": 1}"#,
        )
        .unwrap();
        let mut store = store_in(&dir);
        store.load();
        assert_eq!(store.default_threshold(), 80);
        assert_eq!(store.theme(), Theme::Light);
        assert_eq!(store.refresh_interval(), Duration::from_secs(30));
        assert_eq!(store.get("extra"), Some(&json!(1)));
    }

    #[test]
    fn load_does_not_notify() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), r#"{"theme": "light"}"#).unwrap();
        let mut store = store_in(&dir);
        let seen = recorder(&mut store);
        store.load();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn reset_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.set(keys::THEME, "light").unwrap();
        store.set("extra", 1).unwrap();
        let seen = recorder(&mut store);

        store.reset_to_defaults();
        assert_eq!(store.get_all(), ConfigSchema::standard().defaults());
        {
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 2);
            assert!(seen.contains(&ConfigChange {
                key: "extra".into(),
                old: Some(json!(1)),
                new: None,
            }));
        }

        store.reset_to_defaults();
        assert_eq!(store.get_all(), ConfigSchema::standard().defaults());
        assert_eq!(seen.lock().unwrap().len(), 2);
    }
}
