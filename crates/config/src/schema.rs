use keeper_core::{KeeperError, Result, THRESHOLD_MAX, THRESHOLD_MIN};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Keys of the settings the application knows about.
pub mod keys {
    pub const AUTO_START: &str = "auto_start";
    pub const DEFAULT_THRESHOLD: &str = "default_threshold";
    pub const THEME: &str = "theme";
    pub const REFRESH_INTERVAL: &str = "refresh_interval";
    pub const SHOW_NOTIFICATIONS: &str = "show_notifications";
}

/// Rule a value must satisfy before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validator {
    /// Integer within `min..=max`.
    Range { min: i64, max: i64 },
    /// String equal to one of the listed options.
    OneOf(&'static [&'static str]),
    IsBoolean,
}

impl Validator {
    pub fn check(&self, value: &Value) -> bool {
        match self {
            Self::Range { min, max } => value.as_i64().is_some_and(|n| (*min..=*max).contains(&n)),
            Self::OneOf(options) => value.as_str().is_some_and(|s| options.contains(&s)),
            Self::IsBoolean => value.is_boolean(),
        }
    }
}

/// One known setting: its key, default, validator and rejection message.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub key: &'static str,
    pub default: Value,
    pub validator: Validator,
    pub error_message: &'static str,
}

/// Immutable, ordered description of every known setting.
///
/// Keys outside the schema are accepted without validation so files written
/// by newer versions survive a round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSchema {
    entries: Vec<SchemaEntry>,
}

impl Default for ConfigSchema {
    fn default() -> Self {
        Self::standard()
    }
}

impl ConfigSchema {
    pub fn new(entries: Vec<SchemaEntry>) -> Self {
        Self { entries }
    }

    /// The application's settings.
    pub fn standard() -> Self {
        Self::new(vec![
            SchemaEntry {
                key: keys::AUTO_START,
                default: json!(false),
                validator: Validator::IsBoolean,
                error_message: "Auto start must be a boolean value",
            },
            SchemaEntry {
                key: keys::DEFAULT_THRESHOLD,
                default: json!(80),
                validator: Validator::Range {
                    min: i64::from(THRESHOLD_MIN),
                    max: i64::from(THRESHOLD_MAX),
                },
                error_message: "Threshold must be between 20 and 100",
            },
            SchemaEntry {
                key: keys::THEME,
                default: json!("dark"),
                validator: Validator::OneOf(&["dark", "light"]),
                error_message: "Theme must be 'dark' or 'light'",
            },
            SchemaEntry {
                key: keys::REFRESH_INTERVAL,
                default: json!(30),
                validator: Validator::Range { min: 5, max: 300 },
                error_message: "Refresh interval must be between 5 and 300",
            },
            SchemaEntry {
                key: keys::SHOW_NOTIFICATIONS,
                default: json!(true),
                validator: Validator::IsBoolean,
                error_message: "Show notifications must be a boolean value",
            },
        ])
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    pub fn entry(&self, key: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// A fresh mapping holding every default.
    pub fn defaults(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|e| (e.key.to_string(), e.default.clone()))
            .collect()
    }

    /// Check `value` against the validator for `key`, if any.
    pub fn validate(&self, key: &str, value: &Value) -> Result<()> {
        match self.entry(key) {
            Some(entry) if !entry.validator.check(value) => {
                Err(KeeperError::Validation(entry.error_message.to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Colour scheme of the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_defaults() {
        let defaults = ConfigSchema::standard().defaults();
        assert_eq!(defaults[keys::AUTO_START], json!(false));
        assert_eq!(defaults[keys::DEFAULT_THRESHOLD], json!(80));
        assert_eq!(defaults[keys::THEME], json!("dark"));
        assert_eq!(defaults[keys::REFRESH_INTERVAL], json!(30));
        assert_eq!(defaults[keys::SHOW_NOTIFICATIONS], json!(true));
        assert_eq!(defaults.len(), 5);
    }

    #[test]
    fn every_default_passes_its_validator() {
        for entry in ConfigSchema::standard().entries() {
            assert!(entry.validator.check(&entry.default), "{}", entry.key);
        }
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let v = Validator::Range { min: 5, max: 300 };
        assert!(v.check(&json!(5)));
        assert!(v.check(&json!(300)));
        assert!(!v.check(&json!(4)));
        assert!(!v.check(&json!(301)));
        assert!(!v.check(&json!("30")));
        assert!(!v.check(&json!(30.5)));
    }

    #[test]
    fn booleans_are_strict() {
        assert!(Validator::IsBoolean.check(&json!(true)));
        assert!(!Validator::IsBoolean.check(&json!(1)));
        assert!(!Validator::IsBoolean.check(&json!("true")));
    }

    #[test]
    fn theme_message_names_options() {
        let err = ConfigSchema::standard()
            .validate(keys::THEME, &json!("rainbow"))
            .unwrap_err();
        assert!(matches!(err, KeeperError::Validation(ref m) if m == "Theme must be 'dark' or 'light'"));
    }

    #[test]
    fn unknown_keys_are_unvalidated() {
        assert!(ConfigSchema::standard().validate("window_x", &json!([1, 2])).is_ok());
    }

    #[test]
    fn theme_serde() {
        assert_eq!(serde_json::from_value::<Theme>(json!("light")).unwrap(), Theme::Light);
        assert_eq!(serde_json::to_value(Theme::Dark).unwrap(), json!("dark"));
    }
}
