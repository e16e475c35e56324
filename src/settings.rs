use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, warn};
use serde_json::{json, Map, Value};

use crate::models::FilterConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    HideSolved,
    HidePremium,
    SkillBased,
    IncludedTopics,
    ExcludedTopics,
    Difficulties,
    SkillLevel,
}

impl SettingKey {
    pub const ALL: [SettingKey; 7] = [
        SettingKey::HideSolved,
        SettingKey::HidePremium,
        SettingKey::SkillBased,
        SettingKey::IncludedTopics,
        SettingKey::ExcludedTopics,
        SettingKey::Difficulties,
        SettingKey::SkillLevel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::HideSolved => "hideSolved",
            SettingKey::HidePremium => "hidePremium",
            SettingKey::SkillBased => "skillBased",
            SettingKey::IncludedTopics => "includedTopics",
            SettingKey::ExcludedTopics => "excludedTopics",
            SettingKey::Difficulties => "difficulties",
            SettingKey::SkillLevel => "skillLevel",
        }
    }

    pub fn default_value(&self) -> Value {
        match self {
            SettingKey::HideSolved => json!(false),
            SettingKey::HidePremium => json!(false),
            SettingKey::SkillBased => json!(true),
            SettingKey::IncludedTopics => json!([]),
            SettingKey::ExcludedTopics => json!([]),
            SettingKey::Difficulties => json!(["easy", "medium", "hard"]),
            SettingKey::SkillLevel => json!("beginner"),
        }
    }
}

impl FromStr for SettingKey {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| SettingsError::UnknownKey(s.to_string()))
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Json(serde_json::Error),
    UnknownKey(String),
    InvalidValue { key: &'static str, reason: String },
    /// The file exists but is not a JSON object; writing would discard it.
    Malformed(PathBuf),
    NoConfigDir,
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "Settings file error: {}", e),
            SettingsError::Json(e) => write!(f, "Settings JSON error: {}", e),
            SettingsError::UnknownKey(key) => write!(f, "Unknown setting '{}'", key),
            SettingsError::InvalidValue { key, reason } => write!(f, "Invalid value for '{}': {}", key, reason),
            SettingsError::Malformed(path) => write!(
                f,
                "Settings file {} is not valid JSON; fix it by hand or run `leetpick settings reset`",
                path.display()
            ),
            SettingsError::NoConfigDir => write!(f, "Could not determine a configuration directory"),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::Io(err)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        SettingsError::Json(err)
    }
}

/// Flat key/value settings.
pub trait SettingsStore {
    /// Stored value for `key`, or its default.
    fn get(&self, key: SettingKey) -> Value;

    fn set(&mut self, key: SettingKey, value: Value) -> Result<(), SettingsError>;
}

/// Reads every recognised key and assembles the filter configuration.
pub fn load_filter_config(store: &impl SettingsStore) -> FilterConfig {
    let values: Map<String, Value> = SettingKey::ALL
        .into_iter()
        .map(|key| (key.as_str().to_string(), store.get(key)))
        .collect();
    match serde_json::from_value::<FilterConfig>(Value::Object(values)) {
        Ok(config) => config.normalized(),
        Err(e) => {
            warn!("Stored settings are unusable ({}), falling back to defaults", e);
            FilterConfig::default()
        }
    }
}

pub fn default_settings_path() -> Result<PathBuf, SettingsError> {
    let base = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
    Ok(base.join("leetpick").join("settings.json"))
}

/// Settings persisted as a pretty-printed JSON object.
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
    malformed: bool,
}

impl JsonFileStore {
    /// Opens the store; a missing or unreadable file reads as empty. A malformed
    /// file also reads as empty but refuses `set` until it is reset.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut malformed = false;
        let values = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Map<String, Value>>(&contents) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Ignoring malformed settings file {}: {}", path.display(), e);
                    malformed = true;
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };
        debug!("Loaded {} stored settings from {}", values.len(), path.display());
        Self { path, values, malformed }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restores every key to its default.
    pub fn reset(&mut self) -> Result<(), SettingsError> {
        self.values = SettingKey::ALL
            .into_iter()
            .map(|key| (key.as_str().to_string(), key.default_value()))
            .collect();
        self.malformed = false;
        self.save()
    }

    fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: SettingKey) -> Value {
        self.values.get(key.as_str()).cloned().unwrap_or_else(|| key.default_value())
    }

    fn set(&mut self, key: SettingKey, value: Value) -> Result<(), SettingsError> {
        if self.malformed {
            return Err(SettingsError::Malformed(self.path.clone()));
        }
        // Validate against the full config shape before accepting the value.
        let mut candidate: Map<String, Value> = SettingKey::ALL
            .into_iter()
            .map(|k| (k.as_str().to_string(), self.get(k)))
            .collect();
        candidate.insert(key.as_str().to_string(), value.clone());
        serde_json::from_value::<FilterConfig>(Value::Object(candidate)).map_err(|e| SettingsError::InvalidValue {
            key: key.as_str(),
            reason: e.to_string(),
        })?;

        self.values.insert(key.as_str().to_string(), value);
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::models::{Difficulty, SkillTier};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn scratch_path() -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir()
            .join(format!("leetpick-settings-{}-{}", std::process::id(), n))
            .join("settings.json")
    }

    #[test]
    fn missing_file_yields_defaults() {
        let store = JsonFileStore::open(scratch_path());
        assert_eq!(store.get(SettingKey::SkillBased), json!(true));
        assert_eq!(load_filter_config(&store), FilterConfig::default());
    }

    #[test]
    fn set_persists_and_reloads() {
        let path = scratch_path();
        let mut store = JsonFileStore::open(&path);
        store.set(SettingKey::HideSolved, json!(true)).unwrap();
        store.set(SettingKey::SkillLevel, json!("expert")).unwrap();
        store.set(SettingKey::ExcludedTopics, json!(["Dynamic-Programming"])).unwrap();

        let reopened = JsonFileStore::open(&path);
        let config = load_filter_config(&reopened);
        assert!(config.hide_solved);
        assert_eq!(config.skill_level, SkillTier::Expert);
        assert!(config.excluded_topics.contains("dynamic programming"));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut store = JsonFileStore::open(scratch_path());
        let result = store.set(SettingKey::Difficulties, json!(["impossible"]));
        assert!(matches!(result, Err(SettingsError::InvalidValue { key: "difficulties", .. })));
        assert_eq!(store.get(SettingKey::Difficulties), SettingKey::Difficulties.default_value());
    }

    #[test]
    fn unknown_keys_do_not_parse() {
        assert!(matches!("theme".parse::<SettingKey>(), Err(SettingsError::UnknownKey(_))));
        assert_eq!("skillLevel".parse::<SettingKey>().unwrap(), SettingKey::SkillLevel);
    }

    #[test]
    fn reset_restores_defaults() {
        let path = scratch_path();
        let mut store = JsonFileStore::open(&path);
        store.set(SettingKey::Difficulties, json!(["hard"])).unwrap();
        assert_eq!(load_filter_config(&store).difficulties, [Difficulty::Hard].into_iter().collect::<std::collections::BTreeSet<_>>());
        store.reset().unwrap();
        assert_eq!(load_filter_config(&JsonFileStore::open(&path)), FilterConfig::default());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn malformed_file_is_ignored() {
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::open(&path);
        assert_eq!(load_filter_config(&store), FilterConfig::default());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn malformed_file_is_not_overwritten_by_set() {
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ \"hideSolved\": true,").unwrap();

        let mut store = JsonFileStore::open(&path);
        let result = store.set(SettingKey::HidePremium, json!(true));
        assert!(matches!(result, Err(SettingsError::Malformed(_))));
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ \"hideSolved\": true,");

        store.reset().unwrap();
        store.set(SettingKey::HidePremium, json!(true)).unwrap();
        assert!(load_filter_config(&JsonFileStore::open(&path)).hide_premium);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
