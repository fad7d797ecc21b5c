use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::clock::Stage;
use crate::units::TempUnit;
use crate::validation::{check_timeout, check_times, validate, SettingsDraft, ValidationError};

pub const ORGANIZATION: &str = "UnquenchedServant";
pub const APPLICATION: &str = "DHV-Session-Timer";

pub mod keys {
    pub const TEMP1: &str = "temp1";
    pub const TEMP2: &str = "temp2";
    pub const TEMP3: &str = "temp3";
    pub const UNIT: &str = "temp_type";
    pub const TIME2: &str = "time2";
    pub const TIME3: &str = "time3";
    pub const TIME4: &str = "time4";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const SOUND: &str = "almightyDing";
    pub const KEEP_ON_TOP: &str = "keep_active_default";
    pub const TIMEOUT: &str = "timeout";
    pub const SKIP_ALL_UPDATES: &str = "skip_all_updates";

    pub fn skip_version(version: &str) -> String {
        format!("skip_{version}")
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings could not be encoded: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything the timer needs to run a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub temp1: i32,
    pub temp2: i32,
    pub temp3: i32,
    pub unit: TempUnit,
    pub time2: u32,
    pub time3: u32,
    pub time4: u32,
    pub notifications_enabled: bool,
    pub sound_enabled: bool,
    pub keep_window_on_top_default: bool,
    pub notification_timeout_secs: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            temp1: 350,
            temp2: 375,
            temp3: 400,
            unit: TempUnit::F,
            time2: 6,
            time3: 8,
            time4: 10,
            notifications_enabled: true,
            sound_enabled: true,
            keep_window_on_top_default: true,
            notification_timeout_secs: 10,
        }
    }
}

/// Booleans are stored as the literal text `True`/`False`.
pub fn bool_to_setting(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

pub fn setting_to_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "True" | "true" => Some(true),
        "False" | "false" => Some(false),
        _ => None,
    }
}

impl SessionConfig {
    /// Build a config from stored values, taking the default for any field
    /// that is missing or unreadable.
    pub fn from_store(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();

        fn read<T: std::str::FromStr>(store: &dyn KeyValueStore, key: &str, fallback: T) -> T {
            match store.get(key) {
                Some(raw) => match raw.trim().parse::<T>() {
                    Ok(v) => v,
                    Err(_) => {
                        log::warn!("ignoring unreadable setting {key}={raw:?}");
                        fallback
                    }
                },
                None => fallback,
            }
        }

        fn read_bool(store: &dyn KeyValueStore, key: &str, fallback: bool) -> bool {
            match store.get(key) {
                Some(raw) => setting_to_bool(&raw).unwrap_or_else(|| {
                    log::warn!("ignoring unreadable setting {key}={raw:?}");
                    fallback
                }),
                None => fallback,
            }
        }

        let mut config = Self {
            temp1: read(store, keys::TEMP1, defaults.temp1),
            temp2: read(store, keys::TEMP2, defaults.temp2),
            temp3: read(store, keys::TEMP3, defaults.temp3),
            unit: read(store, keys::UNIT, defaults.unit),
            time2: read(store, keys::TIME2, defaults.time2),
            time3: read(store, keys::TIME3, defaults.time3),
            time4: read(store, keys::TIME4, defaults.time4),
            notifications_enabled: read_bool(
                store,
                keys::NOTIFICATIONS,
                defaults.notifications_enabled,
            ),
            sound_enabled: read_bool(store, keys::SOUND, defaults.sound_enabled),
            keep_window_on_top_default: read_bool(
                store,
                keys::KEEP_ON_TOP,
                defaults.keep_window_on_top_default,
            ),
            notification_timeout_secs: read(
                store,
                keys::TIMEOUT,
                defaults.notification_timeout_secs,
            ),
        };

        if let Err(e) = check_times(config.time2, config.time3, config.time4) {
            log::warn!(
                "ignoring stored session times {}/{}/{}: {e}",
                config.time2,
                config.time3,
                config.time4
            );
            config.time2 = defaults.time2;
            config.time3 = defaults.time3;
            config.time4 = defaults.time4;
        }
        if let Err(e) = check_timeout(config.notification_timeout_secs) {
            log::warn!("ignoring stored notification timeout: {e}");
            config.notification_timeout_secs = defaults.notification_timeout_secs;
        }
        config
    }

    fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (keys::TEMP1, self.temp1.to_string()),
            (keys::TEMP2, self.temp2.to_string()),
            (keys::TEMP3, self.temp3.to_string()),
            (keys::UNIT, self.unit.to_string()),
            (keys::TIME2, self.time2.to_string()),
            (keys::TIME3, self.time3.to_string()),
            (keys::TIME4, self.time4.to_string()),
            (
                keys::NOTIFICATIONS,
                bool_to_setting(self.notifications_enabled).to_string(),
            ),
            (keys::SOUND, bool_to_setting(self.sound_enabled).to_string()),
            (
                keys::KEEP_ON_TOP,
                bool_to_setting(self.keep_window_on_top_default).to_string(),
            ),
            (keys::TIMEOUT, self.notification_timeout_secs.to_string()),
        ]
    }

    /// Write every field and flush. Nothing changes if the flush fails.
    pub fn write_to(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        commit(store, &self.entries())
    }

    /// Temperature target for a stage.
    pub fn temp_for(&self, stage: Stage) -> i32 {
        match stage {
            Stage::One => self.temp1,
            Stage::Two => self.temp2,
            Stage::Three => self.temp3,
        }
    }
}

/// Validate a draft and persist it. The store is only touched on success.
pub fn save_validated(
    store: &dyn KeyValueStore,
    draft: &SettingsDraft,
) -> Result<SessionConfig, SaveError> {
    let config = validate(draft)?;
    config.write_to(store)?;
    Ok(config)
}

/// Overwrite every session field with its default.
pub fn reset_to_defaults(store: &dyn KeyValueStore) -> Result<SessionConfig, StoreError> {
    let config = SessionConfig::default();
    config.write_to(store)?;
    Ok(config)
}

/// Set `entries` and flush them together. If the flush fails the previous
/// values are put back, so the store never holds a write that missed disk.
pub fn commit<K: AsRef<str>>(
    store: &dyn KeyValueStore,
    entries: &[(K, String)],
) -> Result<(), StoreError> {
    let previous: Vec<(&str, Option<String>)> = entries
        .iter()
        .map(|(key, _)| (key.as_ref(), store.get(key.as_ref())))
        .collect();
    for (key, value) in entries {
        store.set(key.as_ref(), value);
    }

    store.flush().inspect_err(|e| {
        log::warn!("settings not saved, rolling back: {e}");
        for (key, old) in previous {
            match old {
                Some(value) => store.set(key, &value),
                None => store.remove(key),
            }
        }
    })
}

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("Could not save settings: {0}")]
    Store(#[from] StoreError),
}

/// Flat string-to-string settings storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
    /// Persist pending writes.
    fn flush(&self) -> Result<(), StoreError>;
}

/// JSON file backed store. Keys it does not know about are kept as-is.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl FileStore {
    /// Open the per-user store, loading whatever is already on disk.
    pub fn open_default() -> Self {
        Self::open(default_settings_path())
    }

    pub fn open<P: AsRef<Path>>(p: P) -> Self {
        let path = p.as_ref().to_path_buf();
        let values = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<BTreeMap<String, String>>(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    log::warn!("settings at {} are corrupt, using defaults: {e}", path.display());
                    BTreeMap::new()
                }
            },
            Err(e) => {
                log::debug!("no settings at {}: {e}", path.display());
                BTreeMap::new()
            }
        };
        Self {
            path,
            values: Arc::new(Mutex::new(values)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&*self.lock())?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

/// In-memory store, used by tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.lock().remove(key);
    }

    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub fn default_settings_path() -> PathBuf {
    if let Some(pd) = ProjectDirs::from("", ORGANIZATION, APPLICATION) {
        pd.config_dir().join("settings.json")
    } else {
        PathBuf::from("dhv_settings.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn empty_store_loads_defaults() {
        let store = MemoryStore::new();
        let cfg = SessionConfig::from_store(&store);
        assert_eq!(cfg, SessionConfig::default());
        assert_eq!((cfg.temp1, cfg.temp2, cfg.temp3), (350, 375, 400));
        assert_eq!((cfg.time2, cfg.time3, cfg.time4), (6, 8, 10));
        assert_eq!(cfg.unit, TempUnit::F);
        assert!(cfg.notifications_enabled && cfg.sound_enabled && cfg.keep_window_on_top_default);
    }

    #[test]
    fn booleans_are_written_as_text() {
        let store = MemoryStore::new();
        let cfg = SessionConfig {
            sound_enabled: false,
            ..SessionConfig::default()
        };
        cfg.write_to(&store).unwrap();

        let values = store.snapshot();
        assert_eq!(values.get(keys::SOUND).map(String::as_str), Some("False"));
        assert_eq!(values.get(keys::NOTIFICATIONS).map(String::as_str), Some("True"));
        assert_eq!(values.get(keys::UNIT).map(String::as_str), Some("F"));
    }

    #[test]
    fn unreadable_fields_fall_back_individually() {
        let store = MemoryStore::new();
        store.set(keys::TEMP1, "hot");
        store.set(keys::TEMP2, "380");
        store.set(keys::NOTIFICATIONS, "maybe");
        store.set(keys::UNIT, "K");

        let cfg = SessionConfig::from_store(&store);
        assert_eq!(cfg.temp1, 350);
        assert_eq!(cfg.temp2, 380);
        assert!(cfg.notifications_enabled);
        assert_eq!(cfg.unit, TempUnit::F);
    }

    #[test]
    fn file_store_roundtrip_keeps_opaque_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = FileStore::open(&path);
        store.set("geometry", "AdnQywADAAAAAAJ");
        let cfg = SessionConfig {
            temp1: 180,
            temp2: 190,
            temp3: 200,
            unit: TempUnit::C,
            ..SessionConfig::default()
        };
        cfg.write_to(&store).unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(SessionConfig::from_store(&reopened), cfg);
        assert_eq!(reopened.get("geometry").as_deref(), Some("AdnQywADAAAAAAJ"));
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, b"{ not json").unwrap();

        let store = FileStore::open(&path);
        assert_eq!(SessionConfig::from_store(&store), SessionConfig::default());
    }

    #[test]
    fn rejected_save_leaves_store_untouched() {
        let store = MemoryStore::new();
        SessionConfig::default().write_to(&store).unwrap();
        let before = store.snapshot();

        let draft = SettingsDraft {
            time2: "9".into(),
            time3: "8".into(),
            ..SettingsDraft::from(&SessionConfig::default())
        };
        let err = save_validated(&store, &draft).unwrap_err();
        assert_matches!(err, SaveError::Invalid(ValidationError::InvalidTimeOrder));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn accepted_save_persists_every_field() {
        let store = MemoryStore::new();
        let draft = SettingsDraft {
            temp1: "360".into(),
            time4: "12".into(),
            notifications_enabled: false,
            ..SettingsDraft::from(&SessionConfig::default())
        };
        let saved = save_validated(&store, &draft).unwrap();
        assert_eq!(saved.temp1, 360);
        assert_eq!(SessionConfig::from_store(&store), saved);
    }

    #[test]
    fn misordered_times_load_as_defaults() {
        let store = MemoryStore::new();
        store.set(keys::TIME2, "9");
        store.set(keys::TIME3, "8");
        store.set(keys::TEMP1, "360");

        let cfg = SessionConfig::from_store(&store);
        assert_eq!((cfg.time2, cfg.time3, cfg.time4), (6, 8, 10));
        assert_eq!(cfg.temp1, 360);
    }

    #[test]
    fn oversized_values_load_as_defaults() {
        let store = MemoryStore::new();
        store.set(keys::TIME4, "99999999");
        store.set(keys::TIMEOUT, "4294967295");

        let cfg = SessionConfig::from_store(&store);
        assert_eq!(cfg.time4, 10);
        assert_eq!(cfg.notification_timeout_secs, 10);
    }

    #[test]
    fn failed_flush_rolls_back() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"").unwrap();
        let store = FileStore::open(blocker.join("settings.json"));
        store.set(keys::TEMP1, "355");

        let draft = SettingsDraft {
            temp1: "360".into(),
            ..SettingsDraft::from(&SessionConfig::default())
        };
        let err = save_validated(&store, &draft).unwrap_err();
        assert_matches!(err, SaveError::Store(StoreError::Io(_)));
        assert_eq!(store.get(keys::TEMP1).as_deref(), Some("355"));
        assert_eq!(store.get(keys::TEMP2), None);

        assert_matches!(reset_to_defaults(&store), Err(StoreError::Io(_)));
        assert_eq!(store.get(keys::TEMP1).as_deref(), Some("355"));
        assert_eq!(store.get(keys::TIME4), None);
    }

    #[test]
    fn reset_overwrites_custom_values() {
        let store = MemoryStore::new();
        store.set(keys::TEMP1, "200");
        store.set(keys::skip_version("v2.00").as_str(), "True");
        let cfg = reset_to_defaults(&store).unwrap();
        assert_eq!(cfg, SessionConfig::default());
        assert_eq!(store.get(keys::TEMP1).as_deref(), Some("350"));
        assert_eq!(store.get("skip_v2.00").as_deref(), Some("True"));
    }
}
