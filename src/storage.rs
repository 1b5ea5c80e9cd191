use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::dates::ScheduleView;

pub mod keys {
    pub const LOGGED_IN: &str = "isLoggedIn";
    pub const USER_ROLE: &str = "userRole";
    pub const USER_EMAIL: &str = "userEmail";
    pub const USER_ID: &str = "userId";
    pub const USER_NAME: &str = "userName";
    pub const REMEMBERED_USER: &str = "rememberedUser";
    pub const PERSISTENT_LOGIN: &str = "persistentLogin";
    pub const SHIFT_SCHEDULE: &str = "shiftSchedule";
}

/// String key-value store persisted as one JSON object. Every change is
/// written through to disk before returning.
#[derive(Debug, Default)]
pub struct LocalStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl LocalStore {
    pub fn open_default() -> Self {
        match store_path() {
            Some(path) => Self::open(path),
            None => {
                warn!("home directory not found, local store is memory-only");
                Self::in_memory()
            }
        }
    }

    /// Opens the store at `path`. An unreadable or corrupt file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = read_values(&path).unwrap_or_default();
        Self {
            path: Some(path),
            values,
        }
    }

    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// A failed write leaves the previous value in place.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), io::Error> {
        let previous = self.values.insert(key.to_string(), value.into());
        if let Err(err) = self.flush() {
            match previous {
                Some(previous) => self.values.insert(key.to_string(), previous),
                None => self.values.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<(), io::Error> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), io::Error> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
        fs::write(path, json)
    }
}

fn read_values(path: &Path) -> Option<BTreeMap<String, String>> {
    let contents = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(values) => Some(values),
        Err(err) => {
            warn!(path = %path.display(), "ignoring corrupt local store: {err}");
            None
        }
    }
}

fn store_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".shiftboard-store.json");
    Some(path)
}

pub fn log_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".shiftboard.log");
    Some(path)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Terminal,
    Light,
    Dark,
}

impl ThemePreference {
    pub fn next(self) -> Self {
        match self {
            ThemePreference::Terminal => ThemePreference::Dark,
            ThemePreference::Dark => ThemePreference::Light,
            ThemePreference::Light => ThemePreference::Terminal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub theme: ThemePreference,
    #[serde(default)]
    pub default_view: ScheduleView,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
}

impl Config {
    /// Reads the config file, then applies environment overrides.
    pub fn load() -> Self {
        let mut config = read_config().unwrap_or_default();
        config.apply_env(|key| env::var(key).ok());
        config
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        match (non_empty("SHIFTBOARD_SUPABASE_URL"), non_empty("SHIFTBOARD_SUPABASE_KEY")) {
            (Some(url), Some(api_key)) => {
                self.backend = Some(BackendConfig {
                    url: url.trim().to_string(),
                    api_key: api_key.trim().to_string(),
                });
            }
            (Some(url), None) => {
                if let Some(backend) = self.backend.as_mut() {
                    backend.url = url.trim().to_string();
                }
            }
            (None, Some(api_key)) => {
                if let Some(backend) = self.backend.as_mut() {
                    backend.api_key = api_key.trim().to_string();
                }
            }
            (None, None) => {}
        }
        if let Some(password) = non_empty("SHIFTBOARD_ADMIN_PASSWORD") {
            self.admin_password = Some(password);
        }
    }
}

pub fn write_theme(theme: ThemePreference) -> Result<(), io::Error> {
    let mut config = read_config().unwrap_or_default();
    config.theme = theme;
    write_config(&config)
}

pub fn write_default_view(view: ScheduleView) -> Result<(), io::Error> {
    let mut config = read_config().unwrap_or_default();
    config.default_view = view;
    write_config(&config)
}

fn config_path() -> Option<PathBuf> {
    let mut path = dirs::home_dir()?;
    path.push(".shiftboard.json");
    Some(path)
}

fn read_config() -> Option<Config> {
    let path = config_path()?;
    let contents = fs::read_to_string(path).ok()?;
    serde_json::from_str(&contents).ok()
}

fn write_config(config: &Config) -> Result<(), io::Error> {
    let path = config_path()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Home directory not found"))?;
    let json = serde_json::to_string_pretty(config)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err.to_string()))?;
    fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store = LocalStore::open(&path);
        store.set(keys::USER_EMAIL, "randy@example.com").unwrap();
        store.set(keys::LOGGED_IN, "true").unwrap();
        store.remove(keys::LOGGED_IN).unwrap();

        let reopened = LocalStore::open(&path);
        assert_eq!(reopened.get(keys::USER_EMAIL), Some("randy@example.com"));
        assert_eq!(reopened.get(keys::LOGGED_IN), None);
    }

    #[test]
    fn failed_write_keeps_the_old_value() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::open(dir.path().join("missing").join("store.json"));
        assert!(store.set("userName", "Shane").is_err());
        assert_eq!(store.get("userName"), None);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{not json").unwrap();
        let store = LocalStore::open(&path);
        assert_eq!(store.get(keys::SHIFT_SCHEDULE), None);
    }

    #[test]
    fn memory_store_never_touches_disk() {
        let mut store = LocalStore::in_memory();
        store.set(keys::USER_ROLE, "manager").unwrap();
        assert_eq!(store.get(keys::USER_ROLE), Some("manager"));
    }

    #[test]
    fn env_overrides_backend_settings() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SHIFTBOARD_SUPABASE_URL", "https://example.supabase.co"),
            ("SHIFTBOARD_SUPABASE_KEY", "anon-key"),
            ("SHIFTBOARD_ADMIN_PASSWORD", "s3cret"),
        ]);
        let mut config = Config::default();
        config.apply_env(|key| env.get(key).map(|value| value.to_string()));
        let backend = config.backend.unwrap();
        assert_eq!(backend.url, "https://example.supabase.co");
        assert_eq!(backend.api_key, "anon-key");
        assert_eq!(config.admin_password.as_deref(), Some("s3cret"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(|_| Some("  ".to_string()));
        assert!(config.backend.is_none());
        assert!(config.admin_password.is_none());
    }

    #[test]
    fn theme_cycles_through_all_values() {
        let start = ThemePreference::Terminal;
        assert_eq!(start.next().next().next(), start);
    }
}
