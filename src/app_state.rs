use crate::catalog::ReservedZones;
use crate::converter::UesaveConverter;
use crate::error::ConfigError;
use crate::tracker::{BossTracker, TrackerSettings, TrackerUpdate};
use crate::watcher::{TrackerHandle, WatchHandle};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;
use tokio::sync::{Mutex, RwLock};

pub const APP_NAME: &str = "bossdex";

/// Shared state for the REPL. Cheap to clone; logic lives in the tracker.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<AppConfig>>,
    pub tracker: TrackerHandle<UesaveConverter>,
    pub updates: Sender<TrackerUpdate>,
    pub watch: Arc<Mutex<Option<WatchHandle>>>,
}

impl AppState {
    pub fn new(config: AppConfig, updates: Sender<TrackerUpdate>) -> Self {
        let converter = UesaveConverter::new(&config.converter_path);
        if !converter.is_available() {
            tracing::warn!(
                path = %converter.tool_path().display(),
                "Save converter not found; the placeholder boss list will be shown"
            );
        }
        let tracker = BossTracker::new(converter, config.tracker_settings());

        Self {
            config: Arc::new(RwLock::new(config)),
            tracker: Arc::new(Mutex::new(tracker)),
            updates,
            watch: Arc::new(Mutex::new(None)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Restored and watched again at startup
    #[serde(default)]
    pub last_save_path: Option<String>,
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    #[serde(default = "default_converter_path")]
    pub converter_path: String,
    #[serde(default)]
    pub overrides_dir: Option<String>,
    #[serde(default)]
    pub allow_manual_edit_auto_detected: bool,
    #[serde(default)]
    pub allow_boss_editing: bool,
    #[serde(default)]
    pub reserved_zones: ReservedZones,
}

fn default_catalog_path() -> String {
    "data/bossDatabase.json".to_string()
}

fn default_converter_path() -> String {
    if cfg!(windows) {
        "tools/uesave.exe".to_string()
    } else {
        "tools/uesave".to_string()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            last_save_path: None,
            catalog_path: default_catalog_path(),
            converter_path: default_converter_path(),
            overrides_dir: None,
            allow_manual_edit_auto_detected: false,
            allow_boss_editing: false,
            reserved_zones: ReservedZones::default(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not load config, using defaults");
            Self::default()
        })
    }

    pub fn try_load() -> Result<Self, ConfigError> {
        Ok(confy::load(APP_NAME, None)?)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, None, self).map_err(ConfigError::Save)
    }

    /// Configured directory, else `<config dir>/bossdex/manual-states`
    pub fn overrides_dir(&self) -> PathBuf {
        match &self.overrides_dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_NAME)
                .join("manual-states"),
        }
    }

    pub fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            catalog_path: PathBuf::from(&self.catalog_path),
            overrides_dir: self.overrides_dir(),
            reserved_zones: self.reserved_zones.clone(),
            allow_manual_edit_auto_detected: self.allow_manual_edit_auto_detected,
            allow_boss_editing: self.allow_boss_editing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"last_save_path": "C:/Saves/EXPEDITION_0.sav"}"#).unwrap();

        assert_eq!(config.catalog_path, default_catalog_path());
        assert!(!config.allow_boss_editing);
        assert_eq!(config.reserved_zones, ReservedZones::default());
    }

    #[test]
    fn explicit_overrides_dir_wins() {
        let config = AppConfig {
            overrides_dir: Some("/tmp/states".into()),
            ..Default::default()
        };
        assert_eq!(config.tracker_settings().overrides_dir, PathBuf::from("/tmp/states"));
        assert!(AppConfig::default().overrides_dir().ends_with("bossdex/manual-states"));
    }
}
