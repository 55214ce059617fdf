use std::{fs, path::Path};

use serde::Deserialize;
use tracing::warn;

use crate::{alarm_codec::AlarmTypeCodec, connectivity::StaticProbe};

pub const SETTINGS_FILE: &str = "endpoint_cli.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub device_url: String,
    /// Interval shown for endpoints with no recorded subscription. Kept as
    /// the raw string; the editor decides how to treat bad values.
    pub default_interval: String,
    pub alarm_labels: Vec<String>,
    pub platform_model: String,
    pub wifi_connected: bool,
    /// `None` when hotspot state cannot be determined.
    pub access_point: Option<bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_url: "http://192.168.100.1".into(),
            default_interval: "0".into(),
            alarm_labels: AlarmTypeCodec::default().labels().to_vec(),
            platform_model: String::new(),
            wifi_connected: false,
            access_point: None,
        }
    }
}

impl Settings {
    pub fn probe(&self) -> StaticProbe {
        StaticProbe {
            platform_model: self.platform_model.clone(),
            wifi_connected: self.wifi_connected,
            access_point: self.access_point,
        }
    }

    pub fn codec(&self) -> AlarmTypeCodec {
        AlarmTypeCodec::new(self.alarm_labels.clone())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    device_url: Option<String>,
    default_interval: Option<String>,
    alarm_labels: Option<Vec<String>>,
    platform_model: Option<String>,
    wifi_connected: Option<bool>,
    access_point: Option<bool>,
}

/// Defaults, then `endpoint_cli.toml` in the working directory, then
/// `APP__*` environment variables.
pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, file_cfg),
            Err(err) => warn!(path = %path.display(), "settings: ignoring malformed file: {err}"),
        }
    }

    apply_env(&mut settings, env);
    settings
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.device_url {
        settings.device_url = v;
    }
    if let Some(v) = file_cfg.default_interval {
        settings.default_interval = v;
    }
    if let Some(v) = file_cfg.alarm_labels {
        settings.alarm_labels = v;
    }
    if let Some(v) = file_cfg.platform_model {
        settings.platform_model = v;
    }
    if let Some(v) = file_cfg.wifi_connected {
        settings.wifi_connected = v;
    }
    if file_cfg.access_point.is_some() {
        settings.access_point = file_cfg.access_point;
    }
}

fn apply_env(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("APP__DEVICE_URL") {
        settings.device_url = v;
    }
    if let Some(v) = env("APP__DEFAULT_INTERVAL") {
        settings.default_interval = v;
    }
    if let Some(v) = env("APP__ALARM_LABELS") {
        settings.alarm_labels = v
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(v) = env("APP__PLATFORM_MODEL") {
        settings.platform_model = v;
    }
    if let Some(v) = env("APP__WIFI_CONNECTED") {
        if let Ok(parsed) = v.parse::<bool>() {
            settings.wifi_connected = parsed;
        }
    }
    if let Some(v) = env("APP__ACCESS_POINT") {
        if let Ok(parsed) = v.parse::<bool>() {
            settings.access_point = Some(parsed);
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
