use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;
use url::Url;

pub const SETTINGS_FILE: &str = "coordinator.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub refresh_interval_secs: u64,
    pub auto_refresh: bool,
    pub locale: String,
    pub currency_symbol: String,
    pub invite_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3001".into(),
            request_timeout_secs: 15,
            refresh_interval_secs: 10,
            auto_refresh: true,
            locale: "tr-TR".into(),
            currency_symbol: "₺".into(),
            invite_base_url: "https://bip.com/join".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    /// Base address of the event API, without a trailing slash.
    pub fn api_base(&self) -> anyhow::Result<String> {
        let parsed = Url::parse(self.api_base_url.trim())
            .with_context(|| format!("invalid api base url '{}'", self.api_base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("api base url '{}' must use http or https", self.api_base_url);
        }
        Ok(parsed.as_str().trim_end_matches('/').to_string())
    }

    pub fn invite_link(&self, event_id: &str) -> String {
        format!("{}/{event_id}", self.invite_base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    request_timeout_secs: Option<u64>,
    refresh_interval_secs: Option<u64>,
    auto_refresh: Option<bool>,
    locale: Option<String>,
    currency_symbol: Option<String>,
    invite_base_url: Option<String>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the TOML file at `path` if it exists, then environment
/// overrides looked up through `env`.
pub fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<FileSettings>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, file_cfg),
            Err(err) => warn!(path = %path.display(), error = %err, "ignoring unreadable settings file"),
        }
    }

    apply_env_overrides(&mut settings, env);
    settings
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.api_base_url {
        settings.api_base_url = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg.refresh_interval_secs {
        settings.refresh_interval_secs = v;
    }
    if let Some(v) = file_cfg.auto_refresh {
        settings.auto_refresh = v;
    }
    if let Some(v) = file_cfg.locale {
        settings.locale = v;
    }
    if let Some(v) = file_cfg.currency_symbol {
        settings.currency_symbol = v;
    }
    if let Some(v) = file_cfg.invite_base_url {
        settings.invite_base_url = v;
    }
}

fn apply_env_overrides(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = env("APP__REFRESH_INTERVAL_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.refresh_interval_secs = parsed;
        }
    }

    if let Some(v) = env("APP__AUTO_REFRESH") {
        match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => settings.auto_refresh = true,
            "0" | "false" | "no" | "off" => settings.auto_refresh = false,
            _ => {}
        }
    }

    if let Some(v) = env("APP__LOCALE") {
        settings.locale = v;
    }
    if let Some(v) = env("APP__CURRENCY_SYMBOL") {
        settings.currency_symbol = v;
    }
    if let Some(v) = env("APP__INVITE_BASE_URL") {
        settings.invite_base_url = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
