use std::{collections::HashMap, fs, time::Duration};

use client_core::ReconcilerConfig;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            poll_interval_secs: 10,
            request_timeout_secs: 10,
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            request_timeout: self.request_timeout(),
            ..ReconcilerConfig::default()
        }
    }
}

pub fn load_settings() -> Settings {
    let file_raw = fs::read_to_string("rsvp.toml").ok();
    settings_from_sources(file_raw.as_deref(), |key| std::env::var(key).ok())
}

/// Layers `rsvp.toml` contents and then environment variables over the defaults.
pub fn settings_from_sources(
    file_raw: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_raw {
        match toml::from_str::<HashMap<String, toml::Value>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("api_url").and_then(toml::Value::as_str) {
                    settings.api_url = v.to_string();
                }
                if let Some(v) = file_cfg.get("poll_interval_secs").and_then(toml::Value::as_integer) {
                    apply_secs(&mut settings.poll_interval_secs, "poll_interval_secs", &v.to_string());
                }
                if let Some(v) = file_cfg
                    .get("request_timeout_secs")
                    .and_then(toml::Value::as_integer)
                {
                    apply_secs(&mut settings.request_timeout_secs, "request_timeout_secs", &v.to_string());
                }
            }
            Err(error) => warn!(%error, "ignoring unreadable rsvp.toml"),
        }
    }

    if let Some(v) = env("RSVP_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__POLL_INTERVAL_SECS") {
        apply_secs(&mut settings.poll_interval_secs, "poll_interval_secs", &v);
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        apply_secs(&mut settings.request_timeout_secs, "request_timeout_secs", &v);
    }

    settings
}

fn apply_secs(target: &mut u64, key: &str, raw: &str) {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => *target = secs,
        _ => warn!(key, value = raw, "expected a positive number of seconds; keeping default"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
