use std::{collections::HashMap, fs};

use shared::menu::DEFAULT_DISH_CAPACITY;
use tracing::warn;

pub const DEFAULT_BODY_LIMIT_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub dish_capacity: u32,
    pub body_limit_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            dish_capacity: DEFAULT_DISH_CAPACITY,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

pub fn load_settings() -> Settings {
    let file_raw = fs::read_to_string("server.toml").ok();
    settings_from_sources(file_raw.as_deref(), |key| std::env::var(key).ok())
}

/// Layers `server.toml` contents and then environment variables over the defaults.
pub fn settings_from_sources(
    file_raw: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_raw {
        match toml::from_str::<HashMap<String, toml::Value>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
                    settings.server_bind = v.to_string();
                }
                if let Some(v) = file_cfg.get("dish_capacity").and_then(toml::Value::as_integer) {
                    apply_capacity(&mut settings, &v.to_string());
                }
                if let Some(v) = file_cfg
                    .get("body_limit_bytes")
                    .and_then(toml::Value::as_integer)
                    .and_then(|v| usize::try_from(v).ok())
                {
                    settings.body_limit_bytes = v;
                }
            }
            Err(error) => warn!(%error, "ignoring unreadable server.toml"),
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__DISH_CAPACITY") {
        apply_capacity(&mut settings, &v);
    }

    settings
}

fn apply_capacity(settings: &mut Settings, raw: &str) {
    match raw.trim().parse::<u32>() {
        Ok(capacity) if capacity > 0 => settings.dish_capacity = capacity,
        _ => warn!(value = raw, "dish capacity must be a positive integer; keeping default"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
