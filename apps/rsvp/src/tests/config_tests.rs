use super::{settings_from_sources, Settings};

use std::{collections::HashMap, time::Duration};

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_poll_every_ten_seconds() {
    let settings = settings_from_sources(None, env_from(&[]));
    assert_eq!(settings, Settings::default());
    let config = settings.reconciler_config();
    assert_eq!(config.poll_interval, Duration::from_secs(10));
    assert_eq!(config.request_timeout, Duration::from_secs(10));
}

#[test]
fn file_then_env_layering() {
    let raw = r#"
api_url = "https://rsvp.example.com/api"
poll_interval_secs = 30
request_timeout_secs = 4
"#;
    let settings = settings_from_sources(Some(raw), env_from(&[]));
    assert_eq!(settings.api_url, "https://rsvp.example.com/api");
    assert_eq!(settings.poll_interval_secs, 30);
    assert_eq!(settings.request_timeout(), Duration::from_secs(4));

    let settings = settings_from_sources(
        Some(raw),
        env_from(&[
            ("RSVP_API_URL", "http://127.0.0.1:1/api"),
            ("APP__API_URL", "http://127.0.0.1:2/api"),
            ("APP__POLL_INTERVAL_SECS", "5"),
        ]),
    );
    assert_eq!(settings.api_url, "http://127.0.0.1:2/api");
    assert_eq!(settings.poll_interval_secs, 5);
    assert_eq!(settings.request_timeout_secs, 4);
}

#[test]
fn zero_or_garbage_durations_keep_defaults() {
    let settings = settings_from_sources(
        Some("poll_interval_secs = 0"),
        env_from(&[("APP__REQUEST_TIMEOUT_SECS", "soon")]),
    );
    assert_eq!(settings.poll_interval_secs, 10);
    assert_eq!(settings.request_timeout_secs, 10);
}
