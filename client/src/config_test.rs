use std::collections::HashMap;

use super::*;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect::<HashMap<_, _>>();
    move |key| map.get(key).cloned()
}

#[test]
fn from_lookup_applies_defaults() {
    let cfg = ClientConfig::from_lookup(lookup(&[
        ("API_URL", "http://127.0.0.1:8000/api/"),
        ("WS_URL", "ws://127.0.0.1:8000/ws"),
    ]))
    .expect("config");

    assert_eq!(cfg.api_url, "http://127.0.0.1:8000/api");
    assert_eq!(cfg.ws_url, "ws://127.0.0.1:8000/ws");
    assert_eq!(cfg.app_url, DEFAULT_APP_URL);
    assert_eq!(cfg.reconnect, ReconnectPolicy::default());
}

#[test]
fn from_lookup_rewrites_http_websocket_schemes() {
    let cfg = ClientConfig::from_lookup(lookup(&[
        ("API_URL", "https://c4.example/api"),
        ("WS_URL", "https://c4.example/ws/"),
    ]))
    .expect("config");
    assert_eq!(cfg.ws_url, "wss://c4.example/ws");

    let cfg = ClientConfig::from_lookup(lookup(&[
        ("API_URL", "http://localhost/api"),
        ("WS_URL", "http://localhost/ws"),
    ]))
    .expect("config");
    assert_eq!(cfg.ws_url, "ws://localhost/ws");
}

#[test]
fn from_lookup_parses_reconnect_overrides() {
    let cfg = ClientConfig::from_lookup(lookup(&[
        ("API_URL", "http://localhost/api"),
        ("WS_URL", "ws://localhost/ws"),
        ("APP_URL", "https://play.example/"),
        ("RECONNECT_BASE_MS", "50"),
        ("RECONNECT_MAX_MS", "400"),
        ("RECONNECT_JITTER_MS", "0"),
    ]))
    .expect("config");

    assert_eq!(cfg.app_url, "https://play.example");
    assert_eq!(cfg.reconnect, ReconnectPolicy { base_ms: 50, max_ms: 400, jitter_ms: 0 });
}

#[test]
fn reconnect_cap_never_below_base() {
    let cfg = ClientConfig::from_lookup(lookup(&[
        ("API_URL", "http://localhost/api"),
        ("WS_URL", "ws://localhost/ws"),
        ("RECONNECT_BASE_MS", "5000"),
        ("RECONNECT_MAX_MS", "10"),
    ]))
    .expect("config");
    assert_eq!(cfg.reconnect.max_ms, 5000);
}

#[test]
fn zero_reconnect_base_is_raised_to_one() {
    let cfg = ClientConfig::from_lookup(lookup(&[
        ("API_URL", "http://localhost/api"),
        ("WS_URL", "ws://localhost/ws"),
        ("RECONNECT_BASE_MS", "0"),
        ("RECONNECT_MAX_MS", "0"),
    ]))
    .expect("config");
    assert_eq!(cfg.reconnect.base_ms, 1);
    assert_eq!(cfg.reconnect.max_ms, 1);
}

#[test]
fn unparsable_numbers_fall_back_to_defaults() {
    let cfg = ClientConfig::from_lookup(lookup(&[
        ("API_URL", "http://localhost/api"),
        ("WS_URL", "ws://localhost/ws"),
        ("RECONNECT_BASE_MS", "soon"),
    ]))
    .expect("config");
    assert_eq!(cfg.reconnect.base_ms, DEFAULT_RECONNECT_BASE_MS);
}

#[test]
fn missing_api_url_is_reported() {
    let err = ClientConfig::from_lookup(lookup(&[("WS_URL", "ws://localhost/ws")])).expect_err("missing");
    assert_eq!(err, ConfigError::MissingVar { var: "API_URL" });
}

#[test]
fn blank_ws_url_counts_as_missing() {
    let err = ClientConfig::from_lookup(lookup(&[("API_URL", "http://localhost/api"), ("WS_URL", "  ")]))
        .expect_err("blank");
    assert_eq!(err, ConfigError::MissingVar { var: "WS_URL" });
}

#[test]
fn unsupported_scheme_is_rejected() {
    let err = ClientConfig::from_lookup(lookup(&[("API_URL", "ftp://localhost/api"), ("WS_URL", "ws://x")]))
        .expect_err("scheme");
    assert!(matches!(err, ConfigError::InvalidUrl { var: "API_URL", .. }));
}
