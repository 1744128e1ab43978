use std::collections::HashMap;
use std::io::Write;

use relay::config::{
    Config, DEFAULT_BACKEND_LISTEN, DEFAULT_BACKEND_URL, DEFAULT_GATEWAY_LISTEN, DEFAULT_MESSAGE,
    DEFAULT_PREFIX,
};
use relay::error::ConfigError;

fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| vars.get(key).cloned()
}

#[test]
fn test_config_defaults() {
    let cfg = Config::default();

    assert_eq!(cfg.gateway.listen_addr, DEFAULT_GATEWAY_LISTEN);
    assert_eq!(cfg.gateway.backend.url, DEFAULT_BACKEND_URL);
    assert_eq!(cfg.gateway.prefix, DEFAULT_PREFIX);
    assert_eq!(cfg.backend.listen_addr, DEFAULT_BACKEND_LISTEN);
    assert_eq!(cfg.backend.message, DEFAULT_MESSAGE);
}

#[test]
fn test_config_env_overrides() {
    let mut cfg = Config::default();
    cfg.apply_env(env(&[
        ("LISTEN", "127.0.0.1:9000"),
        ("BACKEND_URL", "http://10.0.0.5:5000/"),
        ("GATEWAY_PREFIX", "GW> "),
        ("BACKEND_MESSAGE", "X"),
        ("REQUEST_TIMEOUT_MS", "250"),
    ]))
    .unwrap();

    assert_eq!(cfg.gateway.listen_addr, "127.0.0.1:9000");
    assert_eq!(cfg.backend.listen_addr, "127.0.0.1:9000");
    assert_eq!(cfg.gateway.backend.url, "http://10.0.0.5:5000/");
    assert_eq!(cfg.gateway.prefix, "GW> ");
    assert_eq!(cfg.backend.message, "X");
    assert_eq!(cfg.gateway.request_timeout().as_millis(), 250);
    assert_eq!(cfg.gateway.connect_timeout_ms, 2_000);
}

#[test]
fn test_config_rejects_bad_timeout() {
    let mut cfg = Config::default();

    let err = cfg
        .apply_env(env(&[("CONNECT_TIMEOUT_MS", "soon")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "CONNECT_TIMEOUT_MS"));

    let err = cfg
        .apply_env(env(&[("REQUEST_TIMEOUT_MS", "0")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn test_config_partial_yaml_keeps_defaults() {
    let cfg = Config::from_yaml(
        "gateway:\n  prefix: 'Edge: '\n  backend:\n    url: http://api:7000/\n",
    )
    .unwrap();

    assert_eq!(cfg.gateway.prefix, "Edge: ");
    assert_eq!(cfg.gateway.backend.url, "http://api:7000/");
    assert_eq!(cfg.gateway.backend.name, None);
    assert_eq!(cfg.gateway.listen_addr, DEFAULT_GATEWAY_LISTEN);
    assert_eq!(cfg.backend.message, DEFAULT_MESSAGE);
}

#[test]
fn test_config_empty_yaml_is_default() {
    let cfg = Config::from_yaml("  \n").unwrap();
    assert_eq!(cfg.gateway.prefix, DEFAULT_PREFIX);
}

#[test]
fn test_config_invalid_yaml() {
    let err = Config::from_yaml("gateway: [unterminated").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_config_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "backend:\n  message: from file\n  listen_addr: 127.0.0.1:5001").unwrap();

    let cfg = Config::from_file(file.path()).unwrap();

    assert_eq!(cfg.backend.message, "from file");
    assert_eq!(cfg.backend.listen_addr, "127.0.0.1:5001");
}

#[test]
fn test_config_missing_file() {
    let err = Config::from_file(std::path::Path::new("/nonexistent/relay.yml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_example_config_parses() {
    let cfg = Config::from_yaml(include_str!("../relay.example.yml")).unwrap();

    assert_eq!(cfg.gateway.backend.name.as_deref(), Some("backend"));
    assert_eq!(cfg.gateway.request_timeout_ms, 10_000);
}
