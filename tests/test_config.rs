use std::collections::HashMap;

use btrelay::config::{Config, Mode, DEFAULT_LISTEN_ADDR};
use btrelay::transport::SERIAL_PORT_SERVICE;

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_config_defaults() {
    let cfg = Config::from_vars(vars(&[]));
    assert_eq!(cfg.mode, Mode::Server);
    assert_eq!(cfg.listen_addr, DEFAULT_LISTEN_ADDR);
    assert_eq!(cfg.service_id, SERIAL_PORT_SERVICE);
    assert_eq!(cfg.fetch.connect_timeout_secs, 10);
    assert_eq!(cfg.fetch.read_timeout_secs, 15);
}

#[test]
fn test_config_custom_address_from_env() {
    let cfg = Config::from_vars(vars(&[("LISTEN", "0.0.0.0:3000"), ("PEER", "10.0.0.2:3000")]));
    assert_eq!(cfg.listen_addr, "0.0.0.0:3000");
    assert_eq!(cfg.peer_addr, "10.0.0.2:3000");
}

#[test]
fn test_config_client_mode() {
    let cfg = Config::from_vars(vars(&[("RELAY_MODE", "Client")]));
    assert_eq!(cfg.mode, Mode::Client);
}

#[test]
fn test_config_unknown_mode_falls_back_to_server() {
    let cfg = Config::from_vars(vars(&[("RELAY_MODE", "bridge")]));
    assert_eq!(cfg.mode, Mode::Server);
}

#[test]
fn test_config_invalid_timeout_keeps_default() {
    let cfg = Config::from_vars(vars(&[
        ("FETCH_CONNECT_TIMEOUT_SECS", "soon"),
        ("FETCH_READ_TIMEOUT_SECS", "30"),
    ]));
    assert_eq!(cfg.fetch.connect_timeout_secs, 10);
    assert_eq!(cfg.fetch.read_timeout().as_secs(), 30);
}

#[test]
fn test_config_from_yaml() {
    let cfg = Config::from_yaml_str(
        r#"
mode: client
peer_addr: "192.168.1.5:9000"
service_id: "00001101-0000-1000-8000-00805f9b34fb"
fetch:
  read_timeout_secs: 20
"#,
    )
    .unwrap();

    assert_eq!(cfg.mode, Mode::Client);
    assert_eq!(cfg.peer_addr, "192.168.1.5:9000");
    assert_eq!(cfg.listen_addr, DEFAULT_LISTEN_ADDR);
    assert_eq!(cfg.service_id, SERIAL_PORT_SERVICE);
    assert_eq!(cfg.fetch.read_timeout_secs, 20);
    assert_eq!(cfg.fetch.connect_timeout_secs, 10);
}

#[test]
fn test_config_from_yaml_rejects_bad_mode() {
    assert!(Config::from_yaml_str("mode: sideways\n").is_err());
}

#[test]
fn test_config_clone() {
    let cfg1 = Config::from_vars(vars(&[("LISTEN", "127.0.0.1:8000")]));
    let cfg2 = cfg1.clone();
    assert_eq!(cfg1, cfg2);
}
