// crates/invoker-tck-config/tests/config.rs
// ============================================================================
// Module: Config Tests
// Description: Loading, validation, overrides, and wiring of TCK config.
// Purpose: Validate fail-closed config handling with real files.
// Dependencies: invoker-tck-config, invoker-tck-core, tempfile
// ============================================================================

//! ## Overview
//! Writes config files to temporary locations and checks the parsed model,
//! the validation errors, and the runtime components built from it.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    reason = "Test helpers use explicit panics for setup clarity."
)]

use std::collections::BTreeMap;
use std::io::Write;
use std::net::IpAddr;
use std::net::Ipv4Addr;
use std::time::Duration;

use invoker_tck_config::ConfigError;
use invoker_tck_config::EnvOverrides;
use invoker_tck_config::LogSinkKind;
use invoker_tck_config::TckConfig;
use invoker_tck_core::CaseName;
use invoker_tck_core::ImageRef;
use invoker_tck_core::ReadinessPolicy;
use invoker_tck_core::TckEventKind;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn empty_file_yields_defaults() {
    let file = write_config("");
    let config = TckConfig::load_file(file.path()).unwrap();
    assert_eq!(config, TckConfig::default());
    assert_eq!(config.readiness_policy(), ReadinessPolicy::default());
    assert_eq!(config.logging.sink, LogSinkKind::Disabled);
    let options = config.run_options();
    assert_eq!(options.verification_timeout, None);
}

#[test]
fn parses_every_section() {
    let file = write_config(
        r#"
[readiness]
max_attempts = 5
base_delay_ms = 20
settle_delay_ms = 250
connect_timeout_ms = 500

[ports]
bind_host = "0.0.0.0"
max_attempts = 4

[run]
verification_timeout_sec = 30
cases = ["rr-0002", "rr-0004"]

[images]
upper = "ghcr.io/acme/upper-rust:1.0"

[logging]
sink = "stderr"
"#,
    );

    let config = TckConfig::load_file(file.path()).unwrap();

    assert_eq!(
        config.readiness_policy(),
        ReadinessPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(20),
            settle_delay: Duration::from_millis(250),
            connect_timeout: Duration::from_millis(500),
        }
    );
    assert_eq!(config.ports.bind_host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let options = config.run_options();
    assert_eq!(options.verification_timeout, Some(Duration::from_secs(30)));
    assert!(options.selection.includes(&CaseName::new("rr-0004")));
    assert!(!options.selection.includes(&CaseName::new("rr-0001")));
    assert_eq!(
        config.image_resolver().resolve(&ImageRef::new("upper")).as_str(),
        "ghcr.io/acme/upper-rust:1.0"
    );
    assert_eq!(config.logging.sink, LogSinkKind::Stderr);
}

#[test]
fn rejects_unknown_keys() {
    let file = write_config("[readiness]\nattempts = 3\n");
    assert!(matches!(TckConfig::load_file(file.path()), Err(ConfigError::Parse(_))));
}

#[test]
fn rejects_zero_attempts() {
    let file = write_config("[readiness]\nmax_attempts = 0\n");
    assert!(matches!(TckConfig::load_file(file.path()), Err(ConfigError::Invalid(_))));

    let file = write_config("[ports]\nmax_attempts = 0\n");
    assert!(matches!(TckConfig::load_file(file.path()), Err(ConfigError::Invalid(_))));
}

#[test]
fn rejects_empty_image_mapping() {
    let file = write_config("[images]\nupper = \"\"\n");
    assert!(matches!(TckConfig::load_file(file.path()), Err(ConfigError::Invalid(_))));
}

#[test]
fn file_sink_requires_a_path() {
    let file = write_config("[logging]\nsink = \"file\"\n");
    let err = TckConfig::load_file(file.path()).unwrap_err();
    assert_eq!(err, ConfigError::Invalid("logging.path is required for the file sink".to_string()));
}

#[test]
fn rejects_non_utf8_content() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(&[0xff, 0xfe, 0x00]).unwrap();
    assert!(matches!(TckConfig::load_file(file.path()), Err(ConfigError::Invalid(_))));
}

#[test]
fn rejects_oversized_files() {
    let padding = "# padding\n".repeat(60_000);
    let file = write_config(&padding);
    assert!(matches!(TckConfig::load_file(file.path()), Err(ConfigError::Invalid(_))));
}

#[test]
fn missing_explicit_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    assert!(matches!(TckConfig::load_file(&missing), Err(ConfigError::Io(_))));
}

#[test]
fn overrides_replace_file_values() {
    let mut config = TckConfig::from_toml_str("[readiness]\nsettle_delay_ms = 1000\n").unwrap();
    config.apply_overrides(&EnvOverrides {
        verification_timeout_sec: Some(12),
        settle_delay_ms: Some(0),
        log_sink: Some(LogSinkKind::Stderr),
    });
    assert_eq!(config.readiness.settle_delay_ms, 0);
    assert_eq!(config.run_options().verification_timeout, Some(Duration::from_secs(12)));
    assert_eq!(config.logging.sink, LogSinkKind::Stderr);
    config.validate().unwrap();
}

#[test]
fn environment_override_can_repair_the_file() {
    let file = write_config("[logging]\nsink = \"file\"\n");
    let vars = BTreeMap::from([("INVOKER_TCK_LOG_SINK", "stderr".to_string())]);

    let config =
        TckConfig::load_with_lookup(Some(file.path()), |name| Ok(vars.get(name).cloned())).unwrap();
    assert_eq!(config.logging.sink, LogSinkKind::Stderr);

    let without = TckConfig::load_with_lookup(Some(file.path()), |_| Ok(None));
    assert!(matches!(without, Err(ConfigError::Invalid(message)) if message.contains("logging.path")));
}

#[test]
fn environment_names_the_config_file() {
    let file = write_config("[run]\ncases = [\"rr-0003\"]\n");
    let path = file.path().display().to_string();

    let config = TckConfig::load_with_lookup(None, |name| {
        Ok((name == "INVOKER_TCK_CONFIG").then(|| path.clone()))
    })
    .unwrap();

    assert_eq!(config.run.cases, vec!["rr-0003".to_string()]);
}

#[test]
fn file_sink_appends_events() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("events.jsonl");
    let file = write_config(&format!(
        "[logging]\nsink = \"file\"\npath = {}\n",
        toml_string(&log.display().to_string())
    ));
    let config = TckConfig::load_file(file.path()).unwrap();

    let sink = config.event_sink().unwrap();
    sink.emit(TckEventKind::PortAllocated {
        port: 45_000,
    });

    let content = std::fs::read_to_string(&log).unwrap();
    assert!(content.contains("\"event\":\"port_allocated\""));
}

fn toml_string(value: &str) -> String {
    format!("'{value}'")
}
