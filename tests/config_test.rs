//! Integration tests for configuration loading

use scan_gate::domain::{Point, Size, Symbology};
use scan_gate::infra::Config;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[gate]
symbologies = ["qr", "pdf417"]
min_interval_ms = 1500
vibrate_on_accept = false

[zone]
width = 120.0
height = 80.0
center = { x = 200.0, y = 300.0 }

[preview]
width = 400.0
height = 600.0
normalized = true

[egress]
file = "out/test-scans.jsonl"
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.min_interval_ms(), 1500);
    assert!(!config.vibrate_on_accept());
    assert_eq!(config.zone().center, Point::new(200.0, 300.0));
    assert_eq!(config.zone().size, Size::new(120.0, 80.0));
    assert_eq!(config.preview_size(), Size::new(400.0, 600.0));
    assert!(config.preview_mapping().is_some());
    assert_eq!(config.egress_file(), "out/test-scans.jsonl");
    assert_eq!(config.config_file(), temp_file.path().display().to_string());

    let gate = config.gate_config();
    assert!(gate.accepts(Symbology::Pdf417));
    assert!(!gate.accepts(Symbology::Ean13));
    assert_eq!(gate.min_interval, Duration::from_millis(1500));
}

#[test]
fn test_zone_defaults_to_preview_center() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[preview]\nwidth = 300.0\nheight = 500.0\n").unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();
    assert_eq!(config.zone().center, Point::new(150.0, 250.0));
    assert_eq!(config.zone().size, Size::new(200.0, 200.0));
}

#[test]
fn test_invalid_file_reports_path() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[zone]\nwidth = -1.0\n").unwrap();
    temp_file.flush().unwrap();

    let err = Config::from_file(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
    assert!(format!("{:#}", err).contains("zone size must be positive"));
}

#[test]
fn test_load_from_path_fallback() {
    let config = Config::load_from_path("/nonexistent/scanner.toml");
    assert_eq!(config.min_interval_ms(), 1000);
    assert_eq!(config.config_file(), "default");
    assert!(config.gate_config().accepts(Symbology::Qr));
}

#[test]
fn test_shipped_config_is_valid() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/scanner.toml");
    let config = Config::from_file(path).unwrap();
    assert!(config.preview_mapping().is_some());
    assert_eq!(config.symbologies().len(), 3);
}
