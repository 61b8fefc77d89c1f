//! Configuration loading from TOML files
//!
//! The binary picks the file from `--config`, then `SCAN_GATE_CONFIG`, then
//! `config/scanner.toml`.

use crate::domain::geometry::{NormalizedOrigin, Point, PreviewMapping, ScanZone, Size};
use crate::domain::types::Symbology;
use crate::services::scan_gate::{GateConfig, DEFAULT_MIN_INTERVAL, DEFAULT_ZONE_SIZE};
use anyhow::{ensure, Context};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Default preview size in points (portrait phone screen)
const DEFAULT_PREVIEW: Size = Size::new(390.0, 844.0);

#[derive(Debug, Clone, Deserialize)]
pub struct GateSection {
    #[serde(default = "default_symbologies")]
    pub symbologies: Vec<Symbology>,
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    #[serde(default = "default_vibrate_on_accept")]
    pub vibrate_on_accept: bool,
}

impl Default for GateSection {
    fn default() -> Self {
        Self {
            symbologies: default_symbologies(),
            min_interval_ms: default_min_interval_ms(),
            vibrate_on_accept: default_vibrate_on_accept(),
        }
    }
}

fn default_symbologies() -> Vec<Symbology> {
    vec![Symbology::Qr, Symbology::Ean13, Symbology::Code128]
}

fn default_min_interval_ms() -> u64 {
    DEFAULT_MIN_INTERVAL.as_millis() as u64
}

fn default_vibrate_on_accept() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneSection {
    #[serde(default = "default_zone_width")]
    pub width: f64,
    #[serde(default = "default_zone_height")]
    pub height: f64,
    /// Defaults to the preview center
    #[serde(default)]
    pub center: Option<Point>,
}

impl Default for ZoneSection {
    fn default() -> Self {
        Self { width: default_zone_width(), height: default_zone_height(), center: None }
    }
}

fn default_zone_width() -> f64 {
    DEFAULT_ZONE_SIZE.width
}

fn default_zone_height() -> f64 {
    DEFAULT_ZONE_SIZE.height
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreviewSection {
    #[serde(default = "default_preview_width")]
    pub width: f64,
    #[serde(default = "default_preview_height")]
    pub height: f64,
    /// Captured frame size, for aspect-fill mapping
    #[serde(default)]
    pub frame_width: Option<f64>,
    #[serde(default)]
    pub frame_height: Option<f64>,
    #[serde(default)]
    pub origin: NormalizedOrigin,
    /// Detector boxes are normalized to [0,1] and need mapping
    #[serde(default)]
    pub normalized: bool,
}

impl Default for PreviewSection {
    fn default() -> Self {
        Self {
            width: default_preview_width(),
            height: default_preview_height(),
            frame_width: None,
            frame_height: None,
            origin: NormalizedOrigin::default(),
            normalized: false,
        }
    }
}

fn default_preview_width() -> f64 {
    DEFAULT_PREVIEW.width
}

fn default_preview_height() -> f64 {
    DEFAULT_PREVIEW.height
}

#[derive(Debug, Clone, Deserialize)]
pub struct EgressConfig {
    /// File path for scan reports (JSONL format)
    #[serde(default = "default_egress_file")]
    pub file: String,
}

impl Default for EgressConfig {
    fn default() -> Self {
        Self { file: default_egress_file() }
    }
}

fn default_egress_file() -> String {
    "scans.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Periodic metrics log interval (0 to disable)
    #[serde(default = "default_metrics_interval")]
    pub interval_secs: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { interval_secs: default_metrics_interval() }
    }
}

fn default_metrics_interval() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub gate: GateSection,
    #[serde(default)]
    pub zone: ZoneSection,
    #[serde(default)]
    pub preview: PreviewSection,
    #[serde(default)]
    pub egress: EgressConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Main configuration struct used throughout the application
#[derive(Debug, Clone)]
pub struct Config {
    symbologies: BTreeSet<Symbology>,
    min_interval_ms: u64,
    vibrate_on_accept: bool,
    zone: ScanZone,
    preview_size: Size,
    frame_size: Option<Size>,
    origin: NormalizedOrigin,
    normalized_input: bool,
    egress_file: String,
    metrics_interval_secs: u64,
    config_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            symbologies: default_symbologies().into_iter().collect(),
            min_interval_ms: default_min_interval_ms(),
            vibrate_on_accept: default_vibrate_on_accept(),
            zone: ScanZone::new(
                Point::new(DEFAULT_PREVIEW.width / 2.0, DEFAULT_PREVIEW.height / 2.0),
                DEFAULT_ZONE_SIZE,
            ),
            preview_size: DEFAULT_PREVIEW,
            frame_size: None,
            origin: NormalizedOrigin::default(),
            normalized_input: false,
            egress_file: default_egress_file(),
            metrics_interval_secs: default_metrics_interval(),
            config_file: "default".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        Self::from_toml_str(&content, &path.display().to_string())
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str, source: &str) -> anyhow::Result<Self> {
        let toml_config: TomlConfig = toml::from_str(content)?;
        Self::from_toml(toml_config, source)
    }

    fn from_toml(toml_config: TomlConfig, source: &str) -> anyhow::Result<Self> {
        let TomlConfig { gate, zone, preview, egress, metrics } = toml_config;

        ensure!(!gate.symbologies.is_empty(), "gate.symbologies must not be empty");

        let preview_size = Size::new(preview.width, preview.height);
        ensure!(preview_size.is_positive(), "preview size must be positive, got {:?}", preview_size);

        let zone_size = Size::new(zone.width, zone.height);
        ensure!(zone_size.is_positive(), "zone size must be positive, got {:?}", zone_size);

        let center = zone
            .center
            .unwrap_or_else(|| Point::new(preview_size.width / 2.0, preview_size.height / 2.0));
        ensure!(
            center.x.is_finite() && center.y.is_finite(),
            "zone center must be finite, got {:?}",
            center
        );

        let frame_size = match (preview.frame_width, preview.frame_height) {
            (Some(width), Some(height)) => {
                let size = Size::new(width, height);
                ensure!(size.is_positive(), "frame size must be positive, got {:?}", size);
                Some(size)
            }
            (None, None) => None,
            _ => anyhow::bail!("preview.frame_width and preview.frame_height must be set together"),
        };

        Ok(Self {
            symbologies: gate.symbologies.into_iter().collect(),
            min_interval_ms: gate.min_interval_ms,
            vibrate_on_accept: gate.vibrate_on_accept,
            zone: ScanZone::new(center, zone_size),
            preview_size,
            frame_size,
            origin: preview.origin,
            normalized_input: preview.normalized,
            egress_file: egress.file,
            metrics_interval_secs: metrics.interval_secs,
            config_file: source.to_string(),
        })
    }

    /// Load configuration - tries TOML file first, falls back to defaults
    pub fn load_from_path(path: &str) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(config_file = %path, error = %format!("{:#}", e), "config_load_failed_using_defaults");
                Self::default()
            }
        }
    }

    /// Gate configuration for a new scan session
    pub fn gate_config(&self) -> GateConfig {
        GateConfig::new(
            self.symbologies.iter().copied(),
            self.zone,
            Duration::from_millis(self.min_interval_ms),
        )
        .with_vibrate_on_accept(self.vibrate_on_accept)
    }

    /// Mapping for normalized detector boxes; `None` when boxes are already
    /// in preview coordinates
    pub fn preview_mapping(&self) -> Option<PreviewMapping> {
        self.normalized_input
            .then(|| PreviewMapping::new(self.preview_size, self.frame_size, self.origin))
    }

    pub fn symbologies(&self) -> &BTreeSet<Symbology> {
        &self.symbologies
    }

    pub fn min_interval_ms(&self) -> u64 {
        self.min_interval_ms
    }

    pub fn vibrate_on_accept(&self) -> bool {
        self.vibrate_on_accept
    }

    pub fn zone(&self) -> &ScanZone {
        &self.zone
    }

    pub fn preview_size(&self) -> Size {
        self.preview_size
    }

    pub fn normalized_input(&self) -> bool {
        self.normalized_input
    }

    pub fn egress_file(&self) -> &str {
        &self.egress_file
    }

    pub fn metrics_interval_secs(&self) -> u64 {
        self.metrics_interval_secs
    }

    pub fn config_file(&self) -> &str {
        &self.config_file
    }

    /// Override accepted symbologies (e.g. from the command line)
    pub fn with_symbologies(mut self, symbologies: impl IntoIterator<Item = Symbology>) -> Self {
        let symbologies: BTreeSet<Symbology> = symbologies.into_iter().collect();
        if !symbologies.is_empty() {
            self.symbologies = symbologies;
        }
        self
    }

    /// Override the egress file
    pub fn with_egress_file(mut self, file: impl Into<String>) -> Self {
        self.egress_file = file.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.min_interval_ms(), 1000);
        assert!(config.vibrate_on_accept());
        assert_eq!(
            config.symbologies().iter().copied().collect::<Vec<_>>(),
            vec![Symbology::Code128, Symbology::Ean13, Symbology::Qr]
        );
        assert_eq!(config.zone().size, Size::new(200.0, 200.0));
        // Zone centered in the preview
        assert_eq!(config.zone().center, Point::new(195.0, 422.0));
        assert_eq!(config.egress_file(), "scans.jsonl");
        assert!(config.preview_mapping().is_none());
        assert_eq!(config.config_file(), "default");
    }

    #[test]
    fn test_gate_config_from_config() {
        let config = Config::from_toml_str(
            r#"
[gate]
symbologies = ["qr"]
min_interval_ms = 250
vibrate_on_accept = false

[zone]
width = 100.0
height = 50.0
center = { x = 60.0, y = 40.0 }
"#,
            "inline",
        )
        .unwrap();

        let gate = config.gate_config();
        assert!(gate.accepts(Symbology::Qr));
        assert!(!gate.accepts(Symbology::Ean13));
        assert_eq!(gate.min_interval, Duration::from_millis(250));
        assert!(!gate.vibrate_on_accept);
        assert_eq!(gate.scan_zone.center, Point::new(60.0, 40.0));
        assert_eq!(gate.scan_zone.size, Size::new(100.0, 50.0));
    }

    #[test]
    fn test_preview_mapping_enabled() {
        let config = Config::from_toml_str(
            r#"
[preview]
width = 400.0
height = 400.0
frame_width = 1920.0
frame_height = 1080.0
origin = "bottom_left"
normalized = true
"#,
            "inline",
        )
        .unwrap();

        let mapping = config.preview_mapping().unwrap();
        assert_eq!(
            mapping,
            PreviewMapping::new(
                Size::new(400.0, 400.0),
                Some(Size::new(1920.0, 1080.0)),
                NormalizedOrigin::BottomLeft
            )
        );
    }

    #[test]
    fn test_rejects_empty_symbologies() {
        let err = Config::from_toml_str("[gate]\nsymbologies = []\n", "inline").unwrap_err();
        assert!(err.to_string().contains("symbologies"));
    }

    #[test]
    fn test_rejects_non_positive_zone() {
        assert!(Config::from_toml_str("[zone]\nwidth = 0.0\n", "inline").is_err());
        assert!(Config::from_toml_str("[zone]\nheight = -5.0\n", "inline").is_err());
    }

    #[test]
    fn test_rejects_half_frame_size() {
        assert!(Config::from_toml_str("[preview]\nframe_width = 1920.0\n", "inline").is_err());
    }

    #[test]
    fn test_rejects_unknown_symbology() {
        assert!(Config::from_toml_str("[gate]\nsymbologies = [\"maxicode\"]\n", "inline").is_err());
    }

    #[test]
    fn test_symbology_names_match_cli_parsing() {
        let config = Config::from_toml_str(
            "[gate]\nsymbologies = [\"EAN-13\", \"Data_Matrix\", \"QR\"]\n",
            "inline",
        )
        .unwrap();
        assert_eq!(
            config.symbologies().iter().copied().collect::<Vec<_>>(),
            vec![Symbology::DataMatrix, Symbology::Ean13, Symbology::Qr]
        );
    }

    #[test]
    fn test_rejects_catch_all_symbology_name() {
        assert!(Config::from_toml_str("[gate]\nsymbologies = [\"other\"]\n", "inline").is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default()
            .with_symbologies([Symbology::Pdf417])
            .with_egress_file("out/scans.jsonl");
        assert!(config.gate_config().accepts(Symbology::Pdf417));
        assert!(!config.gate_config().accepts(Symbology::Qr));
        assert_eq!(config.egress_file(), "out/scans.jsonl");

        // Empty override keeps the configured set
        let config = Config::default().with_symbologies(Vec::new());
        assert_eq!(config.symbologies().len(), 3);
    }
}
