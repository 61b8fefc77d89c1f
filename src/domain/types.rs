//! Shared types for the scan gate

use crate::domain::geometry::Rect;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Generate a new UUIDv7 (time-sortable)
pub fn new_uuid_v7() -> String {
    Uuid::now_v7().to_string()
}

/// Get current epoch milliseconds
#[inline]
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Barcode encoding standard reported by the detector
///
/// Names go through `FromStr` in every surface (CLI, TOML, JSONL), so
/// "EAN-13" and "ean13" are the same symbology everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Symbology {
    Aztec,
    Codabar,
    Code39,
    Code93,
    Code128,
    DataMatrix,
    Ean8,
    Ean13,
    Gs1DataBar,
    Itf14,
    MicroQr,
    Pdf417,
    Qr,
    Upce,
    /// Detector tag outside the known set. Never accepted by a gate and not
    /// nameable in configuration.
    Other,
}

impl Symbology {
    pub const ALL: [Symbology; 14] = [
        Symbology::Aztec,
        Symbology::Codabar,
        Symbology::Code39,
        Symbology::Code93,
        Symbology::Code128,
        Symbology::DataMatrix,
        Symbology::Ean8,
        Symbology::Ean13,
        Symbology::Gs1DataBar,
        Symbology::Itf14,
        Symbology::MicroQr,
        Symbology::Pdf417,
        Symbology::Qr,
        Symbology::Upce,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Symbology::Aztec => "aztec",
            Symbology::Codabar => "codabar",
            Symbology::Code39 => "code39",
            Symbology::Code93 => "code93",
            Symbology::Code128 => "code128",
            Symbology::DataMatrix => "datamatrix",
            Symbology::Ean8 => "ean8",
            Symbology::Ean13 => "ean13",
            Symbology::Gs1DataBar => "gs1databar",
            Symbology::Itf14 => "itf14",
            Symbology::MicroQr => "microqr",
            Symbology::Pdf417 => "pdf417",
            Symbology::Qr => "qr",
            Symbology::Upce => "upce",
            Symbology::Other => "other",
        }
    }
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown symbology: {0}")]
pub struct UnknownSymbology(pub String);

impl std::str::FromStr for Symbology {
    type Err = UnknownSymbology;

    /// Case-insensitive, `-` and `_` ignored ("EAN-13" parses as `Ean13`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        Symbology::ALL
            .iter()
            .copied()
            .find(|sym| sym.as_str() == key)
            .ok_or_else(|| UnknownSymbology(s.to_string()))
    }
}

impl TryFrom<String> for Symbology {
    type Error = UnknownSymbology;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symbology> for String {
    fn from(sym: Symbology) -> Self {
        sym.as_str().to_string()
    }
}

/// Detector tags are open-ended; anything unknown becomes `Symbology::Other`
fn detected_symbology<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Symbology, D::Error> {
    let tag = String::deserialize(deserializer)?;
    Ok(tag.parse().unwrap_or(Symbology::Other))
}

/// Millisecond timestamp. Only differences matter to the gate, so the epoch
/// may be wall-clock or session-relative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    #[inline]
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    #[inline]
    pub fn as_millis(&self) -> u64 {
        self.0
    }

    /// Elapsed time since `earlier`, zero if `earlier` is in the future
    #[inline]
    pub fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Time source for stamping frames that arrive without a capture time
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock in epoch milliseconds
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp(epoch_ms())
    }
}

/// A single barcode detected in a frame, as reported by the detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(deserialize_with = "detected_symbology")]
    pub symbology: Symbology,
    #[serde(default)]
    pub payload: Option<String>,
    /// Detector-space box (normalized when a preview mapping is configured)
    #[serde(rename = "bbox")]
    pub bounding_box: Rect,
}

/// Detection event evaluated by the gate
///
/// The bounding box is expressed in the scan zone's coordinate space.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionEvent {
    pub symbology: Symbology,
    pub payload: Option<String>,
    pub bounding_box: Rect,
    pub timestamp: Timestamp,
}

impl DetectionEvent {
    #[inline]
    pub fn new(
        symbology: Symbology,
        payload: Option<String>,
        bounding_box: Rect,
        timestamp: Timestamp,
    ) -> Self {
        Self { symbology, payload, bounding_box, timestamp }
    }

    /// Payload if present and non-empty
    #[inline]
    pub fn non_empty_payload(&self) -> Option<&str> {
        self.payload.as_deref().filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbology_from_str() {
        assert_eq!("qr".parse::<Symbology>().unwrap(), Symbology::Qr);
        assert_eq!("EAN-13".parse::<Symbology>().unwrap(), Symbology::Ean13);
        assert_eq!("Data_Matrix".parse::<Symbology>().unwrap(), Symbology::DataMatrix);
        assert_eq!("code128".parse::<Symbology>().unwrap(), Symbology::Code128);
        assert!("maxicode".parse::<Symbology>().is_err());
        assert!("other".parse::<Symbology>().is_err());
    }

    #[test]
    fn test_symbology_deserialize_uses_from_str() {
        let sym: Symbology = serde_json::from_str("\"EAN-13\"").unwrap();
        assert_eq!(sym, Symbology::Ean13);
        assert!(serde_json::from_str::<Symbology>("\"maxicode\"").is_err());
    }

    #[test]
    fn test_observation_unknown_tag_is_other() {
        let obs: Observation = serde_json::from_str(
            r#"{"symbology":"maxicode","payload":"X","bbox":{"x":0,"y":0,"width":1,"height":1}}"#,
        )
        .unwrap();
        assert_eq!(obs.symbology, Symbology::Other);

        let obs: Observation = serde_json::from_str(
            r#"{"symbology":"Code-128","payload":"X","bbox":{"x":0,"y":0,"width":1,"height":1}}"#,
        )
        .unwrap();
        assert_eq!(obs.symbology, Symbology::Code128);
    }

    #[test]
    fn test_symbology_serde_matches_as_str() {
        for sym in Symbology::ALL {
            let json = serde_json::to_string(&sym).unwrap();
            assert_eq!(json, format!("\"{}\"", sym.as_str()));
        }
    }

    #[test]
    fn test_timestamp_saturating_duration() {
        let earlier = Timestamp(1_000);
        let later = Timestamp(2_500);
        assert_eq!(later.saturating_duration_since(earlier), Duration::from_millis(1_500));
        assert_eq!(earlier.saturating_duration_since(later), Duration::ZERO);
    }

    #[test]
    fn test_non_empty_payload() {
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        let empty = DetectionEvent::new(Symbology::Qr, Some(String::new()), rect, Timestamp(0));
        let absent = DetectionEvent::new(Symbology::Qr, None, rect, Timestamp(0));
        let present = DetectionEvent::new(Symbology::Qr, Some("A".into()), rect, Timestamp(0));
        assert_eq!(empty.non_empty_payload(), None);
        assert_eq!(absent.non_empty_payload(), None);
        assert_eq!(present.non_empty_payload(), Some("A"));
    }
}
