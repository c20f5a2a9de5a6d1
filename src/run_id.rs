//! Run identifiers.
//!
//! Every provisioning run gets a [`RunId`]. It names the run's temporary
//! directory, so concurrent runs on one host (CI matrix jobs) never share
//! scratch files, and it is recorded in the report.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A unique run identifier.
///
/// Format: `run_{timestamp_ms}_{hex}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId {
    timestamp: DateTime<Utc>,
    tag: [u8; 6],
}

impl RunId {
    /// Generate a new run ID.
    ///
    /// The tag mixes the clock, the process id and a per-process counter,
    /// which is enough to keep parallel runs apart.
    pub fn new() -> Self {
        let now = Utc::now();
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);

        let mut hasher = Sha256::new();
        hasher.update(now.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
        hasher.update(std::process::id().to_le_bytes());
        hasher.update(seq.to_le_bytes());
        let digest = hasher.finalize();

        let mut tag = [0u8; 6];
        tag.copy_from_slice(&digest[..6]);

        // Truncate to milliseconds for consistent serialization
        let timestamp = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);

        Self { timestamp, tag }
    }

    /// When the run started.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Parse a run ID from a string.
    pub fn parse(s: &str) -> Option<Self> {
        let (millis, hex_tag) = s.strip_prefix("run_")?.split_once('_')?;

        let timestamp = DateTime::from_timestamp_millis(millis.parse().ok()?)?;
        let bytes = hex::decode(hex_tag).ok()?;
        let tag: [u8; 6] = bytes.try_into().ok()?;

        Some(Self { timestamp, tag })
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_{}_{}",
            self.timestamp.timestamp_millis(),
            hex::encode(self.tag)
        )
    }
}

impl Serialize for RunId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RunId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RunId::parse(&s).ok_or_else(|| serde::de::Error::custom("Invalid run ID format"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_within_a_process() {
        let a = RunId::new();
        let b = RunId::new();
        assert_ne!(a, b);
        assert!(a.to_string().starts_with("run_"));
    }

    #[test]
    fn parse_round_trips_display() {
        let id = RunId::new();
        assert_eq!(RunId::parse(&id.to_string()), Some(id));
    }

    #[test]
    fn display_format() {
        let id = RunId::new();
        let display = id.to_string();
        let (millis, tag) = display
            .strip_prefix("run_")
            .unwrap()
            .split_once('_')
            .unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(tag.len(), 12);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(RunId::parse("invalid").is_none());
        assert!(RunId::parse("run_").is_none());
        assert!(RunId::parse("run_123").is_none());
        assert!(RunId::parse("run_123_xyz").is_none());
        assert!(RunId::parse("run_123_abcd").is_none());
    }

    #[test]
    fn serializes_as_string() {
        let id = RunId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert!(json.starts_with("\"run_"));
        let parsed: RunId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
