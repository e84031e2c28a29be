//! Enumeration types for the FireWatch dashboard.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Hazard intensity
// ---------------------------------------------------------------------------

/// Reported intensity of a detected fire.
///
/// The detection service is inconsistent about casing (`"High"` vs
/// `"high"`), so parsing is case-insensitive. Labels outside the known
/// scale are preserved verbatim in [`Intensity::Other`] instead of failing
/// the whole detection payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Intensity {
    /// Smouldering or contained.
    Low,
    /// Actively burning, limited spread.
    Moderate,
    /// Actively spreading.
    High,
    /// Crown fire or uncontrolled spread.
    Extreme,
    /// A label the dashboard does not recognize.
    Other(String),
}

impl Intensity {
    /// Canonical lowercase label.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Extreme => "extreme",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for Intensity {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "low" => Self::Low,
            "moderate" | "medium" => Self::Moderate,
            "high" => Self::High,
            "extreme" | "very high" => Self::Extreme,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for Intensity {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_owned())
    }
}

impl From<Intensity> for String {
    fn from(intensity: Intensity) -> Self {
        match intensity {
            Intensity::Other(label) => label,
            known => known.as_str().to_owned(),
        }
    }
}

impl core::fmt::Display for Intensity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Data sources
// ---------------------------------------------------------------------------

/// One of the three independent telemetry sources polled each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SourceKind {
    /// Fire detections.
    Detections,
    /// Spread prediction.
    Prediction,
    /// Economic damage estimate.
    Damage,
}

impl SourceKind {
    /// All sources in fetch order.
    pub const ALL: [Self; 3] = [Self::Detections, Self::Prediction, Self::Damage];

    /// Short label used in logs and the status API.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Detections => "detections",
            Self::Prediction => "prediction",
            Self::Damage => "damage",
        }
    }
}

impl core::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Scheduler lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle of the sync scheduler's timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SyncState {
    /// No timer is active.
    #[default]
    Stopped,
    /// The timer is firing cycles.
    Running,
}
