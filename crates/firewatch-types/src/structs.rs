//! Core data structs for the FireWatch dashboard.
//!
//! Wire-facing records ([`HazardEvent`], [`SpreadPrediction`],
//! [`DamageEstimate`]) mirror the JSON emitted by the telemetry services:
//! snake\_case keys, with camelCase aliases accepted. The remaining structs
//! are owned by the sync engine: a [`Snapshot`] is one cycle's merged view
//! of all sources, and a [`RenderModel`] is the read-only projection handed
//! to presentation adapters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Intensity, SourceKind};
use crate::ids::HazardId;

/// Label shown when no cycle has ever refreshed any source.
pub const NEVER_SYNCED_LABEL: &str = "never";

/// Label shown in place of the spread direction before a prediction exists.
pub const PREDICTION_PENDING_LABEL: &str = "Calculating...";

/// Label shown in place of the damage figure before an estimate exists.
pub const DAMAGE_PENDING_LABEL: &str = "...";

// ---------------------------------------------------------------------------
// Coordinates
// ---------------------------------------------------------------------------

/// A WGS84 coordinate pair, serialized as `[lat, lon]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    /// Build a coordinate from latitude and longitude in degrees.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self(lat, lon)
    }

    /// Latitude in degrees.
    pub const fn lat(self) -> f64 {
        self.0
    }

    /// Longitude in degrees.
    pub const fn lon(self) -> f64 {
        self.1
    }

    /// Whether both components are finite and inside the WGS84 range.
    pub fn is_valid(self) -> bool {
        self.0.is_finite()
            && self.1.is_finite()
            && (-90.0..=90.0).contains(&self.0)
            && (-180.0..=180.0).contains(&self.1)
    }
}

// ---------------------------------------------------------------------------
// Telemetry records
// ---------------------------------------------------------------------------

/// A fire detection reported by the detection service.
///
/// Unique by [`id`](Self::id). Events are never patched: every cycle
/// replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct HazardEvent {
    /// Service-assigned identifier.
    pub id: HazardId,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Reported intensity.
    #[ts(as = "String")]
    pub intensity: Intensity,
    /// Dominant vegetation at the detection site.
    #[serde(default, alias = "vegetationType", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub vegetation_type: Option<String>,
    /// Vegetation density at the detection site.
    #[serde(default, alias = "vegetationDensity", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub vegetation_density: Option<String>,
    /// Service-side timestamp of the last update, passed through verbatim.
    #[serde(default, alias = "lastUpdateTime", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub last_update_time: Option<String>,
    /// Operational status (e.g. `Active`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub status: Option<String>,
    /// Name of the sensor or satellite that made the detection.
    #[serde(default, alias = "detectedBy", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub detected_by: Option<String>,
}

impl HazardEvent {
    /// Build a minimal event with no optional metadata.
    pub fn new(id: HazardId, lat: f64, lon: f64, intensity: impl Into<Intensity>) -> Self {
        Self {
            id,
            lat,
            lon,
            intensity: intensity.into(),
            vegetation_type: None,
            vegetation_density: None,
            last_update_time: None,
            status: None,
            detected_by: None,
        }
    }

    /// The event's coordinates.
    pub const fn position(&self) -> LatLon {
        LatLon::new(self.lat, self.lon)
    }
}

/// Predicted spread of a fire over a timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpreadPrediction {
    /// Compass direction of spread (e.g. `North-East`).
    pub direction: String,
    /// Horizon the prediction covers (e.g. `6-12h`).
    pub timeframe: String,
    /// Ordered polyline of the predicted spread front.
    #[serde(alias = "spreadZone")]
    pub spread_zone: Vec<LatLon>,
    /// The hazard the prediction was computed for.
    #[serde(default, alias = "fireId", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub fire_id: Option<HazardId>,
    /// Qualitative risk level.
    #[serde(default, alias = "riskLevel", skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub risk_level: Option<String>,
}

/// Economic damage estimate for the current hazard picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DamageEstimate {
    /// Estimated damage in US dollars.
    #[serde(alias = "estimatedDamageUsd")]
    #[ts(as = "String")]
    pub estimated_damage_usd: Decimal,
    /// Burned or threatened area in square kilometres.
    #[serde(default, alias = "areaAffectedKm2", skip_serializing_if = "Option::is_none")]
    #[ts(as = "Option<String>")]
    pub area_affected_km2: Option<Decimal>,
    /// Currency code reported by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub currency: Option<String>,
}

impl DamageEstimate {
    /// Build an estimate with only the dollar figure.
    pub const fn new(estimated_damage_usd: Decimal) -> Self {
        Self {
            estimated_damage_usd,
            area_affected_km2: None,
            currency: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Source health
// ---------------------------------------------------------------------------

/// Health of a single telemetry source across cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SourceHealth {
    /// When the source last answered successfully.
    pub last_success_at: Option<DateTime<Utc>>,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// Reason for the most recent failure, cleared on success.
    pub last_error: Option<String>,
}

impl SourceHealth {
    /// Whether the most recent attempt succeeded.
    pub const fn is_healthy(&self) -> bool {
        self.consecutive_failures == 0 && self.last_success_at.is_some()
    }

    /// Record a successful retrieval.
    pub fn record_success(&mut self, at: DateTime<Utc>) {
        self.last_success_at = Some(at);
        self.consecutive_failures = 0;
        self.last_error = None;
    }

    /// Record a failed retrieval.
    pub fn record_failure(&mut self, reason: impl Into<String>) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(reason.into());
    }
}

/// Health of all three sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SourceHealthSet {
    /// Detection source health.
    pub detections: SourceHealth,
    /// Prediction source health.
    pub prediction: SourceHealth,
    /// Damage source health.
    pub damage: SourceHealth,
}

impl SourceHealthSet {
    /// Health of one source.
    pub const fn get(&self, kind: SourceKind) -> &SourceHealth {
        match kind {
            SourceKind::Detections => &self.detections,
            SourceKind::Prediction => &self.prediction,
            SourceKind::Damage => &self.damage,
        }
    }

    /// Mutable health of one source.
    pub const fn get_mut(&mut self, kind: SourceKind) -> &mut SourceHealth {
        match kind {
            SourceKind::Detections => &mut self.detections,
            SourceKind::Prediction => &mut self.prediction,
            SourceKind::Damage => &mut self.damage,
        }
    }

    /// Sources whose most recent attempt failed.
    pub fn failing(&self) -> Vec<SourceKind> {
        SourceKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).consecutive_failures > 0)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// One cycle's merged, consistent view of all three sources.
///
/// A new snapshot fully replaces the previous one. Sources that failed
/// during the cycle carry their previous value; sources that never
/// succeeded stay absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// Number of the cycle that produced this snapshot (0 = none yet).
    pub cycle: u64,
    /// Detected hazards in arrival order, unique by id.
    pub events: Vec<HazardEvent>,
    /// Latest spread prediction, if one was ever received.
    pub prediction: Option<SpreadPrediction>,
    /// Latest damage estimate, if one was ever received.
    pub damage: Option<DamageEstimate>,
    /// When any source last contributed fresh data. `None` until the first
    /// successful retrieval.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Per-source health as of this cycle.
    pub health: SourceHealthSet,
}

// ---------------------------------------------------------------------------
// Render model
// ---------------------------------------------------------------------------

/// The event the viewport is currently following.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FocusPoint {
    /// The followed hazard. Always present in the current snapshot.
    pub event_id: HazardId,
    /// The hazard's position in the current snapshot.
    pub position: LatLon,
}

/// Suggested map viewport.
///
/// Adapters should only pan when [`revision`](Self::revision) changes, so
/// a user who has panned away is not dragged back on every render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Viewport {
    /// Map center.
    pub center: LatLon,
    /// Tile zoom level.
    pub zoom: u8,
    /// Incremented every time the follower moves the center.
    pub revision: u64,
}

/// Sidebar summary of the current spread prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PredictionSummary {
    /// Compass direction of spread.
    pub direction: String,
    /// Prediction horizon.
    pub timeframe: String,
    /// Qualitative risk level, if reported.
    pub risk_level: Option<String>,
}

/// Read-only projection of the current snapshot plus viewport focus.
///
/// Produced by the derivation pipeline and consumed by presentation
/// adapters. Adapters receive shared references and never mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RenderModel {
    /// Cycle of the snapshot this model was derived from.
    pub cycle: u64,
    /// Markers to draw, in arrival order.
    pub events: Vec<HazardEvent>,
    /// Number of active fires (sidebar counter).
    pub active_fire_count: u32,
    /// Predicted spread polyline. `None` suppresses the overlay entirely.
    pub overlay_polyline: Option<Vec<LatLon>>,
    /// Event the viewport is following.
    pub focus_point: Option<FocusPoint>,
    /// Id the viewport last centered on. Survives cycles with no events, so
    /// a hazard that disappears and returns does not re-center the map.
    pub followed_event: Option<HazardId>,
    /// Suggested viewport.
    pub viewport: Viewport,
    /// Prediction sidebar card.
    pub prediction: Option<PredictionSummary>,
    /// Spread direction, or a pending label.
    pub prediction_label: String,
    /// Latest damage estimate.
    pub damage: Option<DamageEstimate>,
    /// Damage formatted as millions of dollars (e.g. `$2.50M`).
    pub damage_label: String,
    /// When the underlying data was last refreshed.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Human-readable form of [`fetched_at`](Self::fetched_at).
    pub last_sync_label: String,
    /// Whether the data is older than the freshness bound.
    pub is_stale: bool,
    /// Per-source health.
    pub sources: SourceHealthSet,
}

impl RenderModel {
    /// The model shown before the first cycle completes.
    pub fn initial(viewport: Viewport) -> Self {
        Self {
            cycle: 0,
            events: Vec::new(),
            active_fire_count: 0,
            overlay_polyline: None,
            focus_point: None,
            followed_event: None,
            viewport,
            prediction: None,
            prediction_label: PREDICTION_PENDING_LABEL.to_owned(),
            damage: None,
            damage_label: DAMAGE_PENDING_LABEL.to_owned(),
            fetched_at: None,
            last_sync_label: NEVER_SYNCED_LABEL.to_owned(),
            is_stale: true,
            sources: SourceHealthSet::default(),
        }
    }

    /// Whether any cycle has been applied yet.
    pub const fn has_synced(&self) -> bool {
        self.fetched_at.is_some()
    }
}
