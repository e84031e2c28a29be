//! Shared type definitions for the FireWatch live hazard dashboard.
//!
//! This crate is the single source of truth for the data that flows from
//! the telemetry services through the sync engine to presentation adapters.
//! Types flow downstream to `TypeScript` via `ts-rs` for the browser map
//! client.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for service-assigned identifiers
//! - [`enums`] -- Intensity levels, source kinds, scheduler lifecycle
//! - [`structs`] -- Telemetry records, snapshots, and the render model

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Intensity, SourceKind, SyncState};
pub use ids::HazardId;
pub use structs::{
    DAMAGE_PENDING_LABEL, DamageEstimate, FocusPoint, HazardEvent, LatLon, NEVER_SYNCED_LABEL,
    PREDICTION_PENDING_LABEL, PredictionSummary, RenderModel, Snapshot, SourceHealth,
    SourceHealthSet, SpreadPrediction, Viewport,
};
