//! Operator REST handlers for runtime sync control.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/api/status` | Scheduler state, counters, data freshness |
//! | `POST` | `/api/sync/start` | Start polling (no-op if running) |
//! | `POST` | `/api/sync/stop` | Stop polling (no-op if stopped) |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use firewatch_sync::SyncStats;
use firewatch_types::{SourceKind, SyncState};
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Scheduler section of the status response.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SchedulerStatus {
    /// Lifecycle state.
    pub state: SyncState,
    /// Polling interval in milliseconds.
    pub interval_ms: u64,
    /// Lifetime counters.
    pub stats: SyncStats,
}

/// Response body for `GET /api/status`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StatusResponse {
    /// Scheduler status, absent when no scheduler is attached.
    pub scheduler: Option<SchedulerStatus>,
    /// Cycle of the current render model.
    pub cycle: u64,
    /// Whether the current data is stale.
    pub is_stale: bool,
    /// When the data was last refreshed.
    pub fetched_at: Option<DateTime<Utc>>,
    /// Display form of `fetched_at`.
    pub last_sync_label: String,
    /// Sources whose most recent retrieval failed.
    pub failing_sources: Vec<SourceKind>,
    /// Seconds since the observer started.
    pub uptime_seconds: i64,
}

/// Response body for the start and stop endpoints.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ControlResponse {
    /// Whether the call changed the lifecycle state.
    pub changed: bool,
    /// Lifecycle state after the call.
    pub state: SyncState,
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Return scheduler status alongside freshness of the current model.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model = state.store.current();
    let scheduler = state.sync.as_ref().map(|sync| SchedulerStatus {
        state: sync.state(),
        interval_ms: u64::try_from(sync.interval().as_millis()).unwrap_or(u64::MAX),
        stats: sync.stats(),
    });

    Json(StatusResponse {
        scheduler,
        cycle: model.cycle,
        is_stale: model.is_stale,
        fetched_at: model.fetched_at,
        last_sync_label: model.last_sync_label.clone(),
        failing_sources: model.sources.failing(),
        uptime_seconds: Utc::now()
            .signed_duration_since(state.started_at)
            .num_seconds()
            .max(0),
    })
}

// ---------------------------------------------------------------------------
// POST /api/sync/start
// ---------------------------------------------------------------------------

/// Start polling at the scheduler's configured interval.
pub async fn start(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let sync = state.sync()?;
    let changed = sync.start_polling();
    info!(changed, "operator requested sync start");

    Ok(Json(ControlResponse {
        changed,
        state: sync.state(),
    }))
}

// ---------------------------------------------------------------------------
// POST /api/sync/stop
// ---------------------------------------------------------------------------

/// Stop polling. A cycle already in flight is discarded when it lands.
pub async fn stop(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let sync = state.sync()?;
    let changed = sync.stop_polling();
    info!(changed, "operator requested sync stop");

    Ok(Json(ControlResponse {
        changed,
        state: sync.state(),
    }))
}
