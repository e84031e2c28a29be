//! Snapshot merge: folding one cycle's outcomes into the next snapshot.
//!
//! # Merge rules
//!
//! - A successful source replaces its field wholesale. Nothing is merged
//!   field-by-field across cycles.
//! - A failed source carries its previous value forward unchanged.
//! - A source that has never succeeded stays absent.
//! - `fetched_at` advances only when at least one source succeeded and
//!   never moves backwards, so a run of total failures ages the snapshot
//!   until it is flagged stale.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use firewatch_types::{HazardEvent, HazardId, Snapshot, SourceKind};
use tracing::{debug, warn};

use crate::fetcher::{CycleOutcomes, FetchOutcome};

/// Make a detection batch internally consistent.
///
/// Duplicate ids resolve last-write-wins: the surviving record keeps the
/// position of the first occurrence (so marker order stays stable) and the
/// contents of the last. Events with out-of-range coordinates are dropped.
pub fn normalize_events(raw: Vec<HazardEvent>) -> Vec<HazardEvent> {
    let mut positions: HashMap<HazardId, usize> = HashMap::with_capacity(raw.len());
    let mut events: Vec<HazardEvent> = Vec::with_capacity(raw.len());

    for event in raw {
        if !event.position().is_valid() {
            warn!(
                id = %event.id,
                lat = event.lat,
                lon = event.lon,
                "dropping detection with invalid coordinates"
            );
            continue;
        }
        if let Some(&index) = positions.get(&event.id) {
            debug!(id = %event.id, "duplicate detection id, keeping latest record");
            if let Some(slot) = events.get_mut(index) {
                *slot = event;
            }
        } else {
            positions.insert(event.id, events.len());
            events.push(event);
        }
    }

    events
}

/// Build the snapshot for `cycle` from the previous snapshot and this
/// cycle's outcomes.
pub fn merge_snapshot(
    previous: &Snapshot,
    outcomes: CycleOutcomes,
    cycle: u64,
    completed_at: DateTime<Utc>,
) -> Snapshot {
    let mut health = previous.health.clone();
    let any_success = outcomes.any_success();

    for failure in outcomes.failures() {
        health.get_mut(failure.kind()).record_failure(failure.to_string());
    }

    let events = match outcomes.detections {
        FetchOutcome::Success(raw) => {
            health.get_mut(SourceKind::Detections).record_success(completed_at);
            normalize_events(raw)
        }
        FetchOutcome::Failure(_) => previous.events.clone(),
    };

    let prediction = match outcomes.prediction {
        FetchOutcome::Success(prediction) => {
            health.get_mut(SourceKind::Prediction).record_success(completed_at);
            prediction
        }
        FetchOutcome::Failure(_) => previous.prediction.clone(),
    };

    let damage = match outcomes.damage {
        FetchOutcome::Success(damage) => {
            health.get_mut(SourceKind::Damage).record_success(completed_at);
            damage
        }
        FetchOutcome::Failure(_) => previous.damage.clone(),
    };

    let fetched_at = if any_success {
        Some(
            previous
                .fetched_at
                .map_or(completed_at, |prev| prev.max(completed_at)),
        )
    } else {
        previous.fetched_at
    };

    Snapshot {
        cycle,
        events,
        prediction,
        damage,
        fetched_at,
        health,
    }
}
