//! View state derivation: snapshot to render model.
//!
//! Everything here is a pure function of its inputs. The caller supplies
//! `now` so staleness is reproducible in tests and never reads a clock
//! behind the caller's back.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use firewatch_types::{
    DAMAGE_PENDING_LABEL, DamageEstimate, LatLon, NEVER_SYNCED_LABEL, PREDICTION_PENDING_LABEL,
    PredictionSummary, RenderModel, Snapshot, SpreadPrediction,
};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::viewport;

/// Dollars per million, for the sidebar damage figure.
const USD_PER_MILLION: u32 = 1_000_000;

/// Freshness bound: data older than `interval * multiplier` is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StalenessPolicy {
    interval: Duration,
    multiplier: u32,
}

impl StalenessPolicy {
    /// Build a policy from the polling interval and multiplier.
    pub const fn new(interval: Duration, multiplier: u32) -> Self {
        Self {
            interval,
            multiplier,
        }
    }

    /// Maximum acceptable data age.
    pub fn bound(&self) -> Duration {
        self.interval
            .checked_mul(self.multiplier)
            .unwrap_or(Duration::MAX)
    }

    /// Whether data fetched at `fetched_at` is stale at `now`.
    ///
    /// Data that was never fetched is always stale. A `fetched_at` in the
    /// future (clock skew) is treated as fresh.
    pub fn is_stale(&self, fetched_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        let Some(fetched_at) = fetched_at else {
            return true;
        };
        let bound = TimeDelta::from_std(self.bound()).unwrap_or(TimeDelta::MAX);
        now.signed_duration_since(fetched_at) > bound
    }
}

/// Derive the next render model from the previous one and a new snapshot.
pub fn derive_render_model(
    previous: &RenderModel,
    snapshot: &Snapshot,
    now: DateTime<Utc>,
    policy: &StalenessPolicy,
) -> RenderModel {
    let follow = viewport::follow(
        previous.followed_event,
        previous.viewport,
        &snapshot.events,
    );

    RenderModel {
        cycle: snapshot.cycle,
        events: snapshot.events.clone(),
        active_fire_count: u32::try_from(snapshot.events.len()).unwrap_or(u32::MAX),
        overlay_polyline: overlay_polyline(snapshot.prediction.as_ref()),
        focus_point: follow.focus,
        followed_event: follow.followed,
        viewport: follow.viewport,
        prediction: snapshot.prediction.as_ref().map(prediction_summary),
        prediction_label: prediction_label(snapshot.prediction.as_ref()),
        damage: snapshot.damage.clone(),
        damage_label: damage_label(snapshot.damage.as_ref()),
        fetched_at: snapshot.fetched_at,
        last_sync_label: sync_label(snapshot.fetched_at),
        is_stale: policy.is_stale(snapshot.fetched_at, now),
        sources: snapshot.health.clone(),
    }
}

/// Re-evaluate only the staleness flag of an existing model.
///
/// Returns `Some` with the updated model when the flag flips, `None` when
/// nothing changed. Lets a stuck scheduler surface staleness without a new
/// snapshot.
pub fn refresh_staleness(
    model: &RenderModel,
    now: DateTime<Utc>,
    policy: &StalenessPolicy,
) -> Option<RenderModel> {
    let is_stale = policy.is_stale(model.fetched_at, now);
    (is_stale != model.is_stale).then(|| RenderModel {
        is_stale,
        ..model.clone()
    })
}

/// The spread polyline, or `None` when there is nothing drawable.
///
/// Fewer than two points is degenerate and suppresses the overlay.
pub fn overlay_polyline(prediction: Option<&SpreadPrediction>) -> Option<Vec<LatLon>> {
    prediction
        .filter(|p| p.spread_zone.len() >= 2)
        .map(|p| p.spread_zone.clone())
}

/// Format a damage estimate as millions of dollars, e.g. `$2.50M`.
pub fn damage_label(damage: Option<&DamageEstimate>) -> String {
    let Some(millions) = damage.and_then(|d| {
        d.estimated_damage_usd
            .checked_div(Decimal::from(USD_PER_MILLION))
    }) else {
        return DAMAGE_PENDING_LABEL.to_owned();
    };
    let rounded = millions.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("${rounded:.2}M")
}

/// Format the last refresh time, e.g. `14:03:27 UTC`.
pub fn sync_label(fetched_at: Option<DateTime<Utc>>) -> String {
    fetched_at.map_or_else(
        || NEVER_SYNCED_LABEL.to_owned(),
        |at| at.format("%H:%M:%S UTC").to_string(),
    )
}

fn prediction_label(prediction: Option<&SpreadPrediction>) -> String {
    prediction.map_or_else(
        || PREDICTION_PENDING_LABEL.to_owned(),
        |p| p.direction.clone(),
    )
}

fn prediction_summary(prediction: &SpreadPrediction) -> PredictionSummary {
    PredictionSummary {
        direction: prediction.direction.clone(),
        timeframe: prediction.timeframe.clone(),
        risk_level: prediction.risk_level.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use firewatch_types::{HazardEvent, HazardId, Viewport};
    use rust_decimal_macros::dec;

    use super::*;

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_720_000_000_000 + millis).unwrap()
    }

    fn policy() -> StalenessPolicy {
        StalenessPolicy::new(Duration::from_millis(3000), 2)
    }

    fn initial() -> RenderModel {
        RenderModel::initial(Viewport {
            center: LatLon::new(37.7749, -122.4194),
            zoom: 10,
            revision: 0,
        })
    }

    fn scenario_snapshot() -> Snapshot {
        Snapshot {
            cycle: 1,
            events: vec![HazardEvent::new(HazardId::new(1), 53.08, 70.3, "high")],
            prediction: Some(SpreadPrediction {
                direction: "NE".to_owned(),
                timeframe: "12h".to_owned(),
                spread_zone: vec![LatLon::new(53.08, 70.3), LatLon::new(53.10, 70.33)],
                fire_id: None,
                risk_level: Some("High".to_owned()),
            }),
            damage: Some(DamageEstimate::new(dec!(2500000))),
            fetched_at: Some(at(0)),
            health: Default::default(),
        }
    }

    #[test]
    fn scenario_renders_one_fire_with_overlay() {
        let model = derive_render_model(&initial(), &scenario_snapshot(), at(10), &policy());

        assert_eq!(model.events.len(), 1);
        assert_eq!(model.active_fire_count, 1);
        assert_eq!(model.overlay_polyline.as_ref().map(Vec::len), Some(2));
        assert_eq!(model.damage_label, "$2.50M");
        assert_eq!(model.prediction_label, "NE");
        assert!(!model.is_stale);
        assert_eq!(model.focus_point.map(|f| f.event_id), Some(HazardId::new(1)));
        assert_eq!(model.viewport.center, LatLon::new(53.08, 70.3));
        assert_eq!(model.cycle, 1);
    }

    #[test]
    fn absent_prediction_suppresses_overlay() {
        let mut snapshot = scenario_snapshot();
        snapshot.prediction = None;
        let model = derive_render_model(&initial(), &snapshot, at(0), &policy());
        assert!(model.overlay_polyline.is_none());
        assert!(model.prediction.is_none());
        assert_eq!(model.prediction_label, PREDICTION_PENDING_LABEL);
    }

    #[test]
    fn degenerate_zone_suppresses_overlay() {
        let mut snapshot = scenario_snapshot();
        if let Some(prediction) = snapshot.prediction.as_mut() {
            prediction.spread_zone.truncate(1);
        }
        let model = derive_render_model(&initial(), &snapshot, at(0), &policy());
        assert!(model.overlay_polyline.is_none());
        assert_eq!(model.prediction_label, "NE");
    }

    #[test]
    fn events_keep_arrival_order() {
        let mut snapshot = scenario_snapshot();
        snapshot.events = vec![
            HazardEvent::new(HazardId::new(9), 1.0, 1.0, "low"),
            HazardEvent::new(HazardId::new(3), 2.0, 2.0, "extreme"),
            HazardEvent::new(HazardId::new(5), 3.0, 3.0, "high"),
        ];
        let model = derive_render_model(&initial(), &snapshot, at(0), &policy());
        let ids: Vec<u64> = model.events.iter().map(|e| e.id.into_inner()).collect();
        assert_eq!(ids, vec![9, 3, 5]);
    }

    #[test]
    fn hazard_returning_after_empty_cycle_keeps_viewport() {
        let first = derive_render_model(&initial(), &scenario_snapshot(), at(0), &policy());

        let mut empty = scenario_snapshot();
        empty.cycle = 2;
        empty.events.clear();
        let cleared = derive_render_model(&first, &empty, at(10), &policy());
        assert!(cleared.focus_point.is_none());
        assert_eq!(cleared.followed_event, Some(HazardId::new(1)));

        let mut back = scenario_snapshot();
        back.cycle = 3;
        let returned = derive_render_model(&cleared, &back, at(20), &policy());
        assert_eq!(returned.viewport, first.viewport);
        assert_eq!(returned.focus_point.map(|f| f.event_id), Some(HazardId::new(1)));
    }

    #[test]
    fn staleness_threshold_is_twice_the_interval() {
        let policy = policy();
        assert!(!policy.is_stale(Some(at(0)), at(6000)));
        assert!(policy.is_stale(Some(at(0)), at(6001)));
        assert!(policy.is_stale(None, at(0)));
        assert!(!policy.is_stale(Some(at(5000)), at(0)));
    }

    #[test]
    fn refresh_staleness_only_reports_flips() {
        let model = derive_render_model(&initial(), &scenario_snapshot(), at(0), &policy());
        assert!(refresh_staleness(&model, at(1000), &policy()).is_none());

        let stale = refresh_staleness(&model, at(7000), &policy()).unwrap();
        assert!(stale.is_stale);
        assert_eq!(stale.events, model.events);
        assert_eq!(stale.viewport, model.viewport);
    }

    #[test]
    fn damage_label_rounds_to_two_decimals() {
        assert_eq!(damage_label(Some(&DamageEstimate::new(dec!(2500000)))), "$2.50M");
        assert_eq!(damage_label(Some(&DamageEstimate::new(dec!(1234567.89)))), "$1.23M");
        assert_eq!(damage_label(Some(&DamageEstimate::new(dec!(1235000)))), "$1.24M");
        assert_eq!(damage_label(Some(&DamageEstimate::new(dec!(750000)))), "$0.75M");
        assert_eq!(damage_label(None), DAMAGE_PENDING_LABEL);
    }

    #[test]
    fn sync_label_is_cosmetic() {
        let time = Utc.with_ymd_and_hms(2024, 7, 1, 14, 3, 27).unwrap();
        assert_eq!(sync_label(Some(time)), "14:03:27 UTC");
        assert_eq!(sync_label(None), NEVER_SYNCED_LABEL);
    }
}
