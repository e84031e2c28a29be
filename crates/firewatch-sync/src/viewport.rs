//! Viewport follower: decides when the map should re-center on new data.
//!
//! The follower only moves the map when the *primary* event changes
//! identity. Updates to the same hazard (intensity, metadata, even a
//! nudged coordinate) never re-center, so a user who has panned away is
//! not dragged back every cycle.

use firewatch_types::{FocusPoint, HazardEvent, HazardId, Viewport};

/// The event that drives automatic focus: the first one in arrival order.
pub fn primary_event(events: &[HazardEvent]) -> Option<&HazardEvent> {
    events.first()
}

/// Outcome of one follower step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowDecision {
    /// Event now being followed. Always one of the current events.
    pub focus: Option<FocusPoint>,
    /// Id the viewport is centered on, kept across empty cycles.
    pub followed: Option<HazardId>,
    /// Viewport after the step.
    pub viewport: Viewport,
    /// Whether the center moved during this step.
    pub moved: bool,
}

/// Apply the follow policy to a new set of events.
///
/// - Primary id differs from `previously_followed`: center on the primary
///   event and bump the viewport revision.
/// - Same primary id: keep the viewport, refresh the focus position.
/// - No events: drop the focus reference but keep the last center and the
///   followed id. On the first-ever empty state the previous viewport is
///   the configured home.
pub fn follow(
    previously_followed: Option<HazardId>,
    previous_viewport: Viewport,
    events: &[HazardEvent],
) -> FollowDecision {
    let Some(primary) = primary_event(events) else {
        return FollowDecision {
            focus: None,
            followed: previously_followed,
            viewport: previous_viewport,
            moved: false,
        };
    };

    let position = primary.position();
    let focus = Some(FocusPoint {
        event_id: primary.id,
        position,
    });

    if previously_followed == Some(primary.id) {
        return FollowDecision {
            focus,
            followed: previously_followed,
            viewport: previous_viewport,
            moved: false,
        };
    }

    FollowDecision {
        focus,
        followed: Some(primary.id),
        viewport: Viewport {
            center: position,
            zoom: previous_viewport.zoom,
            revision: previous_viewport.revision.saturating_add(1),
        },
        moved: true,
    }
}
