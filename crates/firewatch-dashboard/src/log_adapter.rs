//! Presentation adapter that narrates render models to the log.
//!
//! Stands in for a map renderer when the dashboard runs headless: it emits
//! one line per real viewport move and per staleness transition, and a
//! debug line for every model.

use firewatch_sync::PresentationAdapter;
use firewatch_types::RenderModel;
use tracing::{debug, info, warn};

/// Logs the draw calls a map renderer would make.
#[derive(Debug, Default)]
pub struct LogAdapter {
    last_revision: Option<u64>,
    last_stale: Option<bool>,
    renders: u64,
}

impl LogAdapter {
    /// Create an adapter that has not rendered anything yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of models rendered so far.
    #[cfg(test)]
    pub const fn renders(&self) -> u64 {
        self.renders
    }
}

impl PresentationAdapter for LogAdapter {
    fn render(&mut self, model: &RenderModel) {
        self.renders = self.renders.saturating_add(1);

        debug!(
            cycle = model.cycle,
            markers = model.events.len(),
            overlay = model.overlay_polyline.is_some(),
            prediction = %model.prediction_label,
            damage = %model.damage_label,
            last_sync = %model.last_sync_label,
            "render"
        );

        // Pan only on real moves so user panning is never overridden.
        if self.last_revision != Some(model.viewport.revision) {
            if self.last_revision.is_some() {
                info!(
                    lat = model.viewport.center.lat(),
                    lon = model.viewport.center.lon(),
                    zoom = model.viewport.zoom,
                    focus = ?model.focus_point.map(|f| f.event_id.into_inner()),
                    "map recentred"
                );
            }
            self.last_revision = Some(model.viewport.revision);
        }

        if self.last_stale != Some(model.is_stale) {
            if model.is_stale && model.has_synced() {
                warn!(
                    last_sync = %model.last_sync_label,
                    failing = ?model.sources.failing(),
                    "hazard data is stale"
                );
            } else if !model.is_stale {
                info!(
                    active_fires = model.active_fire_count,
                    last_sync = %model.last_sync_label,
                    "hazard data is live"
                );
            }
            self.last_stale = Some(model.is_stale);
        }
    }
}
