//! Shared application state for the Observer API server.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use firewatch_sync::{RenderStore, SyncControl};

use crate::error::ObserverError;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The store
/// is the read side of the sync pipeline; `sync` is present when a
/// scheduler is attached and enables the operator endpoints.
#[derive(Clone)]
pub struct AppState {
    /// The render store published to by the scheduler.
    pub store: Arc<RenderStore>,
    /// Lifecycle control of the scheduler, if one is attached.
    pub sync: Option<Arc<dyn SyncControl>>,
    /// When the observer was started.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Create a read-only state with no scheduler attached.
    pub fn new(store: Arc<RenderStore>) -> Self {
        Self {
            store,
            sync: None,
            started_at: Utc::now(),
        }
    }

    /// Create a state with scheduler control attached.
    pub fn with_sync(store: Arc<RenderStore>, sync: Arc<dyn SyncControl>) -> Self {
        Self {
            store,
            sync: Some(sync),
            started_at: Utc::now(),
        }
    }

    /// The attached scheduler control.
    pub fn sync(&self) -> Result<&Arc<dyn SyncControl>, ObserverError> {
        self.sync.as_ref().ok_or(ObserverError::SyncUnavailable)
    }
}
