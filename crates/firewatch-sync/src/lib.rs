//! Live data synchronization engine for the FireWatch dashboard.
//!
//! This crate polls the hazard telemetry services, folds each cycle into a
//! [`Snapshot`](firewatch_types::Snapshot), derives the render model the map
//! draws, and publishes it to presentation adapters.
//!
//! # Pipeline
//!
//! ```text
//! SyncScheduler tick
//!   -> fetch_cycle (three concurrent retrievals)
//!   -> merge_snapshot (carry-forward for failed sources)
//!   -> derive_render_model (+ viewport follower)
//!   -> RenderStore::publish -> PresentationAdapter::render
//! ```
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with environment overrides
//! - [`fetcher`] -- Feed trait, per-source outcomes, concurrent cycle fetch
//! - [`http`] -- `reqwest` implementation of the feed
//! - [`snapshot`] -- Merge rules and detection normalization
//! - [`derive`] -- Pure snapshot to render model derivation
//! - [`viewport`] -- Auto-follow policy for the map center
//! - [`store`] -- Current render model and adapter subscriptions
//! - [`scheduler`] -- Fixed-rate polling with start/stop lifecycle

pub mod config;
pub mod derive;
pub mod fetcher;
pub mod http;
pub mod scheduler;
pub mod snapshot;
pub mod store;
pub mod viewport;

pub use config::{ConfigError, DashboardConfig};
pub use derive::StalenessPolicy;
pub use fetcher::{CycleOutcomes, FetchOutcome, HazardFeed, SourceFailure, fetch_cycle};
pub use http::HttpHazardFeed;
pub use scheduler::{Clock, CycleReport, SyncControl, SyncScheduler, SyncStats};
pub use store::{PresentationAdapter, RenderStore, SubscriptionId};
