//! Observer API server for the FireWatch dashboard.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/render-model`) streaming every new
//!   render model to browser map clients via [`tokio::sync::watch`]
//! - **REST endpoints** for the current render model and scheduler status
//! - **Operator endpoints** to start and stop polling at runtime
//! - **Minimal HTML status page** (`GET /`) with the sidebar figures
//!
//! # Architecture
//!
//! The observer never touches the sync pipeline directly. It reads the
//! current model from the shared [`RenderStore`] and drives the scheduler
//! only through the [`SyncControl`] trait, so a slow client can never stall
//! a cycle.
//!
//! [`RenderStore`]: firewatch_sync::RenderStore
//! [`SyncControl`]: firewatch_sync::SyncControl

pub mod error;
pub mod handlers;
pub mod operator;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
