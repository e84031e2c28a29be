//! Read-only REST handlers for the Observer server.
//!
//! All handlers read the current model from the [`RenderStore`] held in
//! [`AppState`]. Reads never block the sync pipeline.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/api/render-model` | Current render model |
//!
//! [`RenderStore`]: firewatch_sync::RenderStore

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{Html, IntoResponse};
use firewatch_types::SyncState;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page with the sidebar figures and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let model = state.store.current();
    let cycle = model.cycle;
    let fires = model.active_fire_count;
    let direction = &model.prediction_label;
    let damage = &model.damage_label;
    let last_sync = &model.last_sync_label;
    let sync_state = state
        .sync
        .as_ref()
        .map_or("DETACHED", |sync| match sync.state() {
            SyncState::Running => "RUNNING",
            SyncState::Stopped => "STOPPED",
        });
    let (freshness_class, freshness) = if model.is_stale {
        ("stale", "STALE")
    } else {
        ("fresh", "LIVE")
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>FireWatch Observer</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #f0883e; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #f0883e; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        a:hover {{ text-decoration: underline; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .fresh {{ color: #3fb950; font-weight: bold; }}
        .stale {{ color: #f85149; font-weight: bold; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>FireWatch Observer</h1>
    <p class="subtitle">Live hazard sync engine</p>

    <p>Sync: <strong>{sync_state}</strong> &middot; Data: <span class="{freshness_class}">{freshness}</span> &middot; Last sync: {last_sync}</p>

    <div>
        <div class="metric">
            <div class="label">Cycle</div>
            <div class="value">{cycle}</div>
        </div>
        <div class="metric">
            <div class="label">Active fires</div>
            <div class="value">{fires}</div>
        </div>
        <div class="metric">
            <div class="label">Spread</div>
            <div class="value">{direction}</div>
        </div>
        <div class="metric">
            <div class="label">Damage</div>
            <div class="value">{damage}</div>
        </div>
    </div>

    <hr>

    <h2>API Endpoints</h2>
    <ul>
        <li>GET <a href="/api/render-model">/api/render-model</a> -- Current render model</li>
        <li>GET <a href="/api/status">/api/status</a> -- Scheduler status and counters</li>
        <li>GET <a href="/health">/health</a> -- Liveness probe</li>
        <li>POST /api/sync/start -- Start polling</li>
        <li>POST /api/sync/stop -- Stop polling</li>
    </ul>

    <h2>WebSocket</h2>
    <ul>
        <li><code>ws://host:port/ws/render-model</code> -- Live render model stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe. Always `200 OK` while the server is up.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// GET /api/render-model
// ---------------------------------------------------------------------------

/// Return the current render model.
pub async fn get_render_model(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let model = state.store.current();
    Ok(Json(serde_json::to_value(model.as_ref())?))
}
