//! HTTP implementation of [`HazardFeed`] over `reqwest`.
//!
//! Each retrieval is a plain `GET` against one of the three telemetry
//! endpoints. Transport errors, timeouts, non-success statuses, and
//! undecodable bodies are all normalized into [`SourceFailure`] so the
//! scheduler can carry the previous value forward.

use std::time::Duration;

use firewatch_types::{DamageEstimate, HazardEvent, SourceKind, SpreadPrediction};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::{ConfigError, SourcesConfig};
use crate::fetcher::{HazardFeed, SourceFailure};

/// Hazard feed backed by the detection, prediction, and damage services.
#[derive(Debug, Clone)]
pub struct HttpHazardFeed {
    client: reqwest::Client,
    detections_url: String,
    prediction_url: String,
    damage_url: String,
    timeout: Duration,
}

impl HttpHazardFeed {
    /// Build a feed from the configured endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the HTTP client cannot be built.
    pub fn new(config: &SourcesConfig) -> Result<Self, ConfigError> {
        let timeout = config.request_timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::Invalid {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            detections_url: config.detections_url(),
            prediction_url: config.prediction_url(),
            damage_url: config.damage_url(),
            timeout,
        })
    }

    /// `GET` a URL and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        kind: SourceKind,
        url: &str,
    ) -> Result<T, SourceFailure> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceFailure::Timeout {
                    kind,
                    timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                }
            } else {
                SourceFailure::Transport {
                    kind,
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceFailure::Status {
                kind,
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| SourceFailure::Transport {
            kind,
            message: format!("failed to read body: {e}"),
        })?;
        debug!(source = %kind, bytes = body.len(), "source responded");

        decode(kind, &body)
    }
}

/// Decode a response body into the expected record shape.
fn decode<T: DeserializeOwned>(kind: SourceKind, body: &[u8]) -> Result<T, SourceFailure> {
    serde_json::from_slice(body).map_err(|e| SourceFailure::Malformed {
        kind,
        message: e.to_string(),
    })
}

impl HazardFeed for HttpHazardFeed {
    async fn fetch_detections(&self) -> Result<Vec<HazardEvent>, SourceFailure> {
        self.get_json(SourceKind::Detections, &self.detections_url)
            .await
    }

    async fn fetch_prediction(&self) -> Result<Option<SpreadPrediction>, SourceFailure> {
        self.get_json(SourceKind::Prediction, &self.prediction_url)
            .await
    }

    async fn fetch_damage(&self) -> Result<Option<DamageEstimate>, SourceFailure> {
        self.get_json(SourceKind::Damage, &self.damage_url).await
    }
}
