//! Snapshot fetcher: the three independent retrievals of one cycle.
//!
//! A [`HazardFeed`] abstracts where telemetry comes from (the HTTP services
//! in production, scripted fakes in tests). [`fetch_cycle`] runs the three
//! retrievals concurrently and always returns one [`FetchOutcome`] per
//! source, even when every source fails. No retry happens here: the next
//! scheduled cycle is the retry.

use std::future::Future;
use std::sync::Arc;

use firewatch_types::{DamageEstimate, HazardEvent, SourceKind, SpreadPrediction};
use tracing::warn;

/// Why a single source retrieval failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceFailure {
    /// The request never produced a response (DNS, connect, reset).
    #[error("{kind} request failed: {message}")]
    Transport {
        /// The failing source.
        kind: SourceKind,
        /// Description of the transport error.
        message: String,
    },

    /// The request exceeded its deadline.
    #[error("{kind} request timed out after {timeout_ms}ms")]
    Timeout {
        /// The failing source.
        kind: SourceKind,
        /// The deadline in milliseconds.
        timeout_ms: u64,
    },

    /// The service answered with a non-success status.
    #[error("{kind} returned HTTP {status}")]
    Status {
        /// The failing source.
        kind: SourceKind,
        /// The HTTP status code.
        status: u16,
    },

    /// The body could not be decoded into the expected record shape.
    #[error("{kind} payload malformed: {message}")]
    Malformed {
        /// The failing source.
        kind: SourceKind,
        /// Description of the decode error.
        message: String,
    },
}

impl SourceFailure {
    /// The source that failed.
    pub const fn kind(&self) -> SourceKind {
        match self {
            Self::Transport { kind, .. }
            | Self::Timeout { kind, .. }
            | Self::Status { kind, .. }
            | Self::Malformed { kind, .. } => *kind,
        }
    }
}

/// Result of one source retrieval within a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// The source answered with a decodable payload.
    Success(T),
    /// The source failed; the previous value must be carried forward.
    Failure(SourceFailure),
}

impl<T> FetchOutcome<T> {
    /// Whether the retrieval succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The failure, if any.
    pub const fn failure(&self) -> Option<&SourceFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }
}

impl<T> From<Result<T, SourceFailure>> for FetchOutcome<T> {
    fn from(result: Result<T, SourceFailure>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(failure) => Self::Failure(failure),
        }
    }
}

/// The three per-source outcomes of one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcomes {
    /// Detection retrieval.
    pub detections: FetchOutcome<Vec<HazardEvent>>,
    /// Prediction retrieval. `Success(None)` means "not yet computed".
    pub prediction: FetchOutcome<Option<SpreadPrediction>>,
    /// Damage retrieval. `Success(None)` means "no estimate".
    pub damage: FetchOutcome<Option<DamageEstimate>>,
}

impl CycleOutcomes {
    /// Failures in source order.
    pub fn failures(&self) -> Vec<&SourceFailure> {
        [
            self.detections.failure(),
            self.prediction.failure(),
            self.damage.failure(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Whether at least one source succeeded.
    pub const fn any_success(&self) -> bool {
        self.detections.is_success() || self.prediction.is_success() || self.damage.is_success()
    }

    /// Whether every source failed.
    pub const fn all_failed(&self) -> bool {
        !self.any_success()
    }
}

/// A source of hazard telemetry.
///
/// The three retrievals are read-only and idempotent; the engine assumes no
/// ordering between them. Implementations must be cheap to share across
/// tasks.
pub trait HazardFeed: Send + Sync + 'static {
    /// Retrieve the current fire detections.
    fn fetch_detections(
        &self,
    ) -> impl Future<Output = Result<Vec<HazardEvent>, SourceFailure>> + Send;

    /// Retrieve the current spread prediction, if one has been computed.
    fn fetch_prediction(
        &self,
    ) -> impl Future<Output = Result<Option<SpreadPrediction>, SourceFailure>> + Send;

    /// Retrieve the current damage estimate, if one exists.
    fn fetch_damage(
        &self,
    ) -> impl Future<Output = Result<Option<DamageEstimate>, SourceFailure>> + Send;
}

impl<T: HazardFeed> HazardFeed for Arc<T> {
    fn fetch_detections(
        &self,
    ) -> impl Future<Output = Result<Vec<HazardEvent>, SourceFailure>> + Send {
        T::fetch_detections(self)
    }

    fn fetch_prediction(
        &self,
    ) -> impl Future<Output = Result<Option<SpreadPrediction>, SourceFailure>> + Send {
        T::fetch_prediction(self)
    }

    fn fetch_damage(
        &self,
    ) -> impl Future<Output = Result<Option<DamageEstimate>, SourceFailure>> + Send {
        T::fetch_damage(self)
    }
}

/// Run the three retrievals of one cycle concurrently.
///
/// A failure on one source never blocks or alters the others.
pub async fn fetch_cycle<F: HazardFeed>(feed: &F) -> CycleOutcomes {
    let (detections, prediction, damage) = tokio::join!(
        feed.fetch_detections(),
        feed.fetch_prediction(),
        feed.fetch_damage(),
    );

    let outcomes = CycleOutcomes {
        detections: detections.into(),
        prediction: prediction.into(),
        damage: damage.into(),
    };

    for failure in outcomes.failures() {
        warn!(source = %failure.kind(), error = %failure, "source retrieval failed");
    }

    outcomes
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use firewatch_types::HazardId;
    use rust_decimal_macros::dec;

    use super::*;

    /// Feed whose prediction source always fails and whose detections take
    /// longer than the other two sources.
    struct PartialFeed {
        calls: AtomicU32,
    }

    impl HazardFeed for PartialFeed {
        async fn fetch_detections(&self) -> Result<Vec<HazardEvent>, SourceFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(vec![HazardEvent::new(HazardId::new(1), 53.08, 70.3, "high")])
        }

        async fn fetch_prediction(&self) -> Result<Option<SpreadPrediction>, SourceFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SourceFailure::Status {
                kind: SourceKind::Prediction,
                status: 503,
            })
        }

        async fn fetch_damage(&self) -> Result<Option<DamageEstimate>, SourceFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(DamageEstimate::new(dec!(2500000))))
        }
    }

    struct DeadFeed;

    impl HazardFeed for DeadFeed {
        async fn fetch_detections(&self) -> Result<Vec<HazardEvent>, SourceFailure> {
            Err(SourceFailure::Timeout {
                kind: SourceKind::Detections,
                timeout_ms: 2500,
            })
        }

        async fn fetch_prediction(&self) -> Result<Option<SpreadPrediction>, SourceFailure> {
            Err(SourceFailure::Transport {
                kind: SourceKind::Prediction,
                message: "connection refused".to_owned(),
            })
        }

        async fn fetch_damage(&self) -> Result<Option<DamageEstimate>, SourceFailure> {
            Err(SourceFailure::Malformed {
                kind: SourceKind::Damage,
                message: "expected value".to_owned(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_does_not_affect_other_sources() {
        let feed = PartialFeed {
            calls: AtomicU32::new(0),
        };
        let outcomes = fetch_cycle(&feed).await;

        assert_eq!(feed.calls.load(Ordering::SeqCst), 3);
        assert!(outcomes.detections.is_success());
        assert!(!outcomes.prediction.is_success());
        assert_eq!(
            outcomes.damage,
            FetchOutcome::Success(Some(DamageEstimate::new(dec!(2500000))))
        );
        assert_eq!(outcomes.failures().len(), 1);
        assert!(outcomes.any_success());
    }

    #[tokio::test]
    async fn all_failures_still_yield_three_outcomes() {
        let outcomes = fetch_cycle(&DeadFeed).await;
        let kinds: Vec<SourceKind> = outcomes.failures().iter().map(|f| f.kind()).collect();
        assert_eq!(
            kinds,
            vec![SourceKind::Detections, SourceKind::Prediction, SourceKind::Damage]
        );
        assert!(outcomes.all_failed());
    }

    #[test]
    fn failure_messages_name_the_source() {
        let failure = SourceFailure::Status {
            kind: SourceKind::Damage,
            status: 500,
        };
        assert_eq!(failure.to_string(), "damage returned HTTP 500");
    }
}
