//! Sync scheduler: periodic polling with a start/stop lifecycle.
//!
//! # Cadence
//!
//! Polling is fixed-rate: ticks are measured from cycle start, not cycle
//! end, and the first cycle runs immediately on [`SyncScheduler::start`].
//! Each tick spawns at most one cycle task. A tick that arrives while a
//! cycle is still in flight is skipped, never queued, so at most one
//! fetch is outstanding at any time (including across stop and restart).
//!
//! # Epochs
//!
//! Every `start` and every `stop` opens a new epoch. A cycle remembers the
//! epoch it was launched in and its result is applied only if that epoch
//! is still current. After `stop` returns no result is ever applied, and a
//! slow cycle from before a restart cannot overwrite newer state. Discards
//! are logged and counted.
//!
//! # Locks
//!
//! Control state (lifecycle, interval, epoch) and pipeline state (current
//! snapshot) each sit behind a short synchronous lock, always taken in
//! that order. Neither is held across an `.await` or while presentation
//! adapters run, so an adapter may call back into [`SyncControl`].
//! A third lock serializes publication so a staleness refresh never
//! overwrites a newer cycle's model.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use firewatch_types::{Snapshot, SyncState};
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{MIN_INTERVAL_MS, SyncConfig};
use crate::derive::{self, StalenessPolicy};
use crate::fetcher::{self, CycleOutcomes, HazardFeed};
use crate::snapshot;
use crate::store::RenderStore;

/// Wall-clock source used to timestamp snapshots and judge staleness.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// What happened to one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleReport {
    /// The cycle completed and its snapshot became current.
    Applied {
        /// Cycle number of the new snapshot.
        cycle: u64,
        /// Number of sources that failed this cycle.
        failures: usize,
    },
    /// Another cycle was in flight; nothing was fetched.
    Skipped,
    /// The cycle completed after a stop or restart; its result was dropped.
    Discarded,
}

/// Lifetime counters for a scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    /// Cycles that began fetching.
    pub cycles_started: u64,
    /// Cycles whose snapshot was applied.
    pub cycles_applied: u64,
    /// Ticks skipped because a cycle was in flight.
    pub ticks_skipped: u64,
    /// Completed cycles dropped because their epoch had ended.
    pub results_discarded: u64,
    /// Whether a cycle is currently in flight.
    pub cycle_in_flight: bool,
}

/// Lifecycle controls exposed to operators (the observer API).
pub trait SyncControl: Send + Sync {
    /// Start polling at the configured interval. `false` if already running.
    fn start_polling(&self) -> bool;
    /// Stop polling. `false` if already stopped.
    fn stop_polling(&self) -> bool;
    /// Current lifecycle state.
    fn state(&self) -> SyncState;
    /// Current polling interval.
    fn interval(&self) -> Duration;
    /// Lifetime counters.
    fn stats(&self) -> SyncStats;
}

#[derive(Debug, Default)]
struct Counters {
    started: AtomicU64,
    applied: AtomicU64,
    skipped: AtomicU64,
    discarded: AtomicU64,
}

#[derive(Debug)]
struct Control {
    state: SyncState,
    interval: Duration,
    epoch: u64,
    timer: Option<JoinHandle<()>>,
}

struct Shared<F> {
    feed: F,
    store: Arc<RenderStore>,
    clock: Clock,
    staleness_multiplier: u32,
    control: Mutex<Control>,
    snapshot: Mutex<Snapshot>,
    publishing: Mutex<()>,
    in_flight: Arc<AtomicBool>,
    counters: Counters,
}

/// Marks a cycle as in flight for as long as it lives.
struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<F: HazardFeed> Shared<F> {
    fn policy(&self, control: &Control) -> StalenessPolicy {
        StalenessPolicy::new(control.interval, self.staleness_multiplier)
    }

    fn try_begin(&self) -> Option<InFlightGuard> {
        let guard = InFlightGuard::acquire(&self.in_flight);
        if guard.is_none() {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            debug!("previous cycle still in flight, skipping tick");
        }
        guard
    }

    async fn execute(&self, epoch: u64, _guard: InFlightGuard) -> CycleReport {
        self.counters.started.fetch_add(1, Ordering::Relaxed);
        let outcomes = fetcher::fetch_cycle(&self.feed).await;
        self.apply(epoch, outcomes)
    }

    fn apply(&self, epoch: u64, outcomes: CycleOutcomes) -> CycleReport {
        let _publishing = lock(&self.publishing);
        let (cycle, failures, events, model) = {
            let control = lock(&self.control);
            if control.epoch != epoch {
                self.counters.discarded.fetch_add(1, Ordering::Relaxed);
                info!(
                    cycle_epoch = epoch,
                    current_epoch = control.epoch,
                    "discarding result of cycle that outlived its epoch"
                );
                return CycleReport::Discarded;
            }
            let policy = self.policy(&control);

            let mut current = lock(&self.snapshot);
            let cycle = current.cycle.saturating_add(1);
            let failures = outcomes.failures().len();
            if outcomes.all_failed() {
                warn!(cycle, "every source failed, carrying previous snapshot forward");
            }

            let now = (self.clock)();
            let next = snapshot::merge_snapshot(&current, outcomes, cycle, now);
            let model = derive::derive_render_model(&self.store.current(), &next, now, &policy);
            let events = next.events.len();
            *current = next;
            (cycle, failures, events, model)
        };

        self.store.publish(model);
        self.counters.applied.fetch_add(1, Ordering::Relaxed);

        info!(cycle, events, failures, "cycle applied");
        CycleReport::Applied { cycle, failures }
    }

    /// Flip the staleness flag of the current model if time has moved it.
    fn refresh_staleness(&self) {
        let _publishing = lock(&self.publishing);
        let policy = self.policy(&lock(&self.control));
        let model = self.store.current();
        if let Some(updated) = derive::refresh_staleness(&model, (self.clock)(), &policy) {
            if updated.is_stale {
                warn!(cycle = updated.cycle, "render model is stale");
            }
            self.store.publish(updated);
        }
    }
}

/// Timer loop for one epoch. Runs until aborted by `stop`.
async fn drive<F: HazardFeed>(shared: Arc<Shared<F>>, epoch: u64, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if lock(&shared.control).epoch != epoch {
            break;
        }
        shared.refresh_staleness();

        if let Some(guard) = shared.try_begin() {
            let task = Arc::clone(&shared);
            tokio::spawn(async move {
                task.execute(epoch, guard).await;
            });
        }
    }
}

/// Polls a [`HazardFeed`] and publishes render models to a [`RenderStore`].
///
/// Dropping the scheduler stops it. A cycle already in flight at that
/// point finishes and is discarded.
pub struct SyncScheduler<F: HazardFeed> {
    shared: Arc<Shared<F>>,
}

impl<F: HazardFeed> std::fmt::Debug for SyncScheduler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let control = lock(&self.shared.control);
        f.debug_struct("SyncScheduler")
            .field("state", &control.state)
            .field("interval", &control.interval)
            .field("epoch", &control.epoch)
            .finish_non_exhaustive()
    }
}

impl<F: HazardFeed> SyncScheduler<F> {
    /// Create a stopped scheduler using the system clock.
    pub fn new(feed: F, store: Arc<RenderStore>, config: &SyncConfig) -> Self {
        Self::with_clock(feed, store, config, Arc::new(Utc::now))
    }

    /// Create a stopped scheduler with an explicit clock.
    pub fn with_clock(
        feed: F,
        store: Arc<RenderStore>,
        config: &SyncConfig,
        clock: Clock,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                feed,
                store,
                clock,
                staleness_multiplier: config.staleness_multiplier,
                control: Mutex::new(Control {
                    state: SyncState::Stopped,
                    interval: config.interval(),
                    epoch: 0,
                    timer: None,
                }),
                snapshot: Mutex::new(Snapshot::default()),
                publishing: Mutex::new(()),
                in_flight: Arc::new(AtomicBool::new(false)),
                counters: Counters::default(),
            }),
        }
    }

    /// Begin polling every `interval`, running the first cycle immediately.
    ///
    /// Intervals below the configured minimum are raised to it. Returns
    /// `false` without changing anything if already running, or if called
    /// outside a Tokio runtime.
    pub fn start(&self, interval: Duration) -> bool {
        let mut control = lock(&self.shared.control);
        if control.state == SyncState::Running {
            debug!("start requested while already running, ignoring");
            return false;
        }
        let Ok(runtime) = Handle::try_current() else {
            warn!("start requested outside a Tokio runtime, ignoring");
            return false;
        };

        let floor = Duration::from_millis(MIN_INTERVAL_MS);
        let interval = if interval < floor {
            warn!(
                requested_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
                floor_ms = MIN_INTERVAL_MS,
                "polling interval below minimum, clamping"
            );
            floor
        } else {
            interval
        };

        control.epoch = control.epoch.saturating_add(1);
        control.state = SyncState::Running;
        control.interval = interval;
        control.timer = Some(runtime.spawn(drive(
            Arc::clone(&self.shared),
            control.epoch,
            interval,
        )));

        info!(
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            epoch = control.epoch,
            "sync started"
        );
        true
    }

    /// Stop polling. Returns `false` if already stopped.
    ///
    /// No result is committed after this returns, even from a cycle that was
    /// already in flight.
    pub fn stop(&self) -> bool {
        let mut control = lock(&self.shared.control);
        if control.state == SyncState::Stopped {
            debug!("stop requested while already stopped, ignoring");
            return false;
        }

        control.epoch = control.epoch.saturating_add(1);
        control.state = SyncState::Stopped;
        if let Some(timer) = control.timer.take() {
            timer.abort();
        }

        info!(
            epoch = control.epoch,
            cycle_in_flight = self.shared.in_flight.load(Ordering::Acquire),
            "sync stopped"
        );
        true
    }

    /// Run one cycle now, outside the timer.
    ///
    /// Honors the overlap rule: returns [`CycleReport::Skipped`] if a cycle
    /// is already in flight.
    pub async fn run_cycle(&self) -> CycleReport {
        let epoch = lock(&self.shared.control).epoch;
        let Some(guard) = self.shared.try_begin() else {
            return CycleReport::Skipped;
        };
        self.shared.execute(epoch, guard).await
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SyncState {
        lock(&self.shared.control).state
    }

    /// Polling interval of the current (or most recent) run.
    pub fn interval(&self) -> Duration {
        lock(&self.shared.control).interval
    }

    /// Lifetime counters.
    pub fn stats(&self) -> SyncStats {
        let counters = &self.shared.counters;
        SyncStats {
            cycles_started: counters.started.load(Ordering::Relaxed),
            cycles_applied: counters.applied.load(Ordering::Relaxed),
            ticks_skipped: counters.skipped.load(Ordering::Relaxed),
            results_discarded: counters.discarded.load(Ordering::Relaxed),
            cycle_in_flight: self.shared.in_flight.load(Ordering::Acquire),
        }
    }

    /// The store this scheduler publishes to.
    pub fn store(&self) -> &Arc<RenderStore> {
        &self.shared.store
    }

    /// A copy of the current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        lock(&self.shared.snapshot).clone()
    }
}

impl<F: HazardFeed> SyncControl for SyncScheduler<F> {
    fn start_polling(&self) -> bool {
        let interval = self.interval();
        self.start(interval)
    }

    fn stop_polling(&self) -> bool {
        self.stop()
    }

    fn state(&self) -> SyncState {
        Self::state(self)
    }

    fn interval(&self) -> Duration {
        Self::interval(self)
    }

    fn stats(&self) -> SyncStats {
        Self::stats(self)
    }
}

impl<F: HazardFeed> Drop for SyncScheduler<F> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::VecDeque;

    use chrono::{TimeDelta, TimeZone};
    use firewatch_types::{
        DamageEstimate, HazardEvent, HazardId, LatLon, RenderModel, SourceKind, SpreadPrediction,
        Viewport,
    };
    use rust_decimal_macros::dec;
    use tokio::time::{Instant, sleep};

    use super::*;
    use crate::fetcher::SourceFailure;

    /// Instrumented feed. Detections take a scripted delay; the other two
    /// sources answer immediately.
    #[derive(Default)]
    struct ScriptedFeed {
        events: Mutex<Vec<HazardEvent>>,
        delays: Mutex<VecDeque<Duration>>,
        default_delay: Duration,
        prediction_fails: AtomicBool,
        calls: AtomicU64,
        active: AtomicU64,
        max_active: AtomicU64,
    }

    impl ScriptedFeed {
        fn with_delay(default_delay: Duration) -> Arc<Self> {
            let feed = Self {
                default_delay,
                ..Self::default()
            };
            *feed.events.lock().unwrap() = vec![fire(1, 53.08, 70.3, "high")];
            Arc::new(feed)
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }

        fn max_active(&self) -> u64 {
            self.max_active.load(Ordering::SeqCst)
        }
    }

    impl HazardFeed for ScriptedFeed {
        async fn fetch_detections(&self) -> Result<Vec<HazardEvent>, SourceFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let active = self.active.fetch_add(1, Ordering::SeqCst).saturating_add(1);
            self.max_active.fetch_max(active, Ordering::SeqCst);

            let delay = self
                .delays
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.default_delay);
            sleep(delay).await;

            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(self.events.lock().unwrap().clone())
        }

        async fn fetch_prediction(&self) -> Result<Option<SpreadPrediction>, SourceFailure> {
            if self.prediction_fails.load(Ordering::SeqCst) {
                return Err(SourceFailure::Status {
                    kind: SourceKind::Prediction,
                    status: 503,
                });
            }
            Ok(Some(SpreadPrediction {
                direction: "NE".to_owned(),
                timeframe: "12h".to_owned(),
                spread_zone: vec![LatLon::new(53.08, 70.3), LatLon::new(53.10, 70.33)],
                fire_id: None,
                risk_level: None,
            }))
        }

        async fn fetch_damage(&self) -> Result<Option<DamageEstimate>, SourceFailure> {
            Ok(Some(DamageEstimate::new(dec!(2500000))))
        }
    }

    fn fire(id: u64, lat: f64, lon: f64, intensity: &str) -> HazardEvent {
        HazardEvent::new(HazardId::new(id), lat, lon, intensity)
    }

    fn sync_config() -> SyncConfig {
        SyncConfig {
            interval_ms: 3000,
            staleness_multiplier: 2,
            autostart: false,
        }
    }

    fn store() -> Arc<RenderStore> {
        Arc::new(RenderStore::new(RenderModel::initial(Viewport {
            center: LatLon::new(37.7749, -122.4194),
            zoom: 10,
            revision: 0,
        })))
    }

    /// A wall clock that follows Tokio's (pausable) clock.
    fn tokio_clock() -> Clock {
        let origin = Instant::now();
        let base = Utc.timestamp_opt(1_720_000_000, 0).unwrap();
        Arc::new(move || {
            base + TimeDelta::from_std(origin.elapsed()).unwrap_or(TimeDelta::zero())
        })
    }

    fn scheduler(feed: &Arc<ScriptedFeed>) -> SyncScheduler<Arc<ScriptedFeed>> {
        SyncScheduler::with_clock(Arc::clone(feed), store(), &sync_config(), tokio_clock())
    }

    const INTERVAL: Duration = Duration::from_millis(3000);

    #[tokio::test(start_paused = true)]
    async fn first_cycle_runs_immediately() {
        let feed = ScriptedFeed::with_delay(Duration::ZERO);
        let scheduler = scheduler(&feed);

        assert!(scheduler.start(INTERVAL));
        sleep(Duration::from_millis(10)).await;

        assert_eq!(feed.calls(), 1);
        assert_eq!(scheduler.store().current().cycle, 1);
        assert_eq!(scheduler.state(), SyncState::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn cadence_is_fixed_rate_from_cycle_start() {
        let feed = ScriptedFeed::with_delay(Duration::from_millis(1000));
        let scheduler = scheduler(&feed);

        scheduler.start(INTERVAL);
        sleep(Duration::from_millis(9010)).await;

        // Cycles start at 0, 3000, 6000 and 9000 regardless of the 1s fetch.
        assert_eq!(feed.calls(), 4);
        assert_eq!(scheduler.stats().cycles_applied, 3);
        assert_eq!(scheduler.stats().ticks_skipped, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_during_a_slow_cycle_are_skipped() {
        let feed = ScriptedFeed::with_delay(Duration::from_millis(5000));
        let scheduler = scheduler(&feed);

        scheduler.start(Duration::from_millis(1000));
        sleep(Duration::from_millis(12_500)).await;

        let stats = scheduler.stats();
        assert_eq!(feed.max_active(), 1);
        assert!(stats.ticks_skipped >= 4, "skipped {}", stats.ticks_skipped);
        assert!(stats.cycles_started >= 2);
        assert_eq!(stats.cycles_started, feed.calls());
    }

    #[tokio::test(start_paused = true)]
    async fn result_arriving_after_stop_is_discarded() {
        let feed = ScriptedFeed::with_delay(Duration::from_millis(1000));
        let scheduler = scheduler(&feed);
        let renders = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&renders);
        scheduler.store().subscribe(move |_: &RenderModel| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        scheduler.start(INTERVAL);
        sleep(Duration::from_millis(10)).await;
        assert!(scheduler.stats().cycle_in_flight);
        assert!(scheduler.stop());

        sleep(Duration::from_millis(10_000)).await;

        assert_eq!(feed.calls(), 1);
        assert_eq!(scheduler.stats().results_discarded, 1);
        assert_eq!(scheduler.stats().cycles_applied, 0);
        assert!(!scheduler.store().current().has_synced());
        assert_eq!(renders.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_never_overlaps_the_old_cycle() {
        let feed = ScriptedFeed::with_delay(Duration::from_millis(1000));
        let scheduler = scheduler(&feed);

        scheduler.start(INTERVAL);
        sleep(Duration::from_millis(10)).await;
        scheduler.stop();
        scheduler.start(INTERVAL);
        sleep(Duration::from_millis(4500)).await;

        let stats = scheduler.stats();
        assert_eq!(feed.max_active(), 1);
        assert_eq!(stats.results_discarded, 1);
        assert_eq!(stats.cycles_applied, 1);
        assert!(stats.ticks_skipped >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn misuse_is_a_no_op() {
        let feed = ScriptedFeed::with_delay(Duration::ZERO);
        let scheduler = scheduler(&feed);

        assert!(!scheduler.stop());
        assert!(scheduler.start(INTERVAL));
        assert!(!scheduler.start(Duration::from_millis(500)));
        assert_eq!(scheduler.interval(), INTERVAL);
        assert!(scheduler.stop());
        assert!(!scheduler.stop());
        assert_eq!(scheduler.state(), SyncState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn tiny_interval_is_clamped() {
        let feed = ScriptedFeed::with_delay(Duration::ZERO);
        let scheduler = scheduler(&feed);
        scheduler.start(Duration::from_millis(1));
        assert_eq!(scheduler.interval(), Duration::from_millis(MIN_INTERVAL_MS));
    }

    #[tokio::test(start_paused = true)]
    async fn live_scenario_renders_expected_model() {
        let feed = ScriptedFeed::with_delay(Duration::from_millis(200));
        let scheduler = scheduler(&feed);

        scheduler.start(INTERVAL);
        sleep(Duration::from_millis(300)).await;

        let model = scheduler.store().current();
        assert_eq!(model.events.len(), 1);
        assert_eq!(model.overlay_polyline.as_ref().map(Vec::len), Some(2));
        assert_eq!(model.damage_label, "$2.50M");
        assert!(!model.is_stale);
        assert_eq!(model.focus_point.map(|f| f.event_id), Some(HazardId::new(1)));
    }

    #[tokio::test]
    async fn prediction_failure_keeps_prior_overlay() {
        let feed = ScriptedFeed::with_delay(Duration::ZERO);
        let scheduler = scheduler(&feed);

        let report = scheduler.run_cycle().await;
        assert_eq!(report, CycleReport::Applied { cycle: 1, failures: 0 });
        let before = scheduler.store().current();

        feed.prediction_fails.store(true, Ordering::SeqCst);
        *feed.events.lock().unwrap() = vec![fire(2, 54.0, 71.0, "extreme")];
        let report = scheduler.run_cycle().await;
        assert_eq!(report, CycleReport::Applied { cycle: 2, failures: 1 });

        let after = scheduler.store().current();
        assert_eq!(after.overlay_polyline, before.overlay_polyline);
        assert_eq!(after.prediction_label, "NE");
        assert_eq!(after.events[0].id, HazardId::new(2));
        assert_eq!(after.sources.prediction.consecutive_failures, 1);
        assert_eq!(scheduler.snapshot().cycle, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fetched_at_never_decreases() {
        let feed = ScriptedFeed::with_delay(Duration::from_millis(100));
        let scheduler = scheduler(&feed);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        scheduler.store().subscribe(move |m: &RenderModel| {
            if let Some(at) = m.fetched_at {
                sink.lock().unwrap().push(at);
            }
        });

        scheduler.start(INTERVAL);
        sleep(Duration::from_millis(4000)).await;
        feed.prediction_fails.store(true, Ordering::SeqCst);
        sleep(Duration::from_millis(6000)).await;

        let seen = seen.lock().unwrap();
        assert!(seen.len() >= 3);
        assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test(start_paused = true)]
    async fn stuck_cycle_surfaces_staleness() {
        let feed = ScriptedFeed::with_delay(Duration::from_secs(60));
        feed.delays.lock().unwrap().push_back(Duration::ZERO);
        let scheduler = scheduler(&feed);

        scheduler.start(INTERVAL);
        sleep(Duration::from_millis(5000)).await;
        assert!(!scheduler.store().current().is_stale);

        // Second cycle hangs from t=3000; the bound is 6000ms past t=0.
        sleep(Duration::from_millis(4500)).await;
        let model = scheduler.store().current();
        assert!(model.is_stale);
        assert_eq!(model.cycle, 1);
        assert_eq!(feed.max_active(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_scheduler_stops_polling() {
        let feed = ScriptedFeed::with_delay(Duration::ZERO);
        let scheduler = scheduler(&feed);
        scheduler.start(INTERVAL);
        sleep(Duration::from_millis(10)).await;
        drop(scheduler);

        sleep(Duration::from_millis(10_000)).await;
        assert_eq!(feed.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn adapter_can_call_back_into_sync_control() {
        let feed = ScriptedFeed::with_delay(Duration::ZERO);
        let scheduler = Arc::new(scheduler(&feed));
        let control: Arc<dyn SyncControl> = scheduler.clone();
        let weak = Arc::downgrade(&control);
        drop(control);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        scheduler.store().subscribe(move |model: &RenderModel| {
            let Some(control) = weak.upgrade() else {
                return;
            };
            sink.lock().unwrap().push((model.cycle, control.state()));
            if model.cycle == 2 {
                control.stop_polling();
            }
        });

        let report = scheduler.run_cycle().await;
        assert_eq!(report, CycleReport::Applied { cycle: 1, failures: 0 });

        assert!(scheduler.start(INTERVAL));
        sleep(Duration::from_millis(10)).await;
        assert_eq!(scheduler.state(), SyncState::Stopped);

        sleep(INTERVAL * 3).await;
        assert_eq!(feed.calls(), 2);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (0, SyncState::Stopped),
                (1, SyncState::Stopped),
                (2, SyncState::Running),
            ]
        );
    }
}
