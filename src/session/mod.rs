//! Study session host
//!
//! A [`StudySession`] walks a [`Deck`] with a cursor. Each advance may be
//! intercepted by the reinforcement selector, which shows a pool item out of
//! sequence without moving the cursor. Leaving an item records a view in the
//! metadata store, unless the learner is moving faster than the write guard.
//! Inside a tokio runtime those writes go through a background writer task so
//! navigation never waits on the store.

pub mod guards;
pub mod reinforce;

pub use guards::UpdateGuards;
pub use reinforce::{ReinforcementSelector, Selection};

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::catalog::ItemId;
use crate::clock::{minutes_since, Clock};
use crate::config::SchedulerConfig;
use crate::deck::{Deck, FilterMode};
use crate::error::{ErrorCause, Result, SchedulerError};
use crate::logging::{ErrorChannel, Severity};
use crate::practice::{PracticeError, TimedLoopHandle, TimedState};
use crate::recall::MetadataPatch;
use crate::store::MetadataStore;

/// What the host displays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub item_id: ItemId,
    pub progress_percent: f64,
    pub is_reinforced: bool,
}

/// Device capability used for shake-to-advance
pub trait MotionSensor {
    fn is_supported(&self) -> bool;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub deck: Vec<ItemId>,
    pub cursor: usize,
    /// Pool item shown in place of the cursor item
    pub reinforced_override: Option<ItemId>,
    pub last_advance_at: Option<DateTime<Utc>>,
}

impl SessionState {
    fn new(deck: Vec<ItemId>) -> Self {
        Self {
            deck,
            ..Default::default()
        }
    }

    fn displayed(&self) -> Option<&ItemId> {
        self.reinforced_override
            .as_ref()
            .or_else(|| self.deck.get(self.cursor))
    }

    fn view(&self) -> Option<SessionView> {
        let item_id = self.displayed()?.clone();
        Some(SessionView {
            item_id,
            progress_percent: (self.cursor + 1) as f64 / self.deck.len() as f64 * 100.0,
            is_reinforced: self.reinforced_override.is_some(),
        })
    }

    fn remaining(&self) -> usize {
        self.deck.len().saturating_sub(self.cursor + 1)
    }
}

struct SessionInner {
    state: SessionState,
    filter: FilterMode,
    pool: Vec<ItemId>,
    selector: ReinforcementSelector,
    guards: UpdateGuards,
    store: Arc<dyn MetadataStore>,
    clock: Arc<dyn Clock>,
    channel: Arc<dyn ErrorChannel>,
    /// Background view writer; writes inline when absent
    writer: Option<mpsc::UnboundedSender<ViewWrite>>,
    motion_enabled: bool,
}

type ViewWrite = (ItemId, MetadataPatch);

impl SessionInner {
    fn step(&mut self) -> Option<SessionView> {
        if self.state.deck.is_empty() {
            return None;
        }
        let now = self.clock.now();
        let departing = self.state.displayed().cloned();

        let selection = {
            let store = &self.store;
            let staleness = |id: &ItemId| {
                store
                    .read(id)
                    .and_then(|m| m.last_viewed_at())
                    .map(|at| minutes_since(at, now))
                    .unwrap_or(f64::INFINITY)
            };
            self.selector.select(
                &self.filter,
                &self.pool,
                staleness,
                &self.state.deck,
                self.state.reinforced_override.as_ref(),
            )
        };

        match selection {
            Selection::Reinforce(id) => {
                log::debug!("session: reinforcing {}", id);
                self.state.reinforced_override = Some(id);
            }
            Selection::Advance => {
                self.state.reinforced_override = None;
                self.state.cursor = (self.state.cursor + 1) % self.state.deck.len();
            }
        }

        if let Some(id) = departing {
            self.record_view(&id, now);
        }
        self.state.last_advance_at = Some(now);
        self.state.view()
    }

    fn back(&mut self) -> Option<SessionView> {
        if self.state.deck.is_empty() {
            return None;
        }
        if self.state.reinforced_override.take().is_none() {
            self.state.cursor = self.state.cursor.saturating_sub(1);
        }
        self.state.last_advance_at = Some(self.clock.now());
        self.state.view()
    }

    fn record_view(&self, id: &ItemId, now: DateTime<Utc>) {
        if !self
            .guards
            .can_write_spaced_repetition(self.state.last_advance_at, now)
        {
            log::debug!("session: skipped view write for {}", id);
            return;
        }
        let write = (id.clone(), MetadataPatch::viewed(now));
        let write = match &self.writer {
            Some(writer) => match writer.send(write) {
                Ok(()) => return,
                Err(mpsc::error::SendError(write)) => write,
            },
            None => write,
        };
        let (id, patch) = write;
        if let Err(e) = self.store.write(&id, &patch) {
            report_write_failure(self.channel.as_ref(), &id, e.into());
        }
    }
}

fn report_write_failure(channel: &dyn ErrorChannel, id: &ItemId, err: SchedulerError) {
    channel.report(
        &format!("session: failed to record view of {}: {}", id, err),
        err.severity(),
    );
}

/// Drain view writes in order, each on the blocking pool
fn spawn_view_writer(
    runtime: &tokio::runtime::Handle,
    store: Arc<dyn MetadataStore>,
    channel: Arc<dyn ErrorChannel>,
) -> (mpsc::UnboundedSender<ViewWrite>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<ViewWrite>();
    let task = runtime.spawn(async move {
        while let Some((id, patch)) = rx.recv().await {
            let store = Arc::clone(&store);
            let written = tokio::task::spawn_blocking(move || {
                let result = store.write(&id, &patch);
                (id, result)
            })
            .await;
            match written {
                Ok((_, Ok(_))) => {}
                Ok((id, Err(e))) => report_write_failure(channel.as_ref(), &id, e.into()),
                Err(e) => channel.report(
                    &format!("session: view write task failed: {}", e),
                    Severity::Error,
                ),
            }
        }
        log::debug!("session: view writer stopped");
    });
    (tx, task)
}

/// One learner's pass over a deck
pub struct StudySession {
    inner: Arc<Mutex<SessionInner>>,
    timed: Option<TimedLoopHandle>,
    writer_task: Option<JoinHandle<()>>,
    tick_delay: Duration,
}

impl StudySession {
    pub fn new(
        deck: Deck,
        config: &SchedulerConfig,
        store: Arc<dyn MetadataStore>,
        clock: Arc<dyn Clock>,
        channel: Arc<dyn ErrorChannel>,
    ) -> Self {
        let selector = ReinforcementSelector::new(config.reinforce_probability);
        Self::with_selector(deck, config, selector, store, clock, channel)
    }

    /// Session with a caller-supplied selector, e.g. a seeded one
    pub fn with_selector(
        deck: Deck,
        config: &SchedulerConfig,
        selector: ReinforcementSelector,
        store: Arc<dyn MetadataStore>,
        clock: Arc<dyn Clock>,
        channel: Arc<dyn ErrorChannel>,
    ) -> Self {
        let (writer, writer_task) = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let (tx, task) =
                    spawn_view_writer(&runtime, Arc::clone(&store), Arc::clone(&channel));
                (Some(tx), Some(task))
            }
            Err(_) => (None, None),
        };
        let inner = SessionInner {
            state: SessionState::new(deck.items),
            filter: deck.filter,
            pool: deck.pool,
            selector,
            guards: UpdateGuards::new(config.guards),
            store,
            clock,
            channel,
            writer,
            motion_enabled: false,
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            timed: None,
            writer_task,
            tick_delay: Duration::from_millis(config.practice.tick_delay_ms),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        lock_inner(&self.inner)
    }

    pub fn current(&self) -> Option<SessionView> {
        self.lock().state.view()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Manual advance; stops any timed practice first
    pub fn advance(&mut self) -> Option<SessionView> {
        self.abort();
        self.lock().step()
    }

    /// Leave a reinforced item, or step the cursor back
    pub fn back(&mut self) -> Option<SessionView> {
        self.abort();
        self.lock().back()
    }

    /// Advance automatically over the rest of the deck
    ///
    /// Returns `false` when practice is already running or the last manual
    /// advance was too recent.
    pub fn start_timed_practice<T, D>(&mut self, on_tick: T, on_done: D) -> bool
    where
        T: Fn(Option<SessionView>) + Send + 'static,
        D: FnOnce(std::result::Result<(), PracticeError>) + Send + 'static,
    {
        if self.timed.as_ref().is_some_and(|t| t.is_running()) {
            return false;
        }
        let (ticks, channel) = {
            let inner = self.lock();
            let now = inner.clock.now();
            if !inner
                .guards
                .can_resume_timed_play(inner.state.last_advance_at, now)
            {
                log::debug!("session: timed practice requested too soon");
                return false;
            }
            (inner.state.remaining(), Arc::clone(&inner.channel))
        };

        let token = CancellationToken::new();
        let shared = Arc::clone(&self.inner);
        let cancelled = token.clone();
        let tick = move || {
            let stepped = {
                let mut inner = lock_inner(&shared);
                // abort() cancels under this lock
                if cancelled.is_cancelled() {
                    None
                } else {
                    Some(inner.step())
                }
            };
            if let Some(view) = stepped {
                on_tick(view);
            }
            std::future::ready(())
        };
        let done = move |result: std::result::Result<(), PracticeError>| {
            if let Err(e) = &result {
                channel.report(&format!("session: timed practice stopped: {}", e), Severity::Debug);
            }
            on_done(result);
        };

        self.timed = Some(TimedLoopHandle::start_with_token(
            token,
            ticks,
            self.tick_delay,
            tick,
            done,
        ));
        true
    }

    /// Stop timed practice; no-op when none is running
    ///
    /// No tick advances the session once this returns. The settled run stays
    /// observable through [`StudySession::timed_state`].
    pub fn abort(&self) {
        if let Some(timed) = &self.timed {
            let _inner = self.lock();
            timed.abort();
        }
    }

    /// Stop timed practice and wait for queued view writes to land
    pub async fn close(mut self) {
        self.abort();
        self.lock().writer = None;
        if let Some(task) = self.writer_task.take() {
            if let Err(e) = task.await {
                log::warn!("session: view writer ended abnormally: {}", e);
            }
        }
    }

    pub fn timed_state(&self) -> TimedState {
        self.timed
            .as_ref()
            .map(|t| t.state())
            .unwrap_or(TimedState::Idle)
    }

    /// Swap in a rebuilt deck, e.g. after the filter changed
    pub fn replace_deck(&mut self, deck: Deck) {
        self.abort();
        self.timed = None;
        let mut inner = self.lock();
        inner.state = SessionState::new(deck.items);
        inner.filter = deck.filter;
        inner.pool = deck.pool;
    }

    /// Turn on shake-to-advance if the device supports it
    pub fn enable_motion_advance(&mut self, sensor: &dyn MotionSensor) -> Result<()> {
        let mut inner = self.lock();
        if sensor.is_supported() {
            inner.motion_enabled = true;
            return Ok(());
        }
        inner.motion_enabled = false;
        let err = SchedulerError::Environment(ErrorCause::device_motion());
        inner
            .channel
            .report(&format!("session: motion advance disabled: {}", err), err.severity());
        Err(err)
    }

    pub fn motion_enabled(&self) -> bool {
        self.lock().motion_enabled
    }

    /// Shake gesture; advances only when motion advance is enabled
    pub fn on_shake(&mut self) -> Option<SessionView> {
        if !self.motion_enabled() {
            return None;
        }
        self.advance()
    }
}

impl Drop for StudySession {
    fn drop(&mut self) {
        self.abort();
    }
}

fn lock_inner(inner: &Mutex<SessionInner>) -> MutexGuard<'_, SessionInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::logging::RecordingChannel;
    use crate::recall::RecallMetadata;
    use crate::store::{InMemoryMetadataStore, StoreError};
    use chrono::TimeZone;
    use std::collections::HashMap;

    struct Fixture {
        store: Arc<InMemoryMetadataStore>,
        clock: Arc<ManualClock>,
        channel: Arc<RecordingChannel>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: Arc::new(InMemoryMetadataStore::new()),
                clock: Arc::new(ManualClock::new(
                    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
                )),
                channel: Arc::new(RecordingChannel::new()),
            }
        }

        fn session(&self, deck: Deck, probability: f64) -> StudySession {
            StudySession::with_selector(
                deck,
                &SchedulerConfig::default(),
                ReinforcementSelector::with_seed(probability, 7),
                self.store.clone(),
                self.clock.clone(),
                self.channel.clone(),
            )
        }
    }

    fn deck(names: &[&str]) -> Deck {
        Deck {
            items: names.iter().map(|n| ItemId::new(*n)).collect(),
            ..Default::default()
        }
    }

    struct FailingStore;

    impl MetadataStore for FailingStore {
        fn read(&self, _id: &ItemId) -> Option<RecallMetadata> {
            None
        }

        fn write(&self, _id: &ItemId, _patch: &MetadataPatch) -> crate::store::Result<RecallMetadata> {
            Err(StoreError::Poisoned)
        }

        fn delete(&self, _ids: &[ItemId]) -> crate::store::Result<()> {
            Ok(())
        }

        fn snapshot(&self) -> HashMap<ItemId, RecallMetadata> {
            HashMap::new()
        }
    }

    struct Sensor(bool);

    impl MotionSensor for Sensor {
        fn is_supported(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn test_current_and_progress() {
        let fx = Fixture::new();
        let mut session = fx.session(deck(&["a", "b", "c", "d"]), 0.0);

        let view = session.current().unwrap();
        assert_eq!(view.item_id.as_str(), "a");
        assert_eq!(view.progress_percent, 25.0);
        assert!(!view.is_reinforced);

        let view = session.advance().unwrap();
        assert_eq!(view.item_id.as_str(), "b");
        assert_eq!(view.progress_percent, 50.0);
    }

    #[test]
    fn test_advance_wraps_and_back_stops_at_start() {
        let fx = Fixture::new();
        let mut session = fx.session(deck(&["a", "b"]), 0.0);

        assert_eq!(session.back().unwrap().item_id.as_str(), "a");
        session.advance();
        assert_eq!(session.advance().unwrap().item_id.as_str(), "a");
    }

    #[test]
    fn test_empty_deck_has_no_view() {
        let fx = Fixture::new();
        let mut session = fx.session(Deck::default(), 1.0);
        assert!(session.current().is_none());
        assert!(session.advance().is_none());
        assert!(session.back().is_none());
    }

    #[test]
    fn test_view_write_respects_guard() {
        let fx = Fixture::new();
        let mut session = fx.session(deck(&["a", "b", "c"]), 0.0);

        // First advance has no predecessor, so the write goes through
        session.advance();
        assert!(fx.store.read(&ItemId::new("a")).is_some());

        fx.clock.advance(chrono::Duration::milliseconds(1499));
        session.advance();
        assert!(fx.store.read(&ItemId::new("b")).is_none());

        fx.clock.advance(chrono::Duration::milliseconds(1500));
        session.advance();
        let metadata = fx.store.read(&ItemId::new("c")).unwrap();
        assert_eq!(metadata.last_viewed_at(), Some(fx.clock.now()));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let fx = Fixture::new();
        let mut session = StudySession::new(
            deck(&["a", "b"]),
            &SchedulerConfig::default(),
            Arc::new(FailingStore),
            fx.clock.clone(),
            fx.channel.clone(),
        );

        assert_eq!(session.advance().unwrap().item_id.as_str(), "b");
        assert_eq!(fx.channel.count_at(Severity::Error), 1);
    }

    #[test]
    fn test_reinforcement_overrides_without_moving_cursor() {
        let fx = Fixture::new();
        let mut d = deck(&["a", "b", "c"]);
        d.pool = vec![ItemId::new("c")];
        let mut session = fx.session(d, 1.0);

        let view = session.advance().unwrap();
        assert_eq!(view.item_id.as_str(), "c");
        assert!(view.is_reinforced);
        assert_eq!(session.state().cursor, 0);

        // "c" is showing, so it cannot be picked again
        let view = session.advance().unwrap();
        assert_eq!(view.item_id.as_str(), "b");
        assert!(!view.is_reinforced);
    }

    #[test]
    fn test_back_leaves_reinforced_item() {
        let fx = Fixture::new();
        let mut d = deck(&["a", "b"]);
        d.pool = vec![ItemId::new("b")];
        let mut session = fx.session(d, 1.0);

        assert!(session.advance().unwrap().is_reinforced);
        let view = session.back().unwrap();
        assert_eq!(view.item_id.as_str(), "a");
        assert!(!view.is_reinforced);
    }

    #[test]
    fn test_replace_deck_resets_cursor() {
        let fx = Fixture::new();
        let mut session = fx.session(deck(&["a", "b"]), 0.0);
        session.advance();

        session.replace_deck(deck(&["x", "y", "z"]));
        let state = session.state();
        assert_eq!(state.cursor, 0);
        assert_eq!(session.current().unwrap().item_id.as_str(), "x");
    }

    #[test]
    fn test_motion_advance() {
        let fx = Fixture::new();
        let mut session = fx.session(deck(&["a", "b"]), 0.0);

        assert!(session.on_shake().is_none());

        let err = session.enable_motion_advance(&Sensor(false)).unwrap_err();
        assert_eq!(err.cause(), Some(&ErrorCause::device_motion()));
        assert!(!session.motion_enabled());
        assert_eq!(fx.channel.count_at(Severity::Warn), 1);

        session.enable_motion_advance(&Sensor(true)).unwrap();
        assert_eq!(session.on_shake().unwrap().item_id.as_str(), "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_practice_runs_to_end() {
        let fx = Fixture::new();
        let mut session = fx.session(deck(&["a", "b", "c"]), 0.0);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let done = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&seen);
        let outcome = Arc::clone(&done);
        assert!(session.start_timed_practice(
            move |view| sink.lock().unwrap().push(view.unwrap().item_id),
            move |result| *outcome.lock().unwrap() = Some(result),
        ));
        assert_eq!(session.timed_state(), TimedState::Running);

        tokio::time::sleep(Duration::from_millis(6100)).await;

        let seen: Vec<String> = seen.lock().unwrap().iter().map(|i| i.to_string()).collect();
        assert_eq!(seen, vec!["b", "c"]);
        assert_eq!(*done.lock().unwrap(), Some(Ok(())));
        assert_eq!(session.timed_state(), TimedState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_advance_aborts_timed_practice() {
        let fx = Fixture::new();
        let mut session = fx.session(deck(&["a", "b", "c", "d"]), 0.0);
        let done = Arc::new(Mutex::new(None));

        let outcome = Arc::clone(&done);
        assert!(session.start_timed_practice(|_| {}, move |result| {
            *outcome.lock().unwrap() = Some(result)
        }));
        assert!(!session.start_timed_practice(|_| {}, |_| {}));

        tokio::time::sleep(Duration::from_millis(3100)).await;
        assert_eq!(session.current().unwrap().item_id.as_str(), "b");

        session.advance();
        tokio::time::sleep(Duration::from_millis(10_000)).await;

        assert_eq!(session.current().unwrap().item_id.as_str(), "c");
        assert_eq!(*done.lock().unwrap(), Some(Err(PracticeError::UserAborted)));
        assert_eq!(session.timed_state(), TimedState::Aborted);
        assert_eq!(fx.channel.count_at(Severity::Debug), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_run_stays_observable_until_replaced() {
        let fx = Fixture::new();
        let mut session = fx.session(deck(&["a", "b", "c"]), 0.0);

        assert!(session.start_timed_practice(|_| {}, |_| {}));
        tokio::time::sleep(Duration::from_millis(3100)).await;
        session.abort();
        session.abort();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(session.timed_state(), TimedState::Aborted);

        // A settled run does not block a new one
        fx.clock.advance(chrono::Duration::seconds(1));
        assert!(session.start_timed_practice(|_| {}, |_| {}));
        assert_eq!(session.timed_state(), TimedState::Running);

        session.replace_deck(deck(&["x"]));
        assert_eq!(session.timed_state(), TimedState::Idle);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_no_tick_lands_after_abort_returns() {
        let fx = Fixture::new();
        let mut config = SchedulerConfig::default();
        config.practice.tick_delay_ms = 50;
        let mut session = StudySession::with_selector(
            deck(&["a", "b", "c", "d"]),
            &config,
            ReinforcementSelector::with_seed(0.0, 7),
            fx.store.clone(),
            fx.clock.clone(),
            fx.channel.clone(),
        );
        assert!(session.start_timed_practice(|_| {}, |_| {}));

        // Keep the session busy while the first tick comes due
        let shared = Arc::clone(&session.inner);
        let holder = std::thread::spawn(move || {
            let _inner = lock_inner(&shared);
            std::thread::sleep(Duration::from_millis(200));
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        session.abort();
        let cursor_at_abort = session.state().cursor;
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(session.state().cursor, cursor_at_abort);
        assert!(cursor_at_abort <= 1);
        assert_eq!(session.timed_state(), TimedState::Aborted);
        holder.join().unwrap();
    }

    #[tokio::test]
    async fn test_view_write_goes_through_writer_task() {
        let fx = Fixture::new();
        let mut session = fx.session(deck(&["a", "b"]), 0.0);

        assert_eq!(session.advance().unwrap().item_id.as_str(), "b");
        session.close().await;

        assert!(fx.store.read(&ItemId::new("a")).is_some());
    }

    #[tokio::test]
    async fn test_background_write_failure_is_reported() {
        let fx = Fixture::new();
        let mut session = StudySession::new(
            deck(&["a", "b"]),
            &SchedulerConfig::default(),
            Arc::new(FailingStore),
            fx.clock.clone(),
            fx.channel.clone(),
        );

        session.advance();
        session.close().await;

        assert_eq!(fx.channel.count_at(Severity::Error), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_practice_waits_after_manual_advance() {
        let fx = Fixture::new();
        let mut session = fx.session(deck(&["a", "b", "c"]), 0.0);

        session.advance();
        fx.clock.advance(chrono::Duration::milliseconds(299));
        assert!(!session.start_timed_practice(|_| {}, |_| {}));

        fx.clock.advance(chrono::Duration::milliseconds(1));
        assert!(session.start_timed_practice(|_| {}, |_| {}));
    }
}
