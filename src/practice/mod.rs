//! Timed practice
//!
//! Hands-free review advances the session on a timer. A run goes
//! `Idle -> Running -> Completed | Aborted`; cancellation goes through a
//! [`CancellationToken`] and is always observed before the next tick fires.

use std::future::Future;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Progress reporting interval of [`countdown`]
pub const COUNTDOWN_STEP: Duration = Duration::from_millis(200);

/// Smallest reporting interval [`countdown_with_step`] accepts
const MIN_COUNTDOWN_STEP: Duration = Duration::from_millis(1);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PracticeError {
    /// The learner stopped a timed loop
    #[error("User aborted")]
    UserAborted,

    /// A countdown was cancelled
    #[error("Aborted")]
    Aborted,

    #[error("Timed practice task failed")]
    TaskFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimedState {
    Idle,
    Running,
    Completed,
    Aborted,
}

impl TimedState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => TimedState::Running,
            2 => TimedState::Completed,
            3 => TimedState::Aborted,
            _ => TimedState::Idle,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            TimedState::Idle => 0,
            TimedState::Running => 1,
            TimedState::Completed => 2,
            TimedState::Aborted => 3,
        }
    }
}

/// Wait `delay` then run `tick`, `n` times
///
/// Resolves immediately when `n == 0`. Cancelling `cancel` rejects with
/// [`PracticeError::UserAborted`] and no further tick runs.
pub async fn run_loop<F, Fut>(
    n: usize,
    mut tick: F,
    delay: Duration,
    cancel: &CancellationToken,
) -> Result<(), PracticeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut remaining = n;
    while remaining > 0 {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PracticeError::UserAborted),
            _ = tokio::time::sleep(delay) => {}
        }
        if cancel.is_cancelled() {
            return Err(PracticeError::UserAborted);
        }

        tick().await;
        remaining -= 1;
    }
    Ok(())
}

/// A single cancellable delay reporting `(elapsed, remaining)` every 200ms
pub async fn countdown<F>(
    delay: Duration,
    cancel: &CancellationToken,
    on_tick: Option<F>,
) -> Result<(), PracticeError>
where
    F: FnMut(Duration, Duration),
{
    countdown_with_step(delay, COUNTDOWN_STEP, cancel, on_tick).await
}

/// [`countdown`] with a custom reporting interval, at least 1ms
pub async fn countdown_with_step<F>(
    delay: Duration,
    step: Duration,
    cancel: &CancellationToken,
    mut on_tick: Option<F>,
) -> Result<(), PracticeError>
where
    F: FnMut(Duration, Duration),
{
    let step = step.max(MIN_COUNTDOWN_STEP);
    let start = tokio::time::Instant::now();
    let deadline = start + delay;
    let mut progress = tokio::time::interval_at(start + step, step);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PracticeError::Aborted),
            _ = tokio::time::sleep_until(deadline) => return Ok(()),
            _ = progress.tick() => {
                if let Some(report) = on_tick.as_mut() {
                    let elapsed = start.elapsed().min(delay);
                    report(elapsed, delay - elapsed);
                }
            }
        }
    }
}

/// Handle to a running timed practice
pub struct TimedLoopHandle {
    token: CancellationToken,
    remaining: Arc<AtomicUsize>,
    state: Arc<AtomicU8>,
    task: Option<JoinHandle<Result<(), PracticeError>>>,
}

impl TimedLoopHandle {
    /// Spawn a loop of `ticks` steps on the tokio runtime
    ///
    /// `on_done` receives the outcome once the loop settles.
    pub fn start<F, Fut, D>(ticks: usize, delay: Duration, tick: F, on_done: D) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        D: FnOnce(Result<(), PracticeError>) + Send + 'static,
    {
        Self::start_with_token(CancellationToken::new(), ticks, delay, tick, on_done)
    }

    /// [`TimedLoopHandle::start`] cancelled through a caller-owned token
    ///
    /// Lets `tick` observe the same token, e.g. under a lock it shares with
    /// whoever aborts.
    pub fn start_with_token<F, Fut, D>(
        token: CancellationToken,
        ticks: usize,
        delay: Duration,
        mut tick: F,
        on_done: D,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        D: FnOnce(Result<(), PracticeError>) + Send + 'static,
    {
        let remaining = Arc::new(AtomicUsize::new(ticks));
        let state = Arc::new(AtomicU8::new(TimedState::Running.as_u8()));

        let task = {
            let token = token.clone();
            let remaining = Arc::clone(&remaining);
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                let counter = Arc::clone(&remaining);
                let result = run_loop(
                    ticks,
                    move || {
                        counter.fetch_sub(1, Ordering::SeqCst);
                        tick()
                    },
                    delay,
                    &token,
                )
                .await;

                let settled = match result {
                    Ok(()) => TimedState::Completed,
                    Err(_) => {
                        log::debug!(
                            "timed practice: aborted with {} ticks remaining",
                            remaining.load(Ordering::SeqCst)
                        );
                        TimedState::Aborted
                    }
                };
                state.store(settled.as_u8(), Ordering::SeqCst);
                on_done(result);
                result
            })
        };

        log::debug!("timed practice: started {} ticks every {:?}", ticks, delay);

        Self {
            token,
            remaining,
            state,
            task: Some(task),
        }
    }

    /// Stop the loop; safe to call repeatedly or after it settled
    pub fn abort(&self) {
        self.token.cancel();
    }

    pub fn state(&self) -> TimedState {
        TimedState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.state() == TimedState::Running
    }

    /// Wait for the loop to settle
    pub async fn wait(mut self) -> Result<(), PracticeError> {
        match self.task.take() {
            Some(task) => task.await.unwrap_or(Err(PracticeError::TaskFailed)),
            None => Err(PracticeError::TaskFailed),
        }
    }
}

impl Drop for TimedLoopHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
