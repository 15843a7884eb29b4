//! Live refresh schedulers.
//!
//! Both schedulers own a spawned tokio task and abort it on [`stop`] or on
//! drop, so a view that goes away takes its timer with it. A failing refresh
//! is logged and the schedule carries on.
//!
//! [`stop`]: RepeatingTask::stop

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::error::{Result, TransitError};

/// A refresh operation supplied by the owning view.
pub type RefreshOp = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Runs `op` every `period`, first after one full period.
pub struct RepeatingTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl RepeatingTask {
    pub fn start(name: &'static str, period: Duration, op: RefreshOp) -> Self {
        info!(task = name, period_secs = period.as_secs(), "Starting repeating refresh");
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match op().await {
                    Ok(()) => debug!(task = name, "Refresh completed"),
                    Err(e) => error!(task = name, error = %e, "Refresh failed"),
                }
            }
        });
        Self { name, handle }
    }

    pub fn stop(&self) {
        if !self.handle.is_finished() {
            info!(task = self.name, "Stopping repeating refresh");
        }
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// What a countdown view displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownState {
    /// Whole seconds until the next refresh.
    pub remaining: u64,
    pub refreshing: bool,
    /// Last refresh failure, cleared after the display period.
    pub error: Option<TransitError>,
}

/// A per-second countdown that runs `op` on reaching zero, waits for it,
/// then starts over from the full period.
pub struct Countdown {
    state: watch::Receiver<CountdownState>,
    handle: JoinHandle<()>,
}

impl Countdown {
    pub fn start(period_secs: u64, error_display: Duration, op: RefreshOp) -> Self {
        let period_secs = period_secs.max(1);
        let (tx, rx) = watch::channel(CountdownState {
            remaining: period_secs,
            refreshing: false,
            error: None,
        });
        info!(period_secs, "Starting countdown refresh");
        let handle = tokio::spawn(run_countdown(tx, period_secs, error_display, op));
        Self { state: rx, handle }
    }

    pub fn state(&self) -> CountdownState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CountdownState> {
        self.state.clone()
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run_countdown(
    tx: watch::Sender<CountdownState>,
    period_secs: u64,
    error_display: Duration,
    op: RefreshOp,
) {
    let mut clear_error_at: Option<Instant> = None;

    loop {
        for remaining in (0..period_secs).rev() {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let clear = clear_error_at.is_some_and(|at| Instant::now() >= at);
            if clear {
                clear_error_at = None;
            }
            tx.send_modify(|s| {
                s.remaining = remaining;
                if clear {
                    s.error = None;
                }
            });
        }

        tx.send_modify(|s| s.refreshing = true);
        let outcome = op().await;
        if let Err(e) = &outcome {
            error!(error = %e, "Live refresh failed");
            clear_error_at = Some(Instant::now() + error_display);
        }
        tx.send_modify(|s| {
            s.refreshing = false;
            s.remaining = period_secs;
            if let Err(e) = outcome {
                s.error = Some(e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_op(calls: Arc<AtomicUsize>, fail_first: usize) -> RefreshOp {
        Arc::new(move || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < fail_first {
                    Err(TransitError::RateLimited)
                } else {
                    Ok(())
                }
            }
            .boxed()
        })
    }

    async fn sleep_ms(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_task_runs_each_period() {
        let calls = Arc::new(AtomicUsize::new(0));
        let task = RepeatingTask::start("bike", Duration::from_secs(300), counting_op(calls.clone(), 0));

        sleep_ms(299_500).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        sleep_ms(1_000).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        sleep_ms(300_000).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(task.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_task_survives_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let _task = RepeatingTask::start("bike", Duration::from_secs(10), counting_op(calls.clone(), 2));

        sleep_ms(30_500).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_task_never_fires() {
        let calls = Arc::new(AtomicUsize::new(0));
        let task = RepeatingTask::start("bike", Duration::from_secs(10), counting_op(calls.clone(), 0));
        task.stop();

        sleep_ms(60_000).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!task.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_refreshes_and_restarts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let countdown = Countdown::start(30, Duration::from_secs(3), counting_op(calls.clone(), 0));
        assert_eq!(countdown.state().remaining, 30);

        sleep_ms(10_500).await;
        assert_eq!(countdown.state().remaining, 20);

        sleep_ms(20_000).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(countdown.state().remaining, 30);
        assert!(!countdown.state().refreshing);

        sleep_ms(1_000).await;
        assert_eq!(countdown.state().remaining, 29);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_error_is_transient() {
        let calls = Arc::new(AtomicUsize::new(0));
        let countdown = Countdown::start(30, Duration::from_secs(3), counting_op(calls.clone(), 1));

        sleep_ms(30_500).await;
        assert_eq!(countdown.state().error, Some(TransitError::RateLimited));

        sleep_ms(2_000).await;
        assert!(countdown.state().error.is_some());

        sleep_ms(1_000).await;
        assert_eq!(countdown.state().error, None);

        sleep_ms(27_000).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(countdown.state().error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_countdown_stops() {
        let calls = Arc::new(AtomicUsize::new(0));
        let countdown = Countdown::start(5, Duration::from_secs(3), counting_op(calls.clone(), 0));
        drop(countdown);

        sleep_ms(60_000).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
