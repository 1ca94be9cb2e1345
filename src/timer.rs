//! Scoped background timers.
//!
//! Both timers run as tokio tasks and hand their results to the owning view
//! over a channel. The view applies them on its own thread when it polls.
//! Dropping (or releasing) a timer aborts the task and drops the receiving
//! end, so nothing can reach a view that no longer exists.

use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// A repeating tick source. The first tick fires one full period after
/// acquisition.
pub struct PeriodicTimer {
    handle: JoinHandle<()>,
    ticks: mpsc::UnboundedReceiver<()>,
}

impl PeriodicTimer {
    /// Spawns the tick task. Must be called from inside a tokio runtime.
    pub fn acquire(period: Duration) -> Self {
        let (sender, ticks) = mpsc::unbounded_channel();
        let start = tokio::time::Instant::now() + period;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                trace!("periodic timer fired");
                if sender.send(()).is_err() {
                    break; // Receiver gone, exit task
                }
            }
        });
        debug!(?period, "periodic timer acquired");
        PeriodicTimer { handle, ticks }
    }

    /// Number of ticks that fired since the last call.
    pub fn drain(&mut self) -> usize {
        let mut count = 0;
        while self.ticks.try_recv().is_ok() {
            count += 1;
        }
        count
    }

    /// Stops the timer and discards ticks that were not drained.
    pub fn release(self) {
        self.handle.abort();
    }

    #[cfg(test)]
    pub fn abort_handle(&self) -> tokio::task::AbortHandle {
        self.handle.abort_handle()
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("periodic timer released");
    }
}

/// A single value delivered after a fixed delay.
pub struct DeferredLoad<T> {
    handle: JoinHandle<()>,
    result: oneshot::Receiver<T>,
}

impl<T: Send + 'static> DeferredLoad<T> {
    pub fn schedule(delay: Duration, value: T) -> Self {
        let (sender, result) = oneshot::channel();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver may already be gone if the view was torn down
            let _ = sender.send(value);
        });
        DeferredLoad { handle, result }
    }

    /// Takes the value if the delay has elapsed.
    pub fn try_take(&mut self) -> Option<T> {
        self.result.try_recv().ok()
    }

    #[cfg(test)]
    pub fn abort_handle(&self) -> tokio::task::AbortHandle {
        self.handle.abort_handle()
    }
}

impl<T> Drop for DeferredLoad<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_period() {
        let mut timer = PeriodicTimer::acquire(Duration::from_secs(5));
        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(timer.drain(), 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(timer.drain(), 1);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(timer.drain(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_stops_task() {
        let timer = PeriodicTimer::acquire(Duration::from_secs(5));
        let task = timer.abort_handle();
        assert!(!task.is_finished());
        timer.release();
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(task.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deferred_load_delivers_after_delay() {
        let mut load = DeferredLoad::schedule(Duration::from_millis(500), 42);
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(load.try_take(), None);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(load.try_take(), Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_deferred_load_is_aborted() {
        let load = DeferredLoad::schedule(Duration::from_millis(500), "stale");
        let task = load.abort_handle();
        drop(load);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(task.is_finished());
    }
}
