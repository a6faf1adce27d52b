//! Real time effect handler for production use

use parking_lot::Mutex;
use persona_core::effects::{TimeError, TimeoutHandle, TimerCallback, TimerEffects};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use uuid::Uuid;

/// Real time handler backed by tokio timers.
///
/// Each scheduled callback runs on its own task of the ambient tokio runtime.
/// Scheduling outside a runtime fails with [`TimeError::ServiceUnavailable`].
#[derive(Debug, Clone, Default)]
pub struct RealTimerHandler {
    tasks: TaskRegistry,
}

type TaskRegistry = Arc<Mutex<HashMap<Uuid, JoinHandle<()>>>>;

impl RealTimerHandler {
    /// Create a new real timer handler
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timers that have not fired (or been cleared) yet.
    pub fn pending_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Abort every outstanding timer.
    pub fn cancel_all(&self) {
        for (_, task) in self.tasks.lock().drain() {
            task.abort();
        }
    }

    fn spawn<F>(
        &self,
        make_task: impl FnOnce(Uuid, TaskRegistry) -> F,
    ) -> Result<TimeoutHandle, TimeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| TimeError::ServiceUnavailable)?;
        let id = Uuid::new_v4();
        // Held across spawn so a fast-finishing task cannot remove itself before insertion.
        let mut tasks = self.tasks.lock();
        let task = runtime.spawn(make_task(id, Arc::clone(&self.tasks)));
        tasks.insert(id, task);
        Ok(id)
    }
}

impl TimerEffects for RealTimerHandler {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64
    }

    fn set_timeout(
        &self,
        delay_ms: u64,
        callback: TimerCallback,
    ) -> Result<TimeoutHandle, TimeError> {
        self.spawn(|id, tasks| async move {
            let mut callback = callback;
            time::sleep(Duration::from_millis(delay_ms)).await;
            tasks.lock().remove(&id);
            callback();
        })
    }

    fn set_interval(
        &self,
        period_ms: u64,
        callback: TimerCallback,
    ) -> Result<TimeoutHandle, TimeError> {
        // tokio rejects a zero period
        let period = Duration::from_millis(period_ms.max(1));
        self.spawn(|_, _| async move {
            let mut callback = callback;
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback();
            }
        })
    }

    fn clear_timer(&self, handle: TimeoutHandle) -> Result<(), TimeError> {
        match self.tasks.lock().remove(&handle) {
            Some(task) => {
                task.abort();
                Ok(())
            }
            None => Err(TimeError::TimeoutNotFound { handle }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, TimerCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (
            count,
            Box::new(move || {
                inner.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn scheduling_outside_runtime_is_unavailable() {
        let handler = RealTimerHandler::new();
        let (_, callback) = counter();
        assert_eq!(
            handler.set_timeout(10, callback),
            Err(TimeError::ServiceUnavailable)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fires_once_after_delay() {
        let handler = RealTimerHandler::new();
        let (count, callback) = counter();
        handler.set_timeout(50, callback).unwrap();

        time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_millis(40)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(handler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cleared_timeout_never_fires() {
        let handler = RealTimerHandler::new();
        let (count, callback) = counter();
        let handle = handler.set_timeout(50, callback).unwrap();
        handler.clear_timer(handle).unwrap();

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(
            handler.clear_timer(handle),
            Err(TimeError::TimeoutNotFound { handle })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn interval_repeats_until_cleared() {
        let handler = RealTimerHandler::new();
        let (count, callback) = counter();
        let handle = handler.set_interval(10, callback).unwrap();

        time::sleep(Duration::from_millis(35)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);

        handler.clear_timer(handle).unwrap();
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
