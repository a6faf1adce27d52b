//! Real timer handler behind the `TimerEffects` seam

use persona_core::{TimeError, TimerEffects};
use persona_effects::RealTimerHandler;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn ticking(
    timers: &dyn TimerEffects,
    period_ms: u64,
) -> (mpsc::UnboundedReceiver<u64>, uuid::Uuid) {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut tick = 0;
    let handle = timers
        .set_interval(
            period_ms,
            Box::new(move || {
                tick += 1;
                let _ = tx.send(tick);
            }),
        )
        .unwrap();
    (rx, handle)
}

#[tokio::test(start_paused = true)]
async fn interval_ticks_until_cleared() {
    let handler = RealTimerHandler::new();
    let (mut ticks, handle) = ticking(&handler, 25);

    for expected in 1..=3 {
        assert_eq!(ticks.recv().await, Some(expected));
    }
    handler.clear_timer(handle).unwrap();
    assert_eq!(handler.pending_count(), 0);

    // The aborted task drops its sender, closing the channel.
    assert_eq!(ticks.recv().await, None);
    assert_eq!(
        handler.clear_timer(handle),
        Err(TimeError::TimeoutNotFound { handle })
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_all_stops_every_timer() {
    let handler = RealTimerHandler::new();
    let (mut fast, _) = ticking(&handler, 10);
    let (mut slow, _) = ticking(&handler, 1_000);
    assert_eq!(handler.pending_count(), 2);

    assert_eq!(fast.recv().await, Some(1));
    handler.cancel_all();

    assert_eq!(handler.pending_count(), 0);
    assert_eq!(slow.recv().await, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timeout_runs_on_a_worker_thread() {
    let timers: Arc<dyn TimerEffects> = Arc::new(RealTimerHandler::new());
    let (tx, mut rx) = mpsc::unbounded_channel();
    let scheduled_at = timers.now_ms();

    timers
        .set_timeout(
            5,
            Box::new(move || {
                let _ = tx.send(());
            }),
        )
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(timers.now_ms() >= scheduled_at);
    assert!(!timers.is_simulated());
}
