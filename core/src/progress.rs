//! Time-driven progress signal shown while a scan attempt is in flight.
//!
//! The percentage is purely cosmetic: it advances on a fixed interval
//! independently of the real identification call and stalls at
//! [`SIMULATED_CEILING`] until stopped. Claiming completion is the
//! orchestrator's job, after the real operation has settled.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;

pub const TICK_INTERVAL: Duration = Duration::from_millis(120);
pub const TICK_STEP: u8 = 4;
/// The simulator never advances past this value on its own.
pub const SIMULATED_CEILING: u8 = 90;
pub const COMPLETE: u8 = 100;

pub struct ProgressSimulator;

impl ProgressSimulator {
    /// Spawns the tick task. It advances `progress` by [`TICK_STEP`] every
    /// [`TICK_INTERVAL`] until stopped, never exceeding the ceiling.
    pub fn start(progress: Arc<watch::Sender<u8>>) -> ProgressHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_tick_loop(progress, shutdown_rx));
        ProgressHandle { shutdown_tx, task }
    }
}

pub struct ProgressHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ProgressHandle {
    /// Halts ticking. Returns only after the tick task has fully exited, so
    /// a final value written afterwards can never be overwritten by a stale
    /// tick.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.task.await;
    }

    /// Synchronous teardown for reset paths that cannot await.
    pub fn abort(self) {
        let _ = self.shutdown_tx.send(());
        self.task.abort();
    }
}

async fn run_tick_loop(progress: Arc<watch::Sender<u8>>, mut shutdown: oneshot::Receiver<()>) {
    let mut ticker = interval(TICK_INTERVAL);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                progress.send_modify(|pct| {
                    *pct = pct.saturating_add(TICK_STEP).min(SIMULATED_CEILING);
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn progress_is_monotonic_and_capped() {
        let (tx, mut rx) = watch::channel(0u8);
        let handle = ProgressSimulator::start(Arc::new(tx));

        let mut last = 0u8;
        // Far more ticks than it takes to reach the ceiling.
        for _ in 0..60 {
            advance(TICK_INTERVAL).await;
            let pct = *rx.borrow_and_update();
            assert!(pct >= last, "progress went backwards: {last} -> {pct}");
            assert!(pct <= SIMULATED_CEILING, "progress exceeded ceiling: {pct}");
            last = pct;
        }
        assert_eq!(last, SIMULATED_CEILING);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_ticking() {
        let (tx, rx) = watch::channel(0u8);
        let tx = Arc::new(tx);
        let handle = ProgressSimulator::start(Arc::clone(&tx));

        advance(TICK_INTERVAL * 3).await;
        handle.stop().await;
        let frozen = *rx.borrow();

        advance(TICK_INTERVAL * 10).await;
        assert_eq!(*rx.borrow(), frozen);

        // The final jump to 100 is the caller's explicit step.
        tx.send_replace(COMPLETE);
        assert_eq!(*rx.borrow(), COMPLETE);
    }
}
