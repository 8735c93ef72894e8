//! Interval scheduler — fires the broadcast cycle on a randomized
//! recurring delay.
//!
//! Every arm draws an independent uniform delay from
//! `[lower, upper]` minutes: after each fire, and again whenever the
//! bounds are reconfigured. Consecutive intervals are never a fixed
//! period.
//!
//! Overlap policy: a fire that lands while the previous cycle is
//! still running is skipped (logged at warn), not queued.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

use promocast_core::error::Result;
use promocast_core::types::BroadcastConfig;

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
    Paused,
}

const STATE_STOPPED: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_PAUSED: u8 = 2;

enum Command {
    Reconfigure(u32, u32),
    Pause,
    Resume,
    Shutdown,
}

/// Handle to the scheduler loop. Cheap to share; all methods take
/// `&self`.
pub struct IntervalScheduler {
    tx: mpsc::UnboundedSender<Command>,
    state: Arc<AtomicU8>,
    bounds: Arc<Mutex<(u32, u32)>>,
}

impl IntervalScheduler {
    /// Validate bounds, arm the timer, and spawn the loop. The first
    /// fire occurs after a uniform draw from `[lower, upper]` minutes.
    pub fn start<F, Fut>(lower: u32, upper: u32, on_fire: F) -> Result<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        BroadcastConfig::validate_bounds(lower, upper)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let state = Arc::new(AtomicU8::new(STATE_RUNNING));
        let bounds = Arc::new(Mutex::new((lower, upper)));

        tokio::spawn(run_loop(
            rx,
            Arc::clone(&state),
            Arc::clone(&bounds),
            on_fire,
        ));

        Ok(Self { tx, state, bounds })
    }

    /// Cancel the pending delay and re-arm with a fresh draw from the
    /// new bounds. An in-flight cycle is left to complete.
    pub fn reconfigure(&self, lower: u32, upper: u32) -> Result<()> {
        BroadcastConfig::validate_bounds(lower, upper)?;
        *self.bounds.lock().unwrap_or_else(|e| e.into_inner()) = (lower, upper);
        let _ = self.tx.send(Command::Reconfigure(lower, upper));
        tracing::info!("scheduler re-armed with bounds {lower}..{upper} minutes");
        Ok(())
    }

    /// Suspend firing without discarding the bounds. No-op if already
    /// paused.
    pub fn pause(&self) {
        if self
            .state
            .compare_exchange(
                STATE_RUNNING,
                STATE_PAUSED,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
        {
            let _ = self.tx.send(Command::Pause);
            tracing::info!("scheduler paused");
        }
    }

    /// Continue firing; the next delay is freshly drawn. No-op if
    /// already running.
    pub fn resume(&self) {
        if self
            .state
            .compare_exchange(
                STATE_PAUSED,
                STATE_RUNNING,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
        {
            let _ = self.tx.send(Command::Resume);
            tracing::info!("scheduler resumed");
        }
    }

    /// Stop the loop entirely. Bound to process shutdown.
    pub fn shutdown(&self) {
        self.state.store(STATE_STOPPED, Ordering::SeqCst);
        let _ = self.tx.send(Command::Shutdown);
    }

    pub fn state(&self) -> SchedulerState {
        match self.state.load(Ordering::SeqCst) {
            STATE_RUNNING => SchedulerState::Running,
            STATE_PAUSED => SchedulerState::Paused,
            _ => SchedulerState::Stopped,
        }
    }

    /// Currently configured bounds, minutes.
    pub fn bounds(&self) -> (u32, u32) {
        *self.bounds.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Uniform draw over `[lower, upper]` minutes.
fn draw_delay<R: Rng>(rng: &mut R, lower: u32, upper: u32) -> Duration {
    let minutes = rng.gen_range(lower..=upper);
    Duration::from_secs(u64::from(minutes) * 60)
}

async fn run_loop<F, Fut>(
    mut rx: mpsc::UnboundedReceiver<Command>,
    state: Arc<AtomicU8>,
    bounds: Arc<Mutex<(u32, u32)>>,
    on_fire: F,
) where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut rng = StdRng::from_entropy();
    // Running-cycle lock: an overlapping fire is skipped, never queued
    let run_lock = Arc::new(tokio::sync::Mutex::new(()));

    loop {
        let (lower, upper) = *bounds.lock().unwrap_or_else(|e| e.into_inner());
        let delay = draw_delay(&mut rng, lower, upper);
        tracing::info!("next broadcast in {} minutes", delay.as_secs() / 60);

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);

        let fire = 'armed: loop {
            tokio::select! {
                _ = &mut sleep => break 'armed true,
                cmd = rx.recv() => match cmd {
                    None | Some(Command::Shutdown) => {
                        state.store(STATE_STOPPED, Ordering::SeqCst);
                        return;
                    }
                    Some(Command::Reconfigure(lo, hi)) => {
                        *bounds.lock().unwrap_or_else(|e| e.into_inner()) = (lo, hi);
                        // Redraw with the new bounds
                        break 'armed false;
                    }
                    Some(Command::Pause) => {
                        // Countdown discarded, bounds kept
                        loop {
                            match rx.recv().await {
                                None | Some(Command::Shutdown) => {
                                    state.store(STATE_STOPPED, Ordering::SeqCst);
                                    return;
                                }
                                Some(Command::Resume) => break,
                                Some(Command::Reconfigure(lo, hi)) => {
                                    *bounds.lock().unwrap_or_else(|e| e.into_inner()) = (lo, hi);
                                }
                                Some(Command::Pause) => {}
                            }
                        }
                        break 'armed false;
                    }
                    Some(Command::Resume) => {}
                }
            }
        };

        if fire && state.load(Ordering::SeqCst) == STATE_RUNNING {
            match Arc::clone(&run_lock).try_lock_owned() {
                Ok(guard) => {
                    let cycle = on_fire();
                    tokio::spawn(async move {
                        cycle.await;
                        drop(guard);
                    });
                }
                Err(_) => {
                    tracing::warn!("previous broadcast cycle still running; skipping this fire");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promocast_core::error::PromoError;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn draw_stays_within_bounds_and_varies() {
        let mut rng = StdRng::from_entropy();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let d = draw_delay(&mut rng, 30, 40);
            let minutes = d.as_secs() / 60;
            assert!((30..=40).contains(&minutes), "drew {minutes}");
            seen.insert(minutes);
        }
        // 200 draws over 11 values are statistically never constant
        assert!(seen.len() > 1);
    }

    #[test]
    fn degenerate_bounds_are_constant() {
        let mut rng = StdRng::from_entropy();
        for _ in 0..10 {
            assert_eq!(draw_delay(&mut rng, 5, 5).as_secs(), 300);
        }
    }

    #[tokio::test]
    async fn start_rejects_invalid_bounds() {
        let err = IntervalScheduler::start(0, 10, || async {}).err().unwrap();
        assert!(matches!(err, PromoError::InvalidBounds { .. }));
        let err = IntervalScheduler::start(40, 30, || async {}).err().unwrap();
        assert!(matches!(err, PromoError::InvalidBounds { lower: 40, upper: 30 }));
    }

    #[tokio::test]
    async fn reconfigure_rejects_invalid_bounds() {
        let scheduler = IntervalScheduler::start(30, 40, || async {}).unwrap();
        assert!(scheduler.reconfigure(10, 5).is_err());
        // Bounds unchanged after the rejected call
        assert_eq!(scheduler.bounds(), (30, 40));
        scheduler.shutdown();
    }

    #[tokio::test]
    async fn pause_is_idempotent_and_resume_restores() {
        let scheduler = IntervalScheduler::start(30, 40, || async {}).unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Running);

        scheduler.pause();
        assert_eq!(scheduler.state(), SchedulerState::Paused);
        scheduler.pause();
        assert_eq!(scheduler.state(), SchedulerState::Paused);

        scheduler.resume();
        assert_eq!(scheduler.state(), SchedulerState::Running);
        scheduler.resume();
        assert_eq!(scheduler.state(), SchedulerState::Running);

        scheduler.shutdown();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_the_drawn_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let scheduler = IntervalScheduler::start(1, 1, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();

        // Bounds are 1..1, so the delay is exactly one minute
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(fired.load(Ordering::SeqCst) >= 1);
        scheduler.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn paused_scheduler_never_fires() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let scheduler = IntervalScheduler::start(1, 1, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();

        scheduler.pause();
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        scheduler.shutdown();
    }
}
