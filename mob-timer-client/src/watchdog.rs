//! Liveness watchdog.
//!
//! The event stream never says "disconnected": silence is the only signal.
//! Every received event calls [`Watchdog::refresh`]; if `timeout` passes
//! without one, the scheduled task reports expiry with the generation it
//! was armed for.

use crate::scheduler::{Scheduler, TimerHandle};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_secs(10);

pub type ExpiryCallback = Arc<dyn Fn(u64) + Send + Sync>;

pub struct Watchdog {
    timeout: Duration,
    scheduler: Arc<dyn Scheduler>,
    on_expire: ExpiryCallback,
    generation: u64,
    pending: Option<TimerHandle>,
}

impl Watchdog {
    pub fn new(timeout: Duration, scheduler: Arc<dyn Scheduler>, on_expire: ExpiryCallback) -> Self {
        Self {
            timeout,
            scheduler,
            on_expire,
            generation: 0,
            pending: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cancels the pending deadline (if any) and arms a new one.
    pub fn refresh(&mut self) {
        if let Some(previous) = self.pending.take() {
            previous.cancel();
        }
        self.generation += 1;

        let generation = self.generation;
        let on_expire = self.on_expire.clone();
        self.pending = Some(
            self.scheduler
                .schedule(self.timeout, Box::new(move || on_expire(generation))),
        );
    }

    /// Consumes an expiry report. True only once, and only for the deadline
    /// currently armed; reports from cancelled deadlines are ignored.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.pending.is_none() {
            debug!("ignoring stale watchdog expiry (gen {generation}, current {})", self.generation);
            return false;
        }
        self.pending = None;
        true
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;
    use parking_lot::Mutex;

    fn watchdog(scheduler: &ManualScheduler) -> (Watchdog, Arc<Mutex<Vec<u64>>>) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = fired.clone();
        let dog = Watchdog::new(
            DEFAULT_LIVENESS_TIMEOUT,
            Arc::new(scheduler.clone()),
            Arc::new(move |gen| sink.lock().push(gen)),
        );
        (dog, fired)
    }

    #[test]
    fn test_refresh_spaced_below_timeout_never_fires() {
        let scheduler = ManualScheduler::new();
        let (mut dog, fired) = watchdog(&scheduler);

        dog.refresh();
        for _ in 0..20 {
            scheduler.advance(Duration::from_millis(9_999));
            dog.refresh();
        }

        assert!(fired.lock().is_empty());
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn test_silence_fires_exactly_once() {
        let scheduler = ManualScheduler::new();
        let (mut dog, fired) = watchdog(&scheduler);

        dog.refresh();
        scheduler.advance(Duration::from_secs(10));
        scheduler.advance(Duration::from_secs(60));

        assert_eq!(*fired.lock(), vec![1]);
        assert!(dog.expire(1));
        assert!(!dog.expire(1));
        assert!(!dog.is_armed());
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let scheduler = ManualScheduler::new();
        let (mut dog, _fired) = watchdog(&scheduler);

        dog.refresh();
        dog.refresh();

        assert!(!dog.expire(1));
        assert!(dog.is_armed());
        assert!(dog.expire(2));
    }

    #[test]
    fn test_rearm_after_expiry() {
        let scheduler = ManualScheduler::new();
        let (mut dog, fired) = watchdog(&scheduler);

        dog.refresh();
        scheduler.advance(Duration::from_secs(11));
        assert!(dog.expire(1));

        dog.refresh();
        scheduler.advance(Duration::from_secs(11));
        assert_eq!(*fired.lock(), vec![1, 2]);
        assert!(dog.expire(2));
    }
}
