//! Reconnect gating.
//!
//! Decides whether a reconnect request goes through. User requests disable
//! the reconnect control for a cooldown window; the window ends on a timer
//! whatever the reconnect's outcome. Watchdog requests are never throttled.

use crate::scheduler::{Scheduler, TimerHandle};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_RECONNECT_COOLDOWN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectSource {
    User,
    Watchdog,
}

impl fmt::Display for ReconnectSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconnectSource::User => f.write_str("user"),
            ReconnectSource::Watchdog => f.write_str("watchdog"),
        }
    }
}

/// What happens when the liveness watchdog expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryPolicy {
    /// Show "Disconnected..." and wait for the user to reconnect.
    #[default]
    SurfaceOnly,
    /// Show the status and reconnect right away.
    AutoReconnect,
}

pub struct ReconnectController {
    cooldown: Duration,
    scheduler: Arc<dyn Scheduler>,
    on_cooldown_elapsed: Arc<dyn Fn() + Send + Sync>,
    control_enabled: bool,
    cooldown_timer: Option<TimerHandle>,
}

impl ReconnectController {
    pub fn new(
        cooldown: Duration,
        scheduler: Arc<dyn Scheduler>,
        on_cooldown_elapsed: Arc<dyn Fn() + Send + Sync>,
    ) -> Self {
        Self {
            cooldown,
            scheduler,
            on_cooldown_elapsed,
            control_enabled: true,
            cooldown_timer: None,
        }
    }

    pub fn is_control_enabled(&self) -> bool {
        self.control_enabled
    }

    /// True if the caller should tear down and reopen the stream now.
    pub fn trigger(&mut self, source: ReconnectSource) -> bool {
        match source {
            ReconnectSource::User if !self.control_enabled => {
                info!("reconnect ignored: control disabled during cooldown");
                false
            }
            ReconnectSource::User => {
                self.control_enabled = false;
                let notify = self.on_cooldown_elapsed.clone();
                self.cooldown_timer = Some(self.scheduler.schedule(self.cooldown, Box::new(move || notify())));
                debug!("reconnect control disabled for {:?}", self.cooldown);
                true
            }
            ReconnectSource::Watchdog => true,
        }
    }

    /// Re-enables the control. Returns true if it was disabled.
    pub fn cooldown_elapsed(&mut self) -> bool {
        self.cooldown_timer = None;
        !std::mem::replace(&mut self.control_enabled, true)
    }
}
