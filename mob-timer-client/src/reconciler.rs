//! Event reconciliation: one incoming [`StreamEvent`] in, the new local state
//! and the side effects to perform out. No I/O here; the client performs the
//! effects.

use crate::stream::StreamEvent;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Last known remaining time, whole seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerSnapshot(pub u64);

impl TimerSnapshot {
    pub fn seconds(&self) -> u64 {
        self.0
    }

    pub fn display(&self) -> String {
        format_clock(self.0)
    }
}

impl fmt::Display for TimerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// `MM:SS`, both parts zero-padded to two digits. Minutes are not capped.
pub fn format_clock(sec: u64) -> String {
    format!("{:02}:{:02}", sec / 60, sec % 60)
}

/// Effects requested by one reconciliation step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Countdown text to render, if the snapshot changed.
    pub countdown: Option<String>,
    /// Notification body to raise (subject to permission).
    pub notification: Option<String>,
    /// True when the event moved the connection from Disconnected to Connected.
    pub reconnected: bool,
}

#[derive(Debug)]
pub struct Reconciler {
    connection: ConnectionState,
    snapshot: TimerSnapshot,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            connection: ConnectionState::Connected,
            snapshot: TimerSnapshot::default(),
        }
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshot
    }

    pub fn apply(&mut self, event: &StreamEvent) -> Reconciliation {
        let reconnected = self.connection == ConnectionState::Disconnected;
        self.connection = ConnectionState::Connected;

        let mut out = Reconciliation {
            reconnected,
            ..Reconciliation::default()
        };

        match event {
            StreamEvent::Tick { sec } => {
                out.countdown = Some(self.set_snapshot(*sec));
            }
            StreamEvent::Start { sec, name } => {
                let clock = self.set_snapshot(*sec);
                out.notification = Some(format!("Timer started by {} ({})", display_name(name), clock));
                out.countdown = Some(clock);
            }
            StreamEvent::Stop { sec, name } => {
                let clock = self.set_snapshot(*sec);
                out.notification = Some(format!("Timer stopped by {} ({})", display_name(name), clock));
                out.countdown = Some(clock);
            }
            StreamEvent::Over => {
                out.notification = Some("Time ended".to_string());
            }
            StreamEvent::Alive => {}
        }
        out
    }

    /// Seeds the snapshot from an out-of-band source (status query, toggle
    /// response). Connection state is left alone.
    pub fn seed(&mut self, sec: u64) -> String {
        self.set_snapshot(sec)
    }

    /// Returns true if this call changed the state.
    pub fn mark_disconnected(&mut self) -> bool {
        let changed = self.connection == ConnectionState::Connected;
        self.connection = ConnectionState::Disconnected;
        changed
    }

    fn set_snapshot(&mut self, sec: u64) -> String {
        self.snapshot = TimerSnapshot(sec);
        self.snapshot.display()
    }
}

fn display_name(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or("undefined")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_clock_examples() {
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(5), "00:05");
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(6000), "100:00");
    }

    #[test]
    fn test_format_clock_full_hour_range() {
        for sec in 0..3600u64 {
            let expected = format!("{:02}:{:02}", sec / 60, sec % 60);
            let rendered = format_clock(sec);
            assert_eq!(rendered, expected);
            assert_eq!(rendered.len(), 5);
        }
    }

    #[test]
    fn test_start_event_renders_and_notifies() {
        let mut reconciler = Reconciler::new();
        let out = reconciler.apply(&StreamEvent::Start {
            sec: 1500,
            name: Some("Ada".into()),
        });

        assert_eq!(out.countdown.as_deref(), Some("25:00"));
        assert_eq!(out.notification.as_deref(), Some("Timer started by Ada (25:00)"));
        assert_eq!(reconciler.snapshot(), TimerSnapshot(1500));
    }

    #[test]
    fn test_stop_event_notifies() {
        let mut reconciler = Reconciler::new();
        let out = reconciler.apply(&StreamEvent::Stop {
            sec: 754,
            name: Some("Grace".into()),
        });
        assert_eq!(out.notification.as_deref(), Some("Timer stopped by Grace (12:34)"));
    }

    #[test]
    fn test_missing_name_renders_undefined() {
        let mut reconciler = Reconciler::new();
        let out = reconciler.apply(&StreamEvent::Start { sec: 60, name: None });
        assert_eq!(out.notification.as_deref(), Some("Timer started by undefined (01:00)"));
    }

    #[test]
    fn test_tick_updates_without_notification() {
        let mut reconciler = Reconciler::new();
        let out = reconciler.apply(&StreamEvent::Tick { sec: 59 });
        assert_eq!(out.countdown.as_deref(), Some("00:59"));
        assert_eq!(out.notification, None);
    }

    #[test]
    fn test_over_keeps_snapshot() {
        let mut reconciler = Reconciler::new();
        reconciler.seed(3);
        let out = reconciler.apply(&StreamEvent::Over);

        assert_eq!(out.countdown, None);
        assert_eq!(out.notification.as_deref(), Some("Time ended"));
        assert_eq!(reconciler.snapshot(), TimerSnapshot(3));
    }

    #[test]
    fn test_alive_has_no_render_side_effect() {
        let mut reconciler = Reconciler::new();
        assert_eq!(reconciler.apply(&StreamEvent::Alive), Reconciliation::default());
    }

    #[test]
    fn test_any_event_reconnects() {
        let mut reconciler = Reconciler::new();
        assert!(reconciler.mark_disconnected());
        assert!(!reconciler.mark_disconnected());
        assert_eq!(reconciler.connection(), ConnectionState::Disconnected);

        let first = reconciler.apply(&StreamEvent::Alive);
        let second = reconciler.apply(&StreamEvent::Alive);
        assert!(first.reconnected);
        assert!(!second.reconnected);
        assert_eq!(reconciler.connection(), ConnectionState::Connected);
    }

    #[test]
    fn test_seed_leaves_connection_alone() {
        let mut reconciler = Reconciler::new();
        reconciler.mark_disconnected();
        assert_eq!(reconciler.seed(125), "02:05");
        assert_eq!(reconciler.connection(), ConnectionState::Disconnected);
    }
}
