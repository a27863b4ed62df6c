//! Output port of the client and its terminal implementation.

use std::io::Write;
use tracing::debug;

pub const NOTIFICATION_TITLE: &str = "Mob Timer";
pub const NOTIFICATION_TAG: &str = "mob-timer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Notifications sharing a tag replace each other.
    pub tag: String,
}

impl Notification {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            body: body.into(),
            tag: NOTIFICATION_TAG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    Granted,
    Denied,
    Unsupported,
}

/// Everything the client can show. Implementations only render; they hold no
/// client state.
pub trait Ui: Send {
    fn show_countdown(&mut self, text: &str);
    fn set_status_text(&mut self, text: &str);
    fn set_reconnect_visible(&mut self, visible: bool);
    fn set_reconnect_enabled(&mut self, enabled: bool);
    fn notify(&mut self, notification: &Notification);
}

/// Raises notifications only when permission was granted; otherwise a silent no-op.
#[derive(Debug, Clone, Copy)]
pub struct Notifier {
    permission: NotificationPermission,
}

impl Notifier {
    pub fn new(permission: NotificationPermission) -> Self {
        Self { permission }
    }

    pub fn permission(&self) -> NotificationPermission {
        self.permission
    }

    pub fn send(&self, ui: &mut dyn Ui, body: &str) {
        if self.permission != NotificationPermission::Granted {
            debug!("notification suppressed ({:?}): {}", self.permission, body);
            return;
        }
        ui.notify(&Notification::new(body));
    }
}

/// Line-oriented rendering on stdout.
pub struct TerminalUi<W: Write + Send> {
    out: W,
    reconnect_visible: bool,
    reconnect_enabled: bool,
}

impl TerminalUi<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalUi<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            reconnect_visible: false,
            reconnect_enabled: true,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            debug!("terminal write failed: {}", e);
        }
    }

    fn reconnect_hint(&mut self) {
        if !self.reconnect_visible {
            return;
        }
        if self.reconnect_enabled {
            self.line("   type 'r' + Enter to reconnect");
        } else {
            self.line("   (reconnect available again in a few seconds)");
        }
    }
}

impl<W: Write + Send> Ui for TerminalUi<W> {
    fn show_countdown(&mut self, text: &str) {
        self.line(&format!("⏱  {text}"));
    }

    fn set_status_text(&mut self, text: &str) {
        if text.is_empty() {
            self.line("● connected");
        } else {
            self.line(&format!("○ {text}"));
        }
    }

    fn set_reconnect_visible(&mut self, visible: bool) {
        self.reconnect_visible = visible;
        self.reconnect_hint();
    }

    fn set_reconnect_enabled(&mut self, enabled: bool) {
        self.reconnect_enabled = enabled;
        self.reconnect_hint();
    }

    fn notify(&mut self, notification: &Notification) {
        self.line(&format!("\x07[{}] {}", notification.title, notification.body));
    }
}
