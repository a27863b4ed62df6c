//! Connection status presenter.

use crate::reconciler::ConnectionState;
use crate::ui::Ui;

pub const DISCONNECTED_TEXT: &str = "Disconnected...";

/// Renders liveness as status text + reconnect control visibility. Repeated
/// renders of the same state write nothing.
#[derive(Debug, Default)]
pub struct StatusPresenter {
    last: Option<ConnectionState>,
}

impl StatusPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_rendered(&self) -> Option<ConnectionState> {
        self.last
    }

    /// Returns true when something was written to the UI.
    pub fn render(&mut self, state: ConnectionState, ui: &mut dyn Ui) -> bool {
        if self.last == Some(state) {
            return false;
        }
        self.last = Some(state);

        match state {
            ConnectionState::Connected => {
                ui.set_status_text("");
                ui.set_reconnect_visible(false);
            }
            ConnectionState::Disconnected => {
                ui.set_status_text(DISCONNECTED_TEXT);
                ui.set_reconnect_visible(true);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::Notification;

    #[derive(Default)]
    struct Writes(Vec<String>);

    impl Ui for Writes {
        fn show_countdown(&mut self, text: &str) {
            self.0.push(format!("countdown {text}"));
        }
        fn set_status_text(&mut self, text: &str) {
            self.0.push(format!("status {text:?}"));
        }
        fn set_reconnect_visible(&mut self, visible: bool) {
            self.0.push(format!("visible {visible}"));
        }
        fn set_reconnect_enabled(&mut self, enabled: bool) {
            self.0.push(format!("enabled {enabled}"));
        }
        fn notify(&mut self, n: &Notification) {
            self.0.push(format!("notify {}", n.body));
        }
    }

    #[test]
    fn test_render_each_state() {
        let mut presenter = StatusPresenter::new();
        let mut ui = Writes::default();

        assert!(presenter.render(ConnectionState::Disconnected, &mut ui));
        assert!(presenter.render(ConnectionState::Connected, &mut ui));
        assert_eq!(
            ui.0,
            vec![
                "status \"Disconnected...\"",
                "visible true",
                "status \"\"",
                "visible false",
            ]
        );
    }

    #[test]
    fn test_same_state_is_not_rewritten() {
        let mut presenter = StatusPresenter::new();
        let mut ui = Writes::default();

        presenter.render(ConnectionState::Connected, &mut ui);
        assert!(!presenter.render(ConnectionState::Connected, &mut ui));
        assert!(!presenter.render(ConnectionState::Connected, &mut ui));
        assert_eq!(ui.0.len(), 2);
        assert_eq!(presenter.last_rendered(), Some(ConnectionState::Connected));
    }
}
