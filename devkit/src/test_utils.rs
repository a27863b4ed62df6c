/*!
Test Harness pour le client Mob Timer

Facilite l'écriture de tests avec:
- Client câblé sur un `MockTransport` et un `ManualScheduler` (temps virtuel)
- UI d'enregistrement pour les assertions
- Pompage explicite des messages, sans runtime ni horloge réelle
*/

use crate::mock_transport::MockTransport;
use anyhow::Result;
use mob_timer_client::stream::RawEvent;
use mob_timer_client::ui::{Notification, Ui};
use mob_timer_client::{Client, ClientOptions, ManualScheduler, Message, ReconnectSource};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Clone)]
pub struct UiState {
    pub countdown: Option<String>,
    pub countdown_history: Vec<String>,
    pub status_text: String,
    pub reconnect_visible: bool,
    pub reconnect_enabled: bool,
    pub notifications: Vec<Notification>,
    /// Status text + visibility writes, to check the presenter does not flicker.
    pub status_writes: usize,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            countdown: None,
            countdown_history: Vec::new(),
            status_text: String::new(),
            reconnect_visible: false,
            reconnect_enabled: true,
            notifications: Vec::new(),
            status_writes: 0,
        }
    }
}

/// UI qui enregistre tout ce que le client affiche
#[derive(Clone, Default)]
pub struct RecordingUi {
    state: Arc<Mutex<UiState>>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> UiState {
        self.state.lock().clone()
    }

    pub fn notification_bodies(&self) -> Vec<String> {
        self.state.lock().notifications.iter().map(|n| n.body.clone()).collect()
    }
}

impl Ui for RecordingUi {
    fn show_countdown(&mut self, text: &str) {
        let mut state = self.state.lock();
        state.countdown = Some(text.to_string());
        state.countdown_history.push(text.to_string());
    }

    fn set_status_text(&mut self, text: &str) {
        let mut state = self.state.lock();
        state.status_text = text.to_string();
        state.status_writes += 1;
    }

    fn set_reconnect_visible(&mut self, visible: bool) {
        let mut state = self.state.lock();
        state.reconnect_visible = visible;
        state.status_writes += 1;
    }

    fn set_reconnect_enabled(&mut self, enabled: bool) {
        self.state.lock().reconnect_enabled = enabled;
    }

    fn notify(&mut self, notification: &Notification) {
        log::info!("🔔 [UI] {}", notification.body);
        self.state.lock().notifications.push(notification.clone());
    }
}

/// Harness de test complet pour le client
pub struct TestHarness {
    pub client: Client,
    pub transport: MockTransport,
    pub scheduler: ManualScheduler,
    pub ui: RecordingUi,
    rx: UnboundedReceiver<Message>,
}

impl TestHarness {
    /// Crée un client démarré avec les options par défaut
    pub fn new() -> Self {
        Self::with_options(ClientOptions::default())
    }

    pub fn with_options(options: ClientOptions) -> Self {
        env_logger::try_init().ok(); // Init logging pour tests

        let transport = MockTransport::new();
        let scheduler = ManualScheduler::new();
        let ui = RecordingUi::new();
        let (mut client, rx) = Client::new(
            options,
            Arc::new(transport.clone()),
            Arc::new(scheduler.clone()),
            Box::new(ui.clone()),
        );
        client.start();

        Self {
            client,
            transport,
            scheduler,
            ui,
            rx,
        }
    }

    /// Applique tous les messages en attente. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.client.handle(message);
            handled += 1;
        }
        handled
    }

    /// Simule un événement serveur sur la connexion courante
    pub fn push(&mut self, event: RawEvent) -> bool {
        let delivered = self.transport.push(&event);
        self.pump();
        delivered
    }

    pub fn push_sse(&mut self, text: &str) -> usize {
        let delivered = self.transport.push_sse(text);
        self.pump();
        delivered
    }

    /// Avance le temps virtuel puis traite les messages produits par les timers
    pub fn advance(&mut self, by: Duration) -> usize {
        let fired = self.scheduler.advance(by);
        self.pump();
        fired
    }

    pub fn advance_secs(&mut self, secs: u64) -> usize {
        self.advance(Duration::from_secs(secs))
    }

    /// Simule un clic sur le bouton reconnect
    pub fn click_reconnect(&mut self) {
        self.send(Message::ReconnectRequested(ReconnectSource::User));
    }

    pub fn send(&mut self, message: Message) {
        self.client.handle(message);
        self.pump();
    }

    /// Assert que le compte à rebours affiché vaut `expected`
    pub fn assert_countdown(&self, expected: &str) -> Result<()> {
        let shown = self.ui.snapshot().countdown;
        if shown.as_deref() == Some(expected) {
            log::info!("✅ countdown shows {}", expected);
            return Ok(());
        }
        anyhow::bail!("countdown mismatch: expected {:?}, got {:?}", expected, shown);
    }

    /// Assert qu'une notification avec ce texte a été levée
    pub fn assert_notified(&self, body: &str) -> Result<()> {
        if self.ui.notification_bodies().iter().any(|b| b == body) {
            log::info!("✅ notified: {}", body);
            return Ok(());
        }
        anyhow::bail!("notification {:?} not raised (got {:?})", body, self.ui.notification_bodies());
    }

    /// Assert que le statut "Disconnected..." et le bouton reconnect sont visibles
    pub fn assert_disconnected_shown(&self) -> Result<()> {
        let state = self.ui.snapshot();
        if state.status_text == mob_timer_client::presenter::DISCONNECTED_TEXT && state.reconnect_visible {
            return Ok(());
        }
        anyhow::bail!(
            "expected disconnected status, got {:?} (reconnect visible: {})",
            state.status_text,
            state.reconnect_visible
        );
    }

    pub fn assert_connected_shown(&self) -> Result<()> {
        let state = self.ui.snapshot();
        if state.status_text.is_empty() && !state.reconnect_visible {
            return Ok(());
        }
        anyhow::bail!("expected connected status, got {:?}", state.status_text);
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
