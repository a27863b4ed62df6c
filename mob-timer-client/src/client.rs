/**
 * CLIENT - Coordinateur unique du minuteur partagé
 *
 * ROLE : Owns every piece of client state (connection state, countdown
 * snapshot, active subscription, watchdog, reconnect gate) and mutates it
 * from one place: `Client::handle`.
 *
 * ARCHITECTURE : Timers, stream transports, stdin and HTTP completions only
 * post `Message`s on the channel; the loop applies them in arrival order.
 */

use crate::presenter::StatusPresenter;
use crate::reconciler::{ConnectionState, Reconciler, TimerSnapshot};
use crate::reconnect::{ExpiryPolicy, ReconnectController, ReconnectSource, DEFAULT_RECONNECT_COOLDOWN};
use crate::scheduler::Scheduler;
use crate::stream::{EventKind, EventStreamSubscriber, StreamEvent, Subscription, SubscriptionId, Transport};
use crate::ui::{NotificationPermission, Notifier, Ui};
use crate::watchdog::{Watchdog, DEFAULT_LIVENESS_TIMEOUT};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A decoded event from the given subscription.
    Stream {
        subscription: SubscriptionId,
        event: StreamEvent,
    },
    /// An event arrived but its payload could not be decoded.
    Malformed {
        subscription: SubscriptionId,
        kind: EventKind,
    },
    WatchdogExpired {
        generation: u64,
    },
    ReconnectRequested(ReconnectSource),
    CooldownElapsed,
    /// Remaining seconds from the status query or a toggle response.
    TimeFetched(u64),
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
pub struct ClientOptions {
    pub liveness_timeout: Duration,
    pub reconnect_cooldown: Duration,
    pub expiry_policy: ExpiryPolicy,
    pub notification_permission: NotificationPermission,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            liveness_timeout: DEFAULT_LIVENESS_TIMEOUT,
            reconnect_cooldown: DEFAULT_RECONNECT_COOLDOWN,
            expiry_policy: ExpiryPolicy::SurfaceOnly,
            notification_permission: NotificationPermission::Granted,
        }
    }
}

pub struct Client {
    tx: UnboundedSender<Message>,
    reconciler: Reconciler,
    watchdog: Watchdog,
    subscriber: EventStreamSubscriber,
    active: Option<Subscription>,
    reconnect: ReconnectController,
    presenter: StatusPresenter,
    notifier: Notifier,
    policy: ExpiryPolicy,
    ui: Box<dyn Ui>,
}

impl Client {
    pub fn new(
        options: ClientOptions,
        transport: Arc<dyn Transport>,
        scheduler: Arc<dyn Scheduler>,
        ui: Box<dyn Ui>,
    ) -> (Self, UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let expired_tx = tx.clone();
        let watchdog = Watchdog::new(
            options.liveness_timeout,
            scheduler.clone(),
            Arc::new(move |generation| {
                let _ = expired_tx.send(Message::WatchdogExpired { generation });
            }),
        );

        let cooldown_tx = tx.clone();
        let reconnect = ReconnectController::new(
            options.reconnect_cooldown,
            scheduler,
            Arc::new(move || {
                let _ = cooldown_tx.send(Message::CooldownElapsed);
            }),
        );

        let client = Self {
            subscriber: EventStreamSubscriber::new(transport, tx.clone()),
            tx,
            reconciler: Reconciler::new(),
            watchdog,
            active: None,
            reconnect,
            presenter: StatusPresenter::new(),
            notifier: Notifier::new(options.notification_permission),
            policy: options.expiry_policy,
            ui,
        };
        (client, rx)
    }

    /// Handle for posting messages into the loop from other tasks.
    pub fn sender(&self) -> UnboundedSender<Message> {
        self.tx.clone()
    }

    pub fn connection(&self) -> ConnectionState {
        self.reconciler.connection()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.reconciler.snapshot()
    }

    pub fn active_subscription(&self) -> Option<SubscriptionId> {
        self.active.as_ref().map(Subscription::id)
    }

    pub fn is_reconnect_enabled(&self) -> bool {
        self.reconnect.is_control_enabled()
    }

    /// Arms the watchdog, shows "connected" and opens the first subscription.
    pub fn start(&mut self) {
        self.watchdog.refresh();
        self.presenter.render(self.reconciler.connection(), self.ui.as_mut());
        self.open_subscription();
    }

    /// Applies one message. Returns false once the client should stop.
    pub fn handle(&mut self, message: Message) -> bool {
        match message {
            Message::Stream { subscription, event } => self.on_event(subscription, event),
            Message::Malformed { subscription, kind } => {
                if self.is_active(subscription) {
                    // delivery alone proves the stream is alive
                    debug!("malformed '{kind}' on {subscription}, refreshing liveness only");
                    self.watchdog.refresh();
                }
            }
            Message::WatchdogExpired { generation } => self.on_watchdog_expired(generation),
            Message::ReconnectRequested(source) => self.reconnect(source),
            Message::CooldownElapsed => {
                if self.reconnect.cooldown_elapsed() {
                    self.ui.set_reconnect_enabled(true);
                }
            }
            Message::TimeFetched(sec) => {
                let text = self.reconciler.seed(sec);
                self.ui.show_countdown(&text);
            }
            Message::Shutdown => {
                info!("shutting down");
                self.close_active();
                return false;
            }
        }
        true
    }

    /// Starts the client and processes messages until `Shutdown`.
    pub async fn run(mut self, mut rx: UnboundedReceiver<Message>) {
        self.start();
        while let Some(message) = rx.recv().await {
            if !self.handle(message) {
                break;
            }
        }
    }

    fn is_active(&self, id: SubscriptionId) -> bool {
        self.active_subscription() == Some(id)
    }

    fn on_event(&mut self, subscription: SubscriptionId, event: StreamEvent) {
        if !self.is_active(subscription) {
            debug!("dropping '{}' from stale {}", event.kind(), subscription);
            return;
        }

        self.watchdog.refresh();
        let outcome = self.reconciler.apply(&event);
        if outcome.reconnected {
            info!("event stream alive again on {subscription}");
        }
        self.presenter.render(self.reconciler.connection(), self.ui.as_mut());

        if let Some(countdown) = &outcome.countdown {
            self.ui.show_countdown(countdown);
        }
        if let Some(body) = &outcome.notification {
            self.notifier.send(self.ui.as_mut(), body);
        }
    }

    fn on_watchdog_expired(&mut self, generation: u64) {
        if !self.watchdog.expire(generation) {
            return;
        }
        warn!("no event for {:?}, connection considered lost", self.watchdog.timeout());

        self.reconciler.mark_disconnected();
        self.presenter.render(self.reconciler.connection(), self.ui.as_mut());

        if self.policy == ExpiryPolicy::AutoReconnect {
            self.reconnect(ReconnectSource::Watchdog);
        }
    }

    fn reconnect(&mut self, source: ReconnectSource) {
        if !self.reconnect.trigger(source) {
            return;
        }
        if source == ReconnectSource::User {
            self.ui.set_reconnect_enabled(false);
        }
        info!("reconnecting event stream ({source})");

        self.close_active();
        self.open_subscription();
        self.watchdog.refresh();
    }

    fn open_subscription(&mut self) {
        debug_assert!(self.active.is_none(), "previous subscription must be closed first");
        self.active = Some(self.subscriber.open());
    }

    fn close_active(&mut self) {
        if let Some(mut previous) = self.active.take() {
            previous.close();
        }
    }
}
