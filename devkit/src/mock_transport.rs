/*!
Mock event-stream transport pour développement sans serveur

Implements `Transport` without any network: every `connect` is recorded,
and tests push SSE text or raw events into the most recent connection (or
any earlier one, to check that closed subscriptions stay silent).
*/

use mob_timer_client::stream::{EventSink, RawEvent, SseParser, SubscriptionId, Transport, TransportHandle};
use parking_lot::Mutex;
use std::sync::Arc;

struct Connection {
    sink: EventSink,
    parser: SseParser,
}

/// Mock transport qui simule le flux SSE du serveur
#[derive(Clone, Default)]
pub struct MockTransport {
    connections: Arc<Mutex<Vec<Connection>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nombre total de connexions ouvertes depuis la création
    pub fn connect_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Connexions dont la subscription n'a pas été fermée
    pub fn open_count(&self) -> usize {
        self.connections.lock().iter().filter(|c| !c.sink.is_closed()).count()
    }

    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.connections.lock().iter().map(|c| c.sink.id()).collect()
    }

    pub fn is_closed(&self, index: usize) -> Option<bool> {
        self.connections.lock().get(index).map(|c| c.sink.is_closed())
    }

    /// Pousse un événement sur la connexion la plus récente.
    /// Returns false if there is none or it was closed.
    pub fn push(&self, event: &RawEvent) -> bool {
        let sink = self.connections.lock().last().map(|c| c.sink.clone());
        match sink {
            Some(sink) => sink.dispatch(event),
            None => {
                log::warn!("⚠️ [MOCK] push without any connection");
                false
            }
        }
    }

    /// Pousse un événement sur une connexion donnée (index d'ouverture)
    pub fn push_to(&self, index: usize, event: &RawEvent) -> bool {
        let sink = self.connections.lock().get(index).map(|c| c.sink.clone());
        sink.map(|s| s.dispatch(event)).unwrap_or(false)
    }

    /// Feeds raw `text/event-stream` bytes through the SSE parser of the latest
    /// connection. Returns how many events were dispatched.
    pub fn push_sse(&self, text: &str) -> usize {
        let (sink, events) = {
            let mut connections = self.connections.lock();
            let Some(conn) = connections.last_mut() else {
                return 0;
            };
            (conn.sink.clone(), conn.parser.feed(text.as_bytes()))
        };

        let mut delivered = 0;
        for event in &events {
            if sink.dispatch(event) {
                delivered += 1;
            }
        }
        log::info!("📨 [MOCK] {} SSE events pushed to {}", delivered, sink.id());
        delivered
    }
}

impl Transport for MockTransport {
    fn connect(&self, sink: EventSink) -> TransportHandle {
        log::info!("📥 [MOCK] {} connected", sink.id());
        self.connections.lock().push(Connection {
            sink,
            parser: SseParser::new(),
        });
        TransportHandle::detached()
    }
}
