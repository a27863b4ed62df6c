//! Event stream subscriptions.
//!
//! A [`Transport`] pushes raw SSE frames into an [`EventSink`]; the sink
//! decodes them and forwards typed messages to the client loop, tagged with
//! the subscription id. Closing a [`Subscription`] flips its flag so the sink
//! drops anything still in flight.

use super::{EventKind, RawEvent, StreamEvent};
use crate::client::Message;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

/// Opens the underlying push connection and feeds frames to `sink` until aborted.
pub trait Transport: Send + Sync {
    fn connect(&self, sink: EventSink) -> TransportHandle;
}

/// Keeps the transport's background task, if it has one.
#[derive(Debug, Default)]
pub struct TransportHandle {
    abort: Option<AbortHandle>,
}

impl TransportHandle {
    /// For transports without a task of their own (mocks, in-process feeds).
    pub fn detached() -> Self {
        Self { abort: None }
    }

    pub fn from_task(task: JoinHandle<()>) -> Self {
        Self {
            abort: Some(task.abort_handle()),
        }
    }

    fn abort(&mut self) {
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
    }
}

#[derive(Clone)]
pub struct EventSink {
    id: SubscriptionId,
    tx: UnboundedSender<Message>,
    closed: Arc<AtomicBool>,
}

impl EventSink {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.tx.is_closed()
    }

    /// Decodes and forwards one frame. Returns false once the subscription is
    /// closed so transports can stop reading.
    pub fn dispatch(&self, raw: &RawEvent) -> bool {
        if self.is_closed() {
            return false;
        }
        debug!("{}: {} {}", self.id, raw.event, raw.data);

        let Some(kind) = EventKind::from_name(&raw.event) else {
            debug!("{}: ignoring unlistened event '{}'", self.id, raw.event);
            return true;
        };

        let message = match StreamEvent::decode(kind, &raw.data) {
            Ok(event) => Message::Stream {
                subscription: self.id,
                event,
            },
            Err(e) => {
                warn!("{}: dropping malformed '{}' event: {} (data: {:?})", self.id, kind, e, raw.data);
                Message::Malformed {
                    subscription: self.id,
                    kind,
                }
            }
        };
        self.tx.send(message).is_ok()
    }
}

/// One open stream connection. Closing is idempotent; dropping closes.
pub struct Subscription {
    id: SubscriptionId,
    closed: Arc<AtomicBool>,
    handle: TransportHandle,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close(&mut self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.handle.abort();
        info!("{} closed", self.id);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

pub struct EventStreamSubscriber {
    transport: Arc<dyn Transport>,
    tx: UnboundedSender<Message>,
    next_id: u64,
}

impl EventStreamSubscriber {
    pub fn new(transport: Arc<dyn Transport>, tx: UnboundedSender<Message>) -> Self {
        Self {
            transport,
            tx,
            next_id: 1,
        }
    }

    /// Opens a new connection. Callers must close the previous one first.
    pub fn open(&mut self) -> Subscription {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        let closed = Arc::new(AtomicBool::new(false));
        let sink = EventSink {
            id,
            tx: self.tx.clone(),
            closed: closed.clone(),
        };
        let handle = self.transport.connect(sink);
        info!("{} opened", id);

        Subscription { id, closed, handle }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct CapturingTransport {
        sinks: Mutex<Vec<EventSink>>,
    }

    impl Transport for CapturingTransport {
        fn connect(&self, sink: EventSink) -> TransportHandle {
            self.sinks.lock().push(sink);
            TransportHandle::detached()
        }
    }

    #[test]
    fn test_open_assigns_increasing_ids() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let transport = Arc::new(CapturingTransport::default());
        let mut subscriber = EventStreamSubscriber::new(transport.clone(), tx);

        let first = subscriber.open();
        let second = subscriber.open();
        assert_eq!(first.id(), SubscriptionId(1));
        assert_eq!(second.id(), SubscriptionId(2));
        assert_eq!(transport.sinks.lock().len(), 2);
    }

    #[test]
    fn test_sink_forwards_decoded_and_malformed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let transport = Arc::new(CapturingTransport::default());
        let mut subscriber = EventStreamSubscriber::new(transport.clone(), tx);
        let _sub = subscriber.open();
        let sink = transport.sinks.lock()[0].clone();

        assert!(sink.dispatch(&RawEvent::new("tick", r#"{"sec": 5}"#)));
        assert!(sink.dispatch(&RawEvent::new("start", "{broken")));
        assert!(sink.dispatch(&RawEvent::new("message", "hello")));

        match rx.try_recv().unwrap() {
            Message::Stream { subscription, event } => {
                assert_eq!(subscription, SubscriptionId(1));
                assert_eq!(event, StreamEvent::Tick { sec: 5 });
            }
            other => panic!("unexpected message: {other:?}"),
        }
        assert!(matches!(
            rx.try_recv().unwrap(),
            Message::Malformed { kind: EventKind::Start, .. }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_subscription_drops_frames() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let transport = Arc::new(CapturingTransport::default());
        let mut subscriber = EventStreamSubscriber::new(transport.clone(), tx);
        let mut sub = subscriber.open();
        let sink = transport.sinks.lock()[0].clone();

        sub.close();
        sub.close();
        assert!(sub.is_closed());
        assert!(!sink.dispatch(&RawEvent::new("alive", "")));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_drop_closes_subscription() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let transport = Arc::new(CapturingTransport::default());
        let mut subscriber = EventStreamSubscriber::new(transport.clone(), tx);
        drop(subscriber.open());

        assert!(transport.sinks.lock()[0].is_closed());
    }
}
