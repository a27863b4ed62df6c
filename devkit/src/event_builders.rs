/*!
Helpers pour construire les événements du flux timer

Produces `RawEvent`s and SSE text shaped like what the timer server emits,
so tests do not hand-write JSON payloads.
*/

use mob_timer_client::stream::RawEvent;
use serde_json::{json, Value};

/// Construction d'événements conformes au flux serveur
pub struct StreamEventBuilder;

impl StreamEventBuilder {
    pub fn tick(sec: u64) -> RawEvent {
        Self::timed("tick", json!({ "sec": sec }))
    }

    /// Le serveur envoie `sec` en string pour start/stop
    pub fn start(sec: u64, name: &str) -> RawEvent {
        Self::timed("start", json!({ "sec": sec.to_string(), "name": name }))
    }

    pub fn stop(sec: u64, name: &str) -> RawEvent {
        Self::timed("stop", json!({ "sec": sec.to_string(), "name": name }))
    }

    pub fn over() -> RawEvent {
        RawEvent::new("over", "{}")
    }

    pub fn alive() -> RawEvent {
        RawEvent::new("alive", "")
    }

    /// Événement avec payload arbitraire (pour tester les payloads invalides)
    pub fn raw(event: &str, data: &str) -> RawEvent {
        RawEvent::new(event, data)
    }

    fn timed(event: &str, payload: Value) -> RawEvent {
        RawEvent::new(event, payload.to_string())
    }

    /// Sérialise un événement au format `text/event-stream`
    pub fn to_sse(event: &RawEvent) -> String {
        let mut out = format!("event: {}\n", event.event);
        for line in event.data.split('\n') {
            out.push_str("data: ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        out
    }
}
