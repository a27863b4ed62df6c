//! Typed events of the timer push stream.
//!
//! Wire shape (one SSE event per state change):
//! - `tick`  `{"sec": 1499}`
//! - `start` `{"sec": "1500", "name": "Ada"}`
//! - `stop`  `{"sec": 1320, "name": "Grace"}`
//! - `over`  (data ignored)
//! - `alive` (empty data, heartbeat only)

pub mod http;
pub mod sse;
pub mod subscriber;

pub use sse::{RawEvent, SseParser};
pub use subscriber::{EventSink, EventStreamSubscriber, Subscription, SubscriptionId, Transport, TransportHandle};

use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Tick { sec: u64 },
    Start { sec: u64, name: Option<String> },
    Stop { sec: u64, name: Option<String> },
    Over,
    Alive,
}

/// Event names the client listens to. Anything else on the stream is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Tick,
    Start,
    Stop,
    Over,
    Alive,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Tick,
        EventKind::Start,
        EventKind::Stop,
        EventKind::Over,
        EventKind::Alive,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "tick" => Some(EventKind::Tick),
            "start" => Some(EventKind::Start),
            "stop" => Some(EventKind::Stop),
            "over" => Some(EventKind::Over),
            "alive" => Some(EventKind::Alive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Tick => "tick",
            EventKind::Start => "start",
            EventKind::Stop => "stop",
            EventKind::Over => "over",
            EventKind::Alive => "alive",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StreamEvent::Tick { .. } => EventKind::Tick,
            StreamEvent::Start { .. } => EventKind::Start,
            StreamEvent::Stop { .. } => EventKind::Stop,
            StreamEvent::Over => EventKind::Over,
            StreamEvent::Alive => EventKind::Alive,
        }
    }

    /// Decodes the `data` field of an SSE event of the given kind.
    pub fn decode(kind: EventKind, data: &str) -> Result<Self, DecodeError> {
        match kind {
            EventKind::Over => Ok(StreamEvent::Over),
            EventKind::Alive => Ok(StreamEvent::Alive),
            EventKind::Tick => {
                let payload: TimedPayload = serde_json::from_str(data)?;
                Ok(StreamEvent::Tick { sec: payload.sec.seconds()? })
            }
            EventKind::Start => {
                let payload: TimedPayload = serde_json::from_str(data)?;
                Ok(StreamEvent::Start { sec: payload.sec.seconds()?, name: payload.name })
            }
            EventKind::Stop => {
                let payload: TimedPayload = serde_json::from_str(data)?;
                Ok(StreamEvent::Stop { sec: payload.sec.seconds()?, name: payload.name })
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid seconds value: {0:?}")]
    Seconds(String),
}

#[derive(Debug, Deserialize)]
struct TimedPayload {
    sec: SecondsField,
    #[serde(default)]
    name: Option<String>,
}

/// `sec` is sent either as a JSON number or as a decimal string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SecondsField {
    Number(serde_json::Number),
    Text(String),
}

impl SecondsField {
    fn seconds(&self) -> Result<u64, DecodeError> {
        match self {
            SecondsField::Number(n) => {
                if let Some(v) = n.as_u64() {
                    return Ok(v);
                }
                match n.as_f64() {
                    Some(v) if v.is_finite() && v >= 0.0 => Ok(v.trunc() as u64),
                    _ => Err(DecodeError::Seconds(n.to_string())),
                }
            }
            SecondsField::Text(s) => parse_leading_int(s).ok_or_else(|| DecodeError::Seconds(s.clone())),
        }
    }
}

/// Leading decimal digits of `s` after trimming, e.g. `" 90s"` → 90.
fn parse_leading_int(s: &str) -> Option<u64> {
    let trimmed = s.trim_start();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse().ok()
}
