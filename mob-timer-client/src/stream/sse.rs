//! Incremental `text/event-stream` parser.
//!
//! Bytes are fed in arbitrary chunks; complete events come out once their
//! terminating blank line has been seen.

use std::time::Duration;
use tracing::warn;

pub const DEFAULT_EVENT_NAME: &str = "message";

/// Longest line kept in memory; anything longer drops the event being built.
pub const MAX_LINE_LEN: usize = 64 * 1024;

const BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

impl RawEvent {
    pub fn new(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
            id: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    // the BOM check is only done on the first bytes of a stream
    bom_checked: bool,
    // a CR ended the previous chunk: a leading LF in the next one belongs to it
    pending_cr: bool,
    // rest of an overlong line is skipped up to its terminator
    discarding: bool,
    event: String,
    data: String,
    has_data: bool,
    id: Option<String>,
    last_event_id: Option<String>,
    retry: Option<Duration>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last `id:` seen on the stream, for `Last-Event-ID` on reconnect.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Reconnection delay requested by the server via `retry:`.
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RawEvent> {
        let mut out = Vec::new();
        let head: Vec<u8>;
        let mut bytes = chunk;

        if !self.bom_checked {
            let mut pending = std::mem::take(&mut self.buffer);
            pending.extend_from_slice(bytes);
            if pending.len() < BOM.len() && BOM.starts_with(&pending) {
                self.buffer = pending;
                return out;
            }
            self.bom_checked = true;
            if pending.starts_with(BOM) {
                pending.drain(..BOM.len());
            }
            head = pending;
            bytes = &head;
        }

        if bytes.is_empty() {
            return out;
        }
        if self.pending_cr {
            self.pending_cr = false;
            if bytes[0] == b'\n' {
                bytes = &bytes[1..];
            }
        }

        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    self.end_line(&mut out);
                    i += 1;
                }
                b'\r' => {
                    self.end_line(&mut out);
                    if i + 1 < bytes.len() {
                        if bytes[i + 1] == b'\n' {
                            i += 1;
                        }
                    } else {
                        self.pending_cr = true;
                    }
                    i += 1;
                }
                _ if self.discarding => i += 1,
                b => {
                    if self.buffer.len() >= MAX_LINE_LEN {
                        warn!("event stream line over {} bytes, dropping event", MAX_LINE_LEN);
                        self.clear_event();
                        self.buffer.clear();
                        self.discarding = true;
                    } else {
                        self.buffer.push(b);
                    }
                    i += 1;
                }
            }
        }
        out
    }

    /// Drops any half-received event, keeping `last_event_id` and `retry`.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.bom_checked = false;
        self.pending_cr = false;
        self.discarding = false;
        self.clear_event();
    }

    fn clear_event(&mut self) {
        self.event.clear();
        self.data.clear();
        self.has_data = false;
        self.id = None;
    }

    fn end_line(&mut self, out: &mut Vec<RawEvent>) {
        if std::mem::replace(&mut self.discarding, false) {
            self.buffer.clear();
            return;
        }
        self.finish_line(out);
    }

    fn finish_line(&mut self, out: &mut Vec<RawEvent>) {
        let line = String::from_utf8_lossy(&self.buffer).into_owned();
        self.buffer.clear();

        if line.is_empty() {
            if let Some(event) = self.dispatch() {
                out.push(event);
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.find(':') {
            Some(idx) => {
                let value = &line[idx + 1..];
                (&line[..idx], value.strip_prefix(' ').unwrap_or(value))
            }
            None => (line.as_str(), ""),
        };

        match field {
            "event" => self.event = value.to_string(),
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "id" => {
                if !value.contains('\0') {
                    self.id = Some(value.to_string());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(ms) = value.parse::<u64>() {
                        self.retry = Some(Duration::from_millis(ms));
                    }
                }
            }
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<RawEvent> {
        if let Some(id) = self.id.take() {
            self.last_event_id = Some(id);
        }
        let name = std::mem::take(&mut self.event);
        let data = std::mem::take(&mut self.data);
        if !std::mem::replace(&mut self.has_data, false) {
            return None;
        }

        Some(RawEvent {
            event: if name.is_empty() { DEFAULT_EVENT_NAME.to_string() } else { name },
            data,
            id: self.last_event_id.clone(),
        })
    }
}
