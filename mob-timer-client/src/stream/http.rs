//! SSE over HTTP with reqwest.
//!
//! Reconnects by itself on network errors or end of stream (after the
//! server-provided `retry:` delay, default 3s), the way a browser
//! EventSource does. This retry carries no liveness information; that is
//! the watchdog's job.

use super::sse::SseParser;
use super::subscriber::{EventSink, Transport, TransportHandle};
use futures::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_RETRY: Duration = Duration::from_secs(3);

#[derive(Debug, thiserror::Error)]
enum StreamError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    retry: Duration,
}

impl HttpTransport {
    /// `server_url` is the base URL; events are read from `{server_url}/events/`.
    pub fn new(client: reqwest::Client, server_url: &str, retry: Duration) -> Self {
        Self {
            client,
            url: format!("{}/events/", server_url.trim_end_matches('/')),
            retry,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn run(self, sink: EventSink) {
        let mut parser = SseParser::new();

        loop {
            match self.read_stream(&sink, &mut parser).await {
                Ok(()) if sink.is_closed() => return,
                Ok(()) => info!("{}: event stream ended, reconnecting", sink.id()),
                Err(e) => warn!("{}: event stream error: {}", sink.id(), e),
            }
            if sink.is_closed() {
                return;
            }

            parser.reset();
            let delay = parser.retry().unwrap_or(self.retry);
            debug!("{}: retrying in {:?}", sink.id(), delay);
            tokio::time::sleep(delay).await;
        }
    }

    async fn read_stream(&self, sink: &EventSink, parser: &mut SseParser) -> Result<(), StreamError> {
        let mut request = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = parser.last_event_id() {
            request = request.header("Last-Event-ID", id);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(StreamError::Status(response.status()));
        }
        info!("{}: connected to {}", sink.id(), self.url);

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            for event in parser.feed(&chunk) {
                if !sink.dispatch(&event) {
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

impl Transport for HttpTransport {
    fn connect(&self, sink: EventSink) -> TransportHandle {
        TransportHandle::from_task(tokio::spawn(self.clone().run(sink)))
    }
}
