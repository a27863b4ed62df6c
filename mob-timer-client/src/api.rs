//! Timer server endpoints outside the event stream.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use tracing::{debug, info};

/// Durations offered by the start buttons, in minutes.
pub const START_PRESETS: [u64; 5] = [25, 20, 15, 10, 5];

/// Everything but `A-Z a-z 0-9 - _ . ! ~ * ' ( )` is escaped in query
/// values, so a space goes out as `%20`.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Deserialize)]
struct TimeResponse {
    time: u64,
}

#[derive(Clone)]
pub struct TimerApi {
    client: reqwest::Client,
    base: String,
}

impl TimerApi {
    pub fn new(client: reqwest::Client, server_url: &str) -> Self {
        Self {
            client,
            base: server_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Remaining seconds right now.
    pub async fn status(&self) -> Result<u64, ApiError> {
        let response = self.client.get(self.endpoint("status")).send().await?;
        let body: TimeResponse = check(response)?.json().await?;
        debug!("status: {}s remaining", body.time);
        Ok(body.time)
    }

    /// (Re)starts the shared timer for `minutes`, attributed to `name`.
    pub async fn start(&self, minutes: u64, name: &str) -> Result<(), ApiError> {
        let url = format!("{}?sec={}&name={}", self.endpoint("reset"), minutes * 60, encode(name));
        let response = self.client.post(url).send().await?;
        check(response)?;
        info!("timer started for {minutes} min as {name:?}");
        Ok(())
    }

    /// Pauses or resumes the timer; returns the remaining seconds after the toggle.
    pub async fn toggle(&self, name: &str) -> Result<u64, ApiError> {
        let url = format!("{}?name={}", self.endpoint("toggle"), encode(name));
        let response = self.client.post(url).send().await?;
        let body: TimeResponse = check(response)?.json().await?;
        info!("timer toggled as {name:?}, {}s remaining", body.time);
        Ok(body.time)
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}

fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status(response.status()))
    }
}
