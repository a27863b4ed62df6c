//! Mob Timer - terminal client
//!
//! Shows the shared countdown, raises notifications on start/stop/end and
//! reports when the event stream has gone silent. Reads commands from stdin.

use anyhow::{Context, Result};
use mob_timer_client::api::TimerApi;
use mob_timer_client::commands::{read_commands, HELP};
use mob_timer_client::config::ClientConfig;
use mob_timer_client::profile::ProfileStore;
use mob_timer_client::stream::http::HttpTransport;
use mob_timer_client::ui::TerminalUi;
use mob_timer_client::{Client, Message, TokioScheduler};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mob_timer_client=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::load().await.context("Failed to load configuration")?;
    info!("⏱  Mob Timer client starting (server: {})", config.server_url);

    let profile = ProfileStore::default_location().context("Failed to locate profile")?;
    let name = match profile.load().await {
        Ok(p) => p.name,
        Err(e) => {
            warn!("ignoring unreadable profile {}: {}", profile.path().display(), e);
            String::new()
        }
    };

    let http = reqwest::Client::builder()
        .user_agent(concat!("mob-timer/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let api = TimerApi::new(http.clone(), &config.server_url);
    let transport = HttpTransport::new(http, &config.server_url, config.retry());

    let (client, rx) = Client::new(
        config.client_options(),
        Arc::new(transport),
        Arc::new(TokioScheduler),
        Box::new(TerminalUi::stdout()),
    );
    let tx = client.sender();

    // initial countdown, independent of the stream
    let status_api = api.clone();
    let status_tx = tx.clone();
    tokio::spawn(async move {
        match status_api.status().await {
            Ok(sec) => {
                let _ = status_tx.send(Message::TimeFetched(sec));
            }
            Err(e) => warn!("initial status query failed: {}", e),
        }
    });

    tokio::spawn(read_commands(BufReader::new(tokio::io::stdin()), tx.clone(), api, profile, name));

    let ctrl_c_tx = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c_tx.send(Message::Shutdown);
        }
    });

    println!("{HELP}");
    client.run(rx).await;
    info!("bye");
    Ok(())
}
