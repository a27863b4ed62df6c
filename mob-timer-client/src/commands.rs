//! Terminal commands, one per stdin line.

use crate::api::{TimerApi, START_PRESETS};
use crate::client::Message;
use crate::profile::ProfileStore;
use crate::reconnect::ReconnectSource;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the shared timer for N minutes (one of the presets).
    Start(u64),
    Toggle,
    Reconnect,
    SetName(String),
    Quit,
    Help,
}

impl Command {
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match head {
            "t" | "toggle" => Some(Command::Toggle),
            "r" | "reconnect" => Some(Command::Reconnect),
            "q" | "quit" | "exit" => Some(Command::Quit),
            "h" | "help" | "?" => Some(Command::Help),
            "name" => Some(Command::SetName(rest.to_string())),
            other => other
                .parse::<u64>()
                .ok()
                .filter(|m| START_PRESETS.contains(m))
                .map(Command::Start),
        }
    }
}

pub const HELP: &str = "commands: 25|20|15|10|5 start timer · t toggle · r reconnect · name <text> · q quit";

/// Runs commands read from `input` until `quit` or the end of input.
///
/// Closing the input only stops command handling: the client keeps showing
/// the timer until it is told to shut down some other way (ctrl-c).
pub async fn read_commands<R>(
    input: R,
    tx: UnboundedSender<Message>,
    api: TimerApi,
    profile: ProfileStore,
    mut name: String,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("stdin closed, commands disabled (ctrl-c to quit)");
                return;
            }
            Err(e) => {
                warn!("stdin read failed, commands disabled: {}", e);
                return;
            }
        };

        match Command::parse(&line) {
            Some(Command::Start(minutes)) => {
                let api = api.clone();
                let name = name.clone();
                tokio::spawn(async move {
                    if let Err(e) = api.start(minutes, &name).await {
                        warn!("start request failed: {}", e);
                    }
                });
            }
            Some(Command::Toggle) => {
                let api = api.clone();
                let name = name.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    match api.toggle(&name).await {
                        Ok(sec) => {
                            let _ = tx.send(Message::TimeFetched(sec));
                        }
                        Err(e) => warn!("toggle request failed: {}", e),
                    }
                });
            }
            Some(Command::Reconnect) => {
                let _ = tx.send(Message::ReconnectRequested(ReconnectSource::User));
            }
            Some(Command::SetName(new_name)) => {
                match profile.save_name(&new_name).await {
                    Ok(()) => info!("name set to {:?}", new_name),
                    Err(e) => warn!("could not persist name: {}", e),
                }
                name = new_name;
            }
            Some(Command::Quit) => {
                let _ = tx.send(Message::Shutdown);
                return;
            }
            Some(Command::Help) => println!("{HELP}"),
            None if line.trim().is_empty() => {}
            None => println!("unknown command. {HELP}"),
        }
    }
}
