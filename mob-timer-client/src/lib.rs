//! Mob Timer client - live view of a shared, server-authoritative countdown
//!
//! The server pushes timer changes over Server-Sent Events. This crate:
//! - Reconciles every event into one countdown value and optional notification
//! - Detects silent stream loss with a liveness watchdog (no event for 10s)
//! - Re-establishes the stream on user request (5s cooldown) or automatically
//! - Talks to the status / start / toggle endpoints

pub mod api;
pub mod client;
pub mod commands;
pub mod config;
pub mod presenter;
pub mod profile;
pub mod reconciler;
pub mod reconnect;
pub mod scheduler;
pub mod stream;
pub mod ui;
pub mod watchdog;

#[cfg(test)]
mod test_server;

pub use client::{Client, ClientOptions, Message};
pub use reconciler::{format_clock, ConnectionState, TimerSnapshot};
pub use reconnect::{ExpiryPolicy, ReconnectSource};
pub use scheduler::{ManualScheduler, Scheduler, TokioScheduler};
pub use stream::StreamEvent;
