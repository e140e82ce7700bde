//! Resume intake gateway.
//!
//! One request = one pipeline run. The handler spawns a [`worker::PipelineWorker`] that
//! uploads, records, parses, extracts and persists the resume, reporting each stage through
//! a bounded [`channel`]. The HTTP response is a [`stream::StreamAdapter`] reading that channel
//! as Server-Sent Events. Worker and stream share nothing but the channel and a
//! cancellation token.

pub mod channel;
pub mod emitter;
pub mod handlers;
pub mod models;
pub mod stream;
pub mod worker;

#[cfg(test)]
pub mod testing;

use std::time::Duration;

use crate::config::Config;

/// Tunables for progress streaming.
#[derive(Debug, Clone, Copy)]
pub struct GatewaySettings {
    pub read_timeout: Duration,
    pub channel_capacity: usize,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(60),
            channel_capacity: 10,
        }
    }
}

impl From<&Config> for GatewaySettings {
    fn from(config: &Config) -> Self {
        Self {
            read_timeout: config.stream_read_timeout,
            channel_capacity: config.event_channel_capacity,
        }
    }
}
