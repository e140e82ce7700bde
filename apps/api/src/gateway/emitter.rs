use serde_json::{Map, Value};
use tracing::debug;

use crate::gateway::channel::{ChannelItem, EventSender};
use crate::gateway::models::{EventStatus, ProgressEvent};

/// Publishes progress for one pipeline run.
pub struct ProgressEmitter {
    sender: EventSender,
}

impl ProgressEmitter {
    pub fn new(sender: EventSender) -> Self {
        Self { sender }
    }

    /// Sends a progress event, waiting for room if the reader is behind.
    /// If the reader has gone away the event has nowhere to go and is discarded.
    pub async fn emit(&self, status: EventStatus, data: Option<Map<String, Value>>) {
        let event = ProgressEvent::new(status, data);
        if self.sender.put(ChannelItem::Event(event)).await.is_err() {
            debug!("Progress reader gone, discarding {status:?} event");
        }
    }

    /// Ends the stream. Consumes the emitter, so it happens at most once.
    pub async fn close(self) {
        if self.sender.put(ChannelItem::Closed).await.is_err() {
            debug!("Progress reader gone before stream close");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::gateway::channel::event_channel;

    const WAIT: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn test_emit_then_close() {
        let (tx, mut rx) = event_channel(10);
        let emitter = ProgressEmitter::new(tx);

        emitter.emit(EventStatus::Uploading, None).await;
        emitter.close().await;

        assert_eq!(
            rx.get(WAIT).await.unwrap(),
            ChannelItem::Event(ProgressEvent::new(EventStatus::Uploading, None))
        );
        assert_eq!(rx.get(WAIT).await.unwrap(), ChannelItem::Closed);
        // Emitter and sender are gone; nothing follows the sentinel.
        assert!(rx.get(WAIT).await.is_err());
    }

    #[tokio::test]
    async fn test_emit_without_reader_does_not_fail() {
        let (tx, rx) = event_channel(1);
        drop(rx);
        let emitter = ProgressEmitter::new(tx);

        emitter.emit(EventStatus::Uploading, None).await;
        emitter.emit(EventStatus::Saving, None).await;
        emitter.close().await;
    }
}
