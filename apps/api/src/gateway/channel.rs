//! Bounded, ordered hand-off of progress events from one pipeline worker to one stream.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::gateway::models::ProgressEvent;

/// What travels over the channel. `Closed` is the terminal sentinel: the producer is done.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelItem {
    Event(ProgressEvent),
    Closed,
}

#[derive(Debug, Error, PartialEq)]
#[error("event channel receiver dropped")]
pub struct ChannelClosed;

#[derive(Debug, Error, PartialEq)]
pub enum ReadError {
    #[error("no event received within {0:?}")]
    Timeout(Duration),

    #[error("producer dropped without closing the channel")]
    Disconnected,
}

/// Creates a channel that holds at most `capacity` undelivered items (minimum 1).
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSender { tx }, EventReceiver { rx })
}

/// Producing half. Deliberately not `Clone`: a channel has a single producer.
#[derive(Debug)]
pub struct EventSender {
    tx: mpsc::Sender<ChannelItem>,
}

impl EventSender {
    /// Enqueues `item`, waiting while the channel is full.
    /// Fails only when the receiving side is gone.
    pub async fn put(&self, item: ChannelItem) -> Result<(), ChannelClosed> {
        self.tx.send(item).await.map_err(|_| ChannelClosed)
    }
}

#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<ChannelItem>,
}

impl EventReceiver {
    /// Waits up to `timeout` for the next item.
    pub async fn get(&mut self, timeout: Duration) -> Result<ChannelItem, ReadError> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(item)) => Ok(item),
            Ok(None) => Err(ReadError::Disconnected),
            Err(_) => Err(ReadError::Timeout(timeout)),
        }
    }
}
