//! Turns a pipeline's event channel into a Server-Sent Events body.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, Sse};
use futures::Stream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, warn};

use crate::gateway::channel::{ChannelItem, EventReceiver, ReadError};
use crate::gateway::models::ProgressEvent;

pub const TIMEOUT_MESSAGE: &str = "Processing timed out";
pub const INTERRUPTED_MESSAGE: &str = "Processing stopped unexpectedly";

/// Sent verbatim if an event cannot be encoded.
const ENCODE_FAILURE_FRAME: &str =
    r#"{"status":"failed","data":{"error":"Failed to encode progress event"}}"#;

/// Reads progress events for one client connection.
///
/// Dropping the adapter (e.g. the client disconnected and axum dropped the body)
/// cancels the worker through the held drop guard.
pub struct StreamAdapter {
    receiver: EventReceiver,
    read_timeout: Duration,
    cancel: CancellationToken,
    finished: bool,
    _cancel_on_drop: DropGuard,
}

impl StreamAdapter {
    pub fn new(receiver: EventReceiver, read_timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            receiver,
            read_timeout,
            _cancel_on_drop: cancel.clone().drop_guard(),
            cancel,
            finished: false,
        }
    }

    /// Next event to deliver, or `None` once the stream is over.
    ///
    /// The read timeout restarts on every call, so it bounds the gap between events rather
    /// than the whole run. A stall or a vanished worker produces one synthetic `failed` event
    /// and ends the stream.
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        if self.finished {
            return None;
        }

        match self.receiver.get(self.read_timeout).await {
            Ok(ChannelItem::Event(event)) => {
                debug!(
                    "Streaming {:?} event (terminal: {}, data: {})",
                    event.status(),
                    event.status().is_terminal(),
                    event.data().is_some()
                );
                Some(event)
            }
            Ok(ChannelItem::Closed) => {
                self.finished = true;
                None
            }
            Err(ReadError::Timeout(after)) => {
                warn!("No progress for {after:?}, ending stream");
                self.abort(TIMEOUT_MESSAGE)
            }
            Err(ReadError::Disconnected) => {
                error!("Pipeline worker went away without closing its stream");
                self.abort(INTERRUPTED_MESSAGE)
            }
        }
    }

    fn abort(&mut self, message: &str) -> Option<ProgressEvent> {
        self.stop();
        Some(ProgressEvent::failed(message))
    }

    fn stop(&mut self) {
        self.cancel.cancel();
        self.finished = true;
    }

    /// Next SSE frame, or `None` once the stream is over.
    pub async fn next_frame(&mut self) -> Option<Event> {
        let event = self.next_event().await?;
        Some(self.encode(Event::default().json_data(&event)))
    }

    /// An event that cannot be encoded is replaced by a terminal failure frame.
    fn encode(&mut self, encoded: Result<Event, axum::Error>) -> Event {
        match encoded {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to encode progress event: {e}");
                self.stop();
                Event::default().data(ENCODE_FAILURE_FRAME)
            }
        }
    }

    #[cfg(test)]
    pub fn into_stream(self) -> impl Stream<Item = ProgressEvent> + Send {
        futures::stream::unfold(self, |mut adapter| async move {
            adapter.next_event().await.map(|event| (event, adapter))
        })
    }

    /// One `data: <json>\n\n` frame per event.
    pub fn into_sse(self) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send> {
        Sse::new(futures::stream::unfold(self, |mut adapter| async move {
            let frame = adapter.next_frame().await?;
            Some((Ok(frame), adapter))
        }))
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;
    use crate::gateway::channel::event_channel;
    use crate::gateway::models::EventStatus;

    const READ_TIMEOUT: Duration = Duration::from_secs(60);

    fn event(status: EventStatus) -> ChannelItem {
        ChannelItem::Event(ProgressEvent::new(status, None))
    }

    #[tokio::test]
    async fn test_stream_ends_at_sentinel() {
        let (tx, rx) = event_channel(10);
        tx.put(event(EventStatus::Uploading)).await.unwrap();
        tx.put(event(EventStatus::Saving)).await.unwrap();
        tx.put(ChannelItem::Closed).await.unwrap();
        // A late item after the sentinel must never be delivered.
        tx.put(event(EventStatus::Parsing)).await.unwrap();

        let cancel = CancellationToken::new();
        let events: Vec<_> = StreamAdapter::new(rx, READ_TIMEOUT, cancel)
            .into_stream()
            .collect()
            .await;

        let statuses: Vec<_> = events.iter().map(|e| e.status()).collect();
        assert_eq!(statuses, vec![EventStatus::Uploading, EventStatus::Saving]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stall_yields_single_failure_and_cancels() {
        let (_tx, rx) = event_channel(10);
        let cancel = CancellationToken::new();

        let events: Vec<_> = StreamAdapter::new(rx, READ_TIMEOUT, cancel.clone())
            .into_stream()
            .collect()
            .await;

        assert_eq!(events, vec![ProgressEvent::failed(TIMEOUT_MESSAGE)]);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_restarts_after_each_event() {
        let (tx, rx) = event_channel(10);
        let cancel = CancellationToken::new();

        // 45s gaps: each under the timeout, together well over it.
        tokio::spawn(async move {
            for status in [EventStatus::Uploading, EventStatus::Saving, EventStatus::Parsing] {
                tokio::time::sleep(Duration::from_secs(45)).await;
                tx.put(event(status)).await.unwrap();
            }
            tx.put(ChannelItem::Closed).await.unwrap();
        });

        let events: Vec<_> = StreamAdapter::new(rx, READ_TIMEOUT, cancel)
            .into_stream()
            .collect()
            .await;

        let statuses: Vec<_> = events.iter().map(|e| e.status()).collect();
        assert_eq!(
            statuses,
            vec![EventStatus::Uploading, EventStatus::Saving, EventStatus::Parsing]
        );
    }

    #[tokio::test]
    async fn test_worker_vanishing_yields_failure() {
        let (tx, rx) = event_channel(10);
        tx.put(event(EventStatus::Uploading)).await.unwrap();
        drop(tx);

        let cancel = CancellationToken::new();
        let events: Vec<_> = StreamAdapter::new(rx, READ_TIMEOUT, cancel.clone())
            .into_stream()
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                ProgressEvent::new(EventStatus::Uploading, None),
                ProgressEvent::failed(INTERRUPTED_MESSAGE),
            ]
        );
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_dropping_stream_cancels_worker() {
        let (tx, rx) = event_channel(10);
        tx.put(event(EventStatus::Uploading)).await.unwrap();
        let cancel = CancellationToken::new();

        let adapter = StreamAdapter::new(rx, READ_TIMEOUT, cancel.clone());
        let mut stream = Box::pin(adapter.into_stream());
        assert!(stream.next().await.is_some());
        assert!(!cancel.is_cancelled());

        drop(stream);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_encode_failure_ends_stream() {
        let (tx, rx) = event_channel(10);
        tx.put(event(EventStatus::Uploading)).await.unwrap();
        tx.put(event(EventStatus::Success)).await.unwrap();
        let cancel = CancellationToken::new();
        let mut adapter = StreamAdapter::new(rx, READ_TIMEOUT, cancel.clone());

        let failure = std::io::Error::other("unencodable");
        adapter.encode(Err(axum::Error::new(failure)));

        assert!(cancel.is_cancelled());
        // The queued success event is never delivered after the failure frame.
        assert!(adapter.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_frames_follow_events() {
        let (tx, rx) = event_channel(10);
        tx.put(event(EventStatus::Uploading)).await.unwrap();
        tx.put(ChannelItem::Closed).await.unwrap();
        let mut adapter = StreamAdapter::new(rx, READ_TIMEOUT, CancellationToken::new());

        assert!(adapter.next_frame().await.is_some());
        assert!(adapter.next_frame().await.is_none());
    }
}
