//! Streaming accumulator — turns a run's event stream into reply text.
//!
//! `Accumulator` is the fold step; `Snapshots` wraps an event stream and
//! yields the text accumulated so far after every event. Non-text events
//! leave the text unchanged but still produce a (repeated) snapshot, so a
//! consumer redraws once per upstream event. A `Failed` event ends the
//! snapshots without one, and `finish` turns it into an error.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{FusedStream, Stream, StreamExt};
use chat_types::{ChatError, Result, event::StreamEvent};

/// Running reply text for one streamed call
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    text: String,
    deltas: usize,
    failure: Option<String>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event in and return the current snapshot.
    pub fn push(&mut self, event: &StreamEvent) -> &str {
        match event {
            StreamEvent::TextDelta { text } => {
                self.text.push_str(text);
                self.deltas += 1;
            }
            StreamEvent::Other { event } => {
                log::debug!("Ignoring stream event {}", event);
            }
            StreamEvent::Failed { message } => {
                log::warn!("Run failed after {} deltas: {}", self.deltas, message);
                self.failure = Some(message.clone());
            }
        }
        &self.text
    }

    /// Why the run failed, if it did
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// The reply text, or the run's failure
    pub fn finish(self) -> Result<String> {
        match self.failure {
            Some(message) => Err(ChatError::ServiceUnavailable(message)),
            None => Ok(self.text),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of text deltas seen so far
    pub fn delta_count(&self) -> usize {
        self.deltas
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Lazy, finite, non-restartable stream of snapshots over an event stream.
pub struct Snapshots<S> {
    events: S,
    acc: Accumulator,
    done: bool,
}

/// Wrap `events` so that every event yields the concatenation of all
/// `TextDelta` texts seen so far.
pub fn accumulate<S>(events: S) -> Snapshots<S>
where
    S: Stream<Item = StreamEvent> + Unpin,
{
    Snapshots {
        events,
        acc: Accumulator::new(),
        done: false,
    }
}

impl<S> Snapshots<S> {
    /// Text accumulated so far (the final reply once the stream has ended)
    pub fn text(&self) -> &str {
        self.acc.text()
    }

    pub fn delta_count(&self) -> usize {
        self.acc.delta_count()
    }

    pub fn into_text(self) -> String {
        self.acc.into_text()
    }

    pub fn failure(&self) -> Option<&str> {
        self.acc.failure()
    }

    /// Final reply text, or `ServiceUnavailable` if the run failed
    pub fn finish(self) -> Result<String> {
        self.acc.finish()
    }
}

impl<S> Stream for Snapshots<S>
where
    S: Stream<Item = StreamEvent> + Unpin,
{
    type Item = String;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        match this.events.poll_next_unpin(cx) {
            Poll::Ready(Some(event @ StreamEvent::Failed { .. })) => {
                this.acc.push(&event);
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Ready(Some(event)) => Poll::Ready(Some(this.acc.push(&event).to_string())),
            Poll::Ready(None) => {
                this.done = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S> FusedStream for Snapshots<S>
where
    S: Stream<Item = StreamEvent> + Unpin,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}

/// Drain `events` and return the final reply text.
pub async fn collect_reply<S>(events: S) -> Result<String>
where
    S: Stream<Item = StreamEvent> + Unpin,
{
    let mut snapshots = accumulate(events);
    while snapshots.next().await.is_some() {}
    snapshots.finish()
}
