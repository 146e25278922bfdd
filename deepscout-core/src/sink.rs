//! Event sink: the write-only, ordered channel between the research loop
//! and its consumer.
//!
//! The loop is the sole writer. A bounded buffer applies backpressure to a
//! slow consumer; a disconnected consumer never stalls the loop. Once the
//! receiver is gone, further writes are elided and the loop runs to
//! completion on its own.

use crate::event::Event;

use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Buffer size for the default event channel.
///
/// Large enough that a consumer draining at network speed never blocks the
/// loop in practice; small enough to bound memory when the consumer stalls.
pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// Write side of the research event stream.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Append one event to the stream.
    ///
    /// Never fails: a sink whose consumer has disconnected swallows the
    /// event so the research loop can run to completion regardless of
    /// consumer lifetime.
    async fn emit(&self, event: Event);
}

/// Bounded-channel sink backed by `tokio::sync::mpsc`.
///
/// Created in a pair with its [`EventReceiver`]. The first failed send
/// flips the sink into a disconnected state and all later writes are
/// dropped without contacting the channel.
pub struct ChannelSink {
    tx: mpsc::Sender<Event>,
    disconnected: AtomicBool,
}

impl ChannelSink {
    /// Create a sink/receiver pair with the given buffer capacity.
    pub fn bounded(capacity: usize) -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                disconnected: AtomicBool::new(false),
            },
            EventReceiver { rx },
        )
    }

    /// Create a sink/receiver pair with [`DEFAULT_EVENT_BUFFER`] capacity.
    pub fn new() -> (Self, EventReceiver) {
        Self::bounded(DEFAULT_EVENT_BUFFER)
    }

    /// Whether the consumer has disconnected.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: Event) {
        if self.disconnected.load(Ordering::Relaxed) {
            return;
        }
        if self.tx.send(event).await.is_err() {
            log::debug!("event consumer disconnected, eliding further writes");
            self.disconnected.store(true, Ordering::Relaxed);
        }
    }
}

/// Read side of the research event stream.
///
/// Consume with [`recv`](Self::recv), or as a `futures_util::Stream`:
///
/// ```
/// use deepscout_core::{ChannelSink, Event, EventSink};
/// use futures_util::StreamExt;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (sink, receiver) = ChannelSink::bounded(4);
/// sink.emit(Event::finish("done")).await;
/// drop(sink);
///
/// let events: Vec<Event> = receiver.collect().await;
/// assert_eq!(events.len(), 1);
/// # }
/// ```
pub struct EventReceiver {
    rx: mpsc::Receiver<Event>,
}

impl EventReceiver {
    /// Receive the next event, or `None` once the sink is dropped.
    pub async fn recv(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

impl Stream for EventReceiver {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.rx.poll_recv(cx)
    }
}

/// Collecting sink for tests and offline transcript capture.
///
/// Stores every emitted event in order; never blocks and never disconnects.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events emitted so far, in order.
    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => {
                log::warn!("memory sink lock poisoned - recovering snapshot");
                poisoned.into_inner().clone()
            }
        }
    }

    /// Take all events, leaving the sink empty.
    pub fn take(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => {
                log::warn!("memory sink lock poisoned - recovering events");
                std::mem::take(&mut *poisoned.into_inner())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn emit(&self, event: Event) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => {
                log::warn!("memory sink lock poisoned - recovering and recording event");
                poisoned.into_inner().push(event);
            }
        }
    }
}
