//! Bounded handoff channel between the row producer and the renderer.
//!
//! A thin layer over a `crossbeam_channel` bounded channel that adds what a
//! pipeline needs on top of plain send/recv:
//!
//! - an explicit, idempotent `close` on the producer side
//! - an `abort` that the consumer can tell apart from a clean end of stream
//! - counters and a high-water mark of buffered items
//!
//! Capacity 0 is a synchronous handoff: `push` returns only once the
//! consumer has taken the item.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread;

use crossbeam_channel as xchan;
use thiserror::Error;

/// Why a `push` was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The sender was already closed or aborted.
    #[error("channel already closed")]
    Closed,
    /// The receiver was dropped.
    #[error("receiver disconnected")]
    Disconnected,
}

/// Result of a `pop`.
#[derive(Debug, PartialEq, Eq)]
pub enum Pop<T> {
    Item(T),
    /// The producer closed the stream and every item has been delivered.
    End,
    /// The producer aborted the stream and every item pushed before the
    /// abort has been delivered.
    Aborted,
}

/// Snapshot of channel counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelStats {
    pub capacity: usize,
    pub pushed: u64,
    pub popped: u64,
    /// Most items ever observed waiting in the buffer.
    pub high_water: usize,
}

#[derive(Debug, Default)]
struct Shared {
    capacity: usize,
    pushed: AtomicU64,
    popped: AtomicU64,
    high_water: AtomicUsize,
    aborted: AtomicBool,
}

impl Shared {
    fn stats(&self) -> ChannelStats {
        ChannelStats {
            capacity: self.capacity,
            pushed: self.pushed.load(Ordering::Relaxed),
            popped: self.popped.load(Ordering::Relaxed),
            high_water: self.high_water.load(Ordering::Relaxed),
        }
    }
}

/// Create a channel holding at most `capacity` buffered items.
pub fn bounded<T>(capacity: usize) -> (StreamSender<T>, StreamReceiver<T>) {
    let (tx, rx) = xchan::bounded(capacity);
    let shared = Arc::new(Shared {
        capacity,
        ..Shared::default()
    });
    (
        StreamSender {
            tx: Some(tx),
            shared: Arc::clone(&shared),
        },
        StreamReceiver { rx, shared },
    )
}

/// Producer half of the channel.
#[derive(Debug)]
pub struct StreamSender<T> {
    tx: Option<xchan::Sender<T>>,
    shared: Arc<Shared>,
}

impl<T> StreamSender<T> {
    /// Hand one item to the consumer, blocking while the buffer is full.
    pub fn push(&self, item: T) -> Result<(), ChannelError> {
        let tx = self.tx.as_ref().ok_or(ChannelError::Closed)?;
        tx.send(item).map_err(|_| ChannelError::Disconnected)?;
        self.shared.pushed.fetch_add(1, Ordering::Relaxed);
        self.shared.high_water.fetch_max(tx.len(), Ordering::Relaxed);
        Ok(())
    }

    /// Signal a clean end of stream.
    ///
    /// Returns `false` if the channel was already closed or aborted.
    pub fn close(&mut self) -> bool {
        self.tx.take().is_some()
    }

    /// Signal that the stream ended because of a failure. Never blocks.
    ///
    /// Returns `false` if the channel was already closed or aborted.
    pub fn abort(&mut self) -> bool {
        if self.tx.is_none() {
            return false;
        }
        // Must be visible before the disconnect the receiver observes.
        self.shared.aborted.store(true, Ordering::Release);
        self.close()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn monitor(&self) -> ChannelMonitor {
        ChannelMonitor(Arc::clone(&self.shared))
    }
}

impl<T> Drop for StreamSender<T> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.abort();
        } else {
            self.close();
        }
    }
}

/// Consumer half of the channel.
#[derive(Debug)]
pub struct StreamReceiver<T> {
    rx: xchan::Receiver<T>,
    shared: Arc<Shared>,
}

impl<T> StreamReceiver<T> {
    /// Take the next item, blocking until one arrives or the stream ends.
    pub fn pop(&self) -> Pop<T> {
        match self.rx.recv() {
            Ok(item) => {
                self.shared.popped.fetch_add(1, Ordering::Relaxed);
                Pop::Item(item)
            }
            Err(_) if self.shared.aborted.load(Ordering::Acquire) => Pop::Aborted,
            Err(_) => Pop::End,
        }
    }

    pub fn monitor(&self) -> ChannelMonitor {
        ChannelMonitor(Arc::clone(&self.shared))
    }
}

/// Read-only view of a channel's counters that outlives both halves.
#[derive(Debug, Clone)]
pub struct ChannelMonitor(Arc<Shared>);

impl ChannelMonitor {
    pub fn stats(&self) -> ChannelStats {
        self.0.stats()
    }
}
