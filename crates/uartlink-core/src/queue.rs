//! Per-channel inbound queue bridging push-style delivery to pull-style receive
//!
//! Notification callbacks run on the event-pump task; consumers live on the
//! application task. The queue decouples the two: the pump calls [`push`],
//! the consumer calls [`recv`] with a timeout and gets messages back in
//! arrival order. The pump is the only producer and the application the only
//! consumer; that discipline is assumed, not enforced.
//!
//! [`push`]: InboundQueue::push
//! [`recv`]: InboundQueue::recv

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::Instant;

// ----------------------------------------------------------------------------
// Inbound Queue
// ----------------------------------------------------------------------------

/// FIFO queue of opaque inbound messages for one channel
///
/// A message is one notification's worth of bytes. Message boundaries are
/// whatever the remote chose to notify; reassembly, if any, is the
/// consumer's business.
#[derive(Debug, Default)]
pub struct InboundQueue {
    messages: Mutex<VecDeque<Vec<u8>>>,
    notify: Notify,
}

impl InboundQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Append one message; never blocks
    ///
    /// Called from the event-pump context when a notification arrives.
    pub fn push(&self, message: Vec<u8>) {
        {
            let mut messages = self.messages.lock().expect("inbound queue poisoned");
            messages.push_back(message);
        }
        self.notify.notify_one();
    }

    /// Wait up to `timeout` for the next message, in arrival order
    ///
    /// Returns `None` when no message arrived within the timeout. That is
    /// the documented idle outcome, not an error. Callers loop on it to
    /// drain a response burst (receive until no-data).
    pub async fn recv(&self, timeout: Duration) -> Option<Vec<u8>> {
        let deadline = Instant::now() + timeout;

        loop {
            let notified = self.notify.notified();

            if let Some(message) = self.pop() {
                return Some(message);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }

            if tokio::time::timeout(remaining, notified).await.is_err() {
                // Deadline hit; drain anything that raced in with the timer.
                return self.pop();
            }
        }
    }

    /// Atomically discard all queued messages
    ///
    /// Used before issuing a new outbound request so stale inbound data from
    /// a prior exchange cannot satisfy the next `recv`. An in-flight `push`
    /// lands wholly before or wholly after the clear.
    pub fn clear(&self) {
        let mut messages = self.messages.lock().expect("inbound queue poisoned");
        messages.clear();
    }

    /// Number of queued messages
    pub fn len(&self) -> usize {
        self.messages.lock().expect("inbound queue poisoned").len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pop(&self) -> Option<Vec<u8>> {
        self.messages
            .lock()
            .expect("inbound queue poisoned")
            .pop_front()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
