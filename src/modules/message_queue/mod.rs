//! Priority queue for outgoing messages.
//!
//! Higher priorities are sent first; messages with equal priority keep their
//! insertion order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use super::AutomationError;

/// A message waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub channel_id: String,
    pub content: String,
    pub priority: i32,
    sequence: u64,
}

impl Ord for QueuedMessage {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueuedMessage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Delivers queued messages to their channel.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, message: &QueuedMessage) -> Result<(), AutomationError>;
}

#[derive(Debug, Default)]
pub struct MessageQueue {
    heap: BinaryHeap<QueuedMessage>,
    next_sequence: u64,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(
        &mut self,
        channel_id: impl Into<String>,
        content: impl Into<String>,
        priority: i32,
    ) {
        let message = QueuedMessage {
            channel_id: channel_id.into(),
            content: content.into(),
            priority,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.heap.push(message);
    }

    pub fn dequeue(&mut self) -> Option<QueuedMessage> {
        self.heap.pop()
    }

    pub fn peek(&self) -> Option<&QueuedMessage> {
        self.heap.peek()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    /// Send every queued message in priority order with `delay` between
    /// sends. Stops at the first failed send, leaving that message at the
    /// head of the queue, and returns the error.
    pub async fn drain(
        &mut self,
        sender: &dyn MessageSender,
        delay: Duration,
    ) -> Result<usize, AutomationError> {
        let mut sent = 0;
        while let Some(message) = self.heap.pop() {
            if sent > 0 && !delay.is_zero() {
                sleep(delay).await;
            }
            if let Err(err) = sender.send(&message).await {
                log::warn!(
                    "failed to send queued message to {}: {err}",
                    message.channel_id
                );
                self.heap.push(message);
                return Err(err);
            }
            sent += 1;
        }
        Ok(sent)
    }
}
