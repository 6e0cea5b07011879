//! The bounded multi-producer buffer between the producer threads and
//! the session loop.
//!
//! Producers never block: when the buffer is full the oldest queued
//! message is dropped to make room, on the theory that a stale frame or
//! gaze estimate is worthless once a fresher one exists. Drops are
//! counted and logged.

use crate::message::{Message, MessageSource};
use log::warn;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Default queue depth before the oldest message is dropped.
pub const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug)]
struct Inner {
    msgs: VecDeque<Message>,
    capacity: usize,
    dropped: u64,
}

/// A cloneable handle to the shared buffer. Every producer holds a
/// clone; the session loop drains it through [`Iterator`].
#[derive(Debug, Clone)]
pub struct Bus {
    inner: Arc<Mutex<Inner>>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Bus {
    /// A bus holding at most `capacity` undelivered messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                msgs: VecDeque::with_capacity(capacity),
                capacity: capacity.max(1),
                dropped: 0,
            })),
        }
    }

    /// Enqueues a message, evicting the oldest one when full. Never
    /// blocks beyond the lock.
    pub fn publish(&self, msg: Message) {
        let mut inner = self.inner.lock().unwrap();
        if inner.msgs.len() >= inner.capacity {
            inner.msgs.pop_front();
            inner.dropped += 1;
            warn!(
                "bus full, dropped oldest message ({} dropped so far)",
                inner.dropped
            );
        }
        inner.msgs.push_back(msg);
    }

    /// How many messages have been evicted since creation.
    pub fn dropped(&self) -> u64 {
        self.inner.lock().unwrap().dropped
    }
}

impl Iterator for Bus {
    type Item = Message;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.lock().unwrap().msgs.pop_front()
    }
}

impl MessageSource for Bus {
    fn clear(&mut self) {
        self.inner.lock().unwrap().msgs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_in_fifo_order() {
        let mut bus = Bus::new(4);
        bus.publish(Message::Speech("one".to_owned()));
        bus.publish(Message::Speech("two".to_owned()));
        assert_eq!(bus.next(), Some(Message::Speech("one".to_owned())));
        assert_eq!(bus.next(), Some(Message::Speech("two".to_owned())));
        assert_eq!(bus.next(), None);
    }

    #[test]
    fn full_bus_drops_the_oldest() {
        let mut bus = Bus::new(2);
        bus.publish(Message::Speech("a".to_owned()));
        bus.publish(Message::Speech("b".to_owned()));
        bus.publish(Message::Speech("c".to_owned()));
        assert_eq!(bus.dropped(), 1);
        assert_eq!(bus.next(), Some(Message::Speech("b".to_owned())));
        assert_eq!(bus.next(), Some(Message::Speech("c".to_owned())));
        assert_eq!(bus.next(), None);
    }

    #[test]
    fn clones_share_the_queue() {
        let mut bus = Bus::new(4);
        let producer = bus.clone();
        producer.publish(Message::Speech("hi".to_owned()));
        assert_eq!(bus.next(), Some(Message::Speech("hi".to_owned())));
    }

    #[test]
    fn clear_discards_everything() {
        let mut bus = Bus::new(4);
        bus.publish(Message::Speech("stale".to_owned()));
        bus.clear();
        assert_eq!(bus.next(), None);
    }
}
