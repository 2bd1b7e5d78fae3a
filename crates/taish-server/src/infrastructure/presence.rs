//! Presence channel: vendor thread to dispatcher.
//!
//! The vendor library reports hardware from a thread it owns.  The callback
//! built by [`PresenceChannel::callback`] appends the event to a short-held
//! queue and signals a [`Notify`]; it never touches the global lock, so it
//! cannot block behind a running command.
//!
//! Wakeups are at-least-once, not one per event.  `Notify` stores a permit
//! when nobody is waiting, and the dispatcher drains the whole queue on every
//! wakeup, so a burst of events costs one wakeup and a late wakeup finds an
//! empty queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use taish_core::{PresenceCallback, PresenceEvent};
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Shared {
    queue: Mutex<VecDeque<PresenceEvent>>,
    wakeup: Notify,
}

/// Cloneable producer/consumer ends of the presence queue.
#[derive(Debug, Clone, Default)]
pub struct PresenceChannel {
    shared: Arc<Shared>,
}

impl PresenceChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// The callback to hand to the vendor in its service-method table.
    pub fn callback(&self) -> PresenceCallback {
        let channel = self.clone();
        Arc::new(move |present: bool, location: &str| {
            channel.push(PresenceEvent::new(present, location));
        })
    }

    /// Enqueues `event` and wakes the consumer.
    pub fn push(&self, event: PresenceEvent) {
        self.shared
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(event);
        self.shared.wakeup.notify_one();
    }

    /// Takes every queued event, oldest first.
    pub fn drain(&self) -> Vec<PresenceEvent> {
        self.shared
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    /// Events pushed but not yet drained.
    pub fn pending(&self) -> usize {
        self.shared
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Resolves after a [`push`](Self::push), including one that happened
    /// before this call.  Cancel-safe.
    pub async fn notified(&self) {
        self.shared.wakeup.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[test]
    fn test_drain_returns_events_in_arrival_order() {
        // Arrange
        let channel = PresenceChannel::new();
        channel.push(PresenceEvent::new(true, "1-1"));
        channel.push(PresenceEvent::new(false, "1-1"));
        channel.push(PresenceEvent::new(true, "1-2"));

        // Act
        let drained = channel.drain();

        // Assert
        assert_eq!(
            drained,
            vec![
                PresenceEvent::new(true, "1-1"),
                PresenceEvent::new(false, "1-1"),
                PresenceEvent::new(true, "1-2"),
            ]
        );
        assert_eq!(channel.pending(), 0);
    }

    #[test]
    fn test_notified_is_pending_until_push() {
        // Arrange
        let channel = PresenceChannel::new();
        let mut waiter = task::spawn(channel.notified());
        assert_pending!(waiter.poll());

        // Act
        channel.push(PresenceEvent::new(true, "1-1"));

        // Assert
        assert!(waiter.is_woken());
        assert_ready!(waiter.poll());
    }

    #[test]
    fn test_push_before_wait_is_not_lost() {
        let channel = PresenceChannel::new();
        channel.push(PresenceEvent::new(true, "1-1"));

        let mut waiter = task::spawn(channel.notified());

        assert_ready!(waiter.poll());
    }

    #[test]
    fn test_burst_of_pushes_yields_one_wakeup_and_full_drain() {
        // Arrange
        let channel = PresenceChannel::new();
        for loc in ["1-1", "1-2", "1-3"] {
            channel.push(PresenceEvent::new(true, loc));
        }

        // Act
        let mut first = task::spawn(channel.notified());
        assert_ready!(first.poll());
        let drained = channel.drain();
        let mut second = task::spawn(channel.notified());

        // Assert: every event arrived with the first wakeup, no extra permit
        assert_eq!(drained.len(), 3);
        assert_pending!(second.poll());
    }

    #[test]
    fn test_callback_from_foreign_thread_enqueues() {
        // Arrange
        let channel = PresenceChannel::new();
        let callback = channel.callback();

        // Act
        std::thread::spawn(move || {
            callback(true, "2-1");
            callback(true, "2-2");
        })
        .join()
        .unwrap();

        // Assert
        let locations: Vec<String> = channel.drain().into_iter().map(|e| e.location).collect();
        assert_eq!(locations, vec!["2-1", "2-2"]);
    }
}
