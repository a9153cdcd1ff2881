//! Game signals and notification subscribers
//!
//! Inbound: breath signals from the breathing manager.
//! Outbound: session notifications broadcast to subscribers in the order
//! they subscribed, synchronously, at the moment of the state change.

use serde::{Deserialize, Serialize};

/// Result of one breathing action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreathSignal {
    /// Breath landed on the beat
    Hit,
    /// Breath missed
    Fail,
}

/// Session notifications for UI and other observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameNotification {
    GameStarted,
    /// A high score checkpoint began after its breathing pause
    LevelStarted,
    /// Play resumed inside a level after a breathing pause
    LevelContinued,
    GameOver,
}

/// Handle returned by [`Broadcast::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<E> = Box<dyn FnMut(E)>;

/// Multi-subscriber, fire-and-forget event registry
pub struct Broadcast<E> {
    listeners: Vec<(SubscriptionId, Listener<E>)>,
    next_id: u64,
}

impl<E> Default for Broadcast<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Broadcast<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcast")
            .field("subscribers", &self.listeners.len())
            .finish()
    }
}

impl<E> Broadcast<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 1,
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    #[inline]
    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: Copy> Broadcast<E> {
    pub fn emit(&mut self, event: E) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(event);
        }
    }
}
