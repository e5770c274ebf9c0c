//! Synchronous radio broadcast bus.
//!
//! [`RadioBus::publish`] runs every subscribed listener on the publisher's
//! own thread, in subscription order, each to completion before the next.
//! There is no queue and no deferred delivery: when `publish` returns, every
//! listener has seen the message.
//!
//! Subscribing needs `&mut RadioBus`, publishing only `&RadioBus`, so the
//! borrow checker plays the role of the notifier chain's reader/writer lock:
//! listeners cannot change while a broadcast is in flight. Listeners are
//! `Sync` because a shared bus may publish from several threads at once.

use heapless::Vec;

use crate::msg::BridgeMsg;

/// What a listener did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NotifyAction {
    /// Not interested, or rejected the message; continue the chain.
    Done,
    /// Consumed the message; continue the chain.
    Ok,
    /// Consumed the message; later listeners do not see it.
    Stop,
}

/// Receiver of radio broadcasts.
pub trait RadioListener {
    /// Handle one message. Must not block.
    fn on_radio_event(&self, msg: &BridgeMsg<'_>) -> NotifyAction;
}

/// Handle returned by [`RadioBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SubscriptionId(u32);

/// Bus errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror_no_std::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// All listener slots are taken
    #[error("radio bus is full")]
    Full,
}

struct Slot<'a> {
    id: SubscriptionId,
    listener: &'a (dyn RadioListener + Sync),
}

/// Fixed-capacity broadcast bus holding up to `N` listeners.
pub struct RadioBus<'a, const N: usize> {
    slots: Vec<Slot<'a>, N>,
    next_id: u32,
}

impl<'a, const N: usize> RadioBus<'a, N> {
    /// Empty bus.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_id: 0,
        }
    }

    /// Add `listener` at the end of the chain.
    ///
    /// # Errors
    ///
    /// [`BusError::Full`] when `N` listeners are already subscribed.
    pub fn subscribe(
        &mut self,
        listener: &'a (dyn RadioListener + Sync),
    ) -> Result<SubscriptionId, BusError> {
        let id = SubscriptionId(self.next_id);
        self.slots
            .push(Slot { id, listener })
            .map_err(|_| BusError::Full)?;
        self.next_id = self.next_id.wrapping_add(1);
        Ok(id)
    }

    /// Remove a listener. Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.slots.iter().position(|s| s.id == id) {
            Some(pos) => {
                self.slots.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Deliver `msg` to every listener in subscription order.
    ///
    /// Returns how many listeners consumed it ([`NotifyAction::Ok`] or
    /// [`NotifyAction::Stop`]). Delivery ends at the first `Stop`.
    pub fn publish(&self, msg: &BridgeMsg<'_>) -> usize {
        let mut consumed = 0usize;
        for slot in &self.slots {
            match slot.listener.on_radio_event(msg) {
                NotifyAction::Done => {}
                NotifyAction::Ok => consumed = consumed.saturating_add(1),
                NotifyAction::Stop => {
                    consumed = consumed.saturating_add(1);
                    break;
                }
            }
        }
        consumed
    }

    /// Number of subscribed listeners.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` when nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<const N: usize> Default for RadioBus<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}
