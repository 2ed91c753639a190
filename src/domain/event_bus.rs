//! Device-side fan-out of signal updates.
//!
//! Sampling and command handling publish here; every `/ws` session holds a
//! receiver and forwards what it gets, all of it, to its dashboard. Picking
//! out the signals a widget cares about happens on the dashboard, so the bus
//! carries no per-session filter.

use tokio::sync::broadcast;

use crate::wire::TextUpdate;

/// Broadcast of [`TextUpdate`]s to every connected dashboard.
///
/// A session that falls more than `capacity` updates behind skips the
/// oldest ones and keeps going with the newest values.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TextUpdate>,
}

impl EventBus {
    /// Bus holding up to `capacity` undelivered updates per session.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Hands `update` to every connected session.
    ///
    /// Returns how many sessions it reached; zero when no dashboard is
    /// connected, which is not an error.
    pub fn publish(&self, update: TextUpdate) -> usize {
        self.sender.send(update).unwrap_or(0)
    }

    /// Receiver for a new session. Take it before the websocket upgrade so
    /// nothing published during the handshake is lost.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<TextUpdate> {
        self.sender.subscribe()
    }

    /// Number of sessions currently listening.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = EventBus::new(16);
        assert_eq!(bus.publish(TextUpdate::new("pin_one", "1")), 0);
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_update_in_order() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.publish(TextUpdate::new("pin_one", "1")), 2);
        assert_eq!(bus.publish(TextUpdate::new("adc1_channel0", 42)), 2);

        for rx in [&mut rx1, &mut rx2] {
            let Ok(first) = rx.recv().await else {
                panic!("missing first update");
            };
            let Ok(second) = rx.recv().await else {
                panic!("missing second update");
            };
            assert_eq!(first.id.as_str(), "pin_one");
            assert_eq!(second.id.as_str(), "adc1_channel0");
        }
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = EventBus::new(16);
        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);
        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }
}
