use dashmap::DashMap;
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::model::Event;

const CHANNEL_CAPACITY: usize = 256;

/// Fire-and-forget broadcast of engine events, keyed by inspector.
/// This is the notification-sink seam: downstream consumers (mailers,
/// calendar sync) subscribe here; a send with no listeners, or to a
/// lagging listener, is dropped and never fails the mutating caller.
pub struct NotifyHub {
    channels: DashMap<Ulid, broadcast::Sender<Event>>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to events for one inspector. Creates the channel if needed.
    pub fn subscribe(&self, inspector_id: Ulid) -> broadcast::Receiver<Event> {
        let sender = self
            .channels
            .entry(inspector_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0);
        sender.subscribe()
    }

    /// Publish an event. No-op if nobody is listening.
    pub fn send(&self, inspector_id: Ulid, event: &Event) {
        if let Some(sender) = self.channels.get(&inspector_id)
            && sender.send(event.clone()).is_err()
        {
            tracing::debug!("notify: no live subscribers for {inspector_id}");
        }
    }

    /// Drop an inspector's channel (e.g. after deletion).
    pub fn remove(&self, inspector_id: &Ulid) {
        self.channels.remove(inspector_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let inspector_id = Ulid::new();
        let mut rx = hub.subscribe(inspector_id);

        let event = Event::InspectorCreated {
            id: inspector_id,
            name: Some("Lee Park".into()),
        };
        hub.send(inspector_id, &event);

        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        let inspector_id = Ulid::new();
        // No subscriber — must not panic or block.
        hub.send(inspector_id, &Event::InspectorDeleted { id: inspector_id });
    }

    #[tokio::test]
    async fn removed_channel_stops_delivery() {
        let hub = NotifyHub::new();
        let inspector_id = Ulid::new();
        let mut rx = hub.subscribe(inspector_id);
        hub.remove(&inspector_id);
        hub.send(inspector_id, &Event::InspectorDeleted { id: inspector_id });
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Closed | broadcast::error::TryRecvError::Empty)
        ));
    }
}
