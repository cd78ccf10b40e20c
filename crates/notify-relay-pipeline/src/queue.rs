//! Single-consumer hand-off point for everything the relay produces.
//!
//! A `RelayQueue` is a cloneable handle to one shared consumer slot. Every
//! producer (the event path, each completion task) holds a clone; the display
//! side registers its endpoint. Registering again replaces the endpoint, and
//! nothing sent before a registration is ever replayed to it.

use std::sync::{Arc, PoisonError, RwLock};

use notify_relay_core::error::RelayError;
use notify_relay_core::types::RelayMessage;
use tokio::sync::mpsc;
use tracing::{info, warn};

type Endpoint = mpsc::UnboundedSender<RelayMessage>;

#[derive(Clone, Default)]
pub struct RelayQueue {
    /// Unset until a consumer registers. Written only by `register`.
    slot: Arc<RwLock<Option<Endpoint>>>,
}

impl RelayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `endpoint` as the consumer, replacing any previous one.
    pub fn register(&self, endpoint: Endpoint) {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let replaced = slot.replace(endpoint).is_some();
        info!(replaced, "relay consumer registered");
    }

    /// Create a fresh channel, register its sender and hand back the receiver.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<RelayMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.register(tx);
        rx
    }

    /// Clear the slot. The current consumer's drain loop ends once it has
    /// rendered what was already queued. Returns whether one was registered.
    pub fn unregister(&self) -> bool {
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        let had = slot.take().is_some();
        if had {
            info!("relay consumer unregistered");
        }
        had
    }

    /// `true` while a registered consumer is still receiving.
    pub fn has_consumer(&self) -> bool {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Enqueue `msg` for the current consumer without waiting on it.
    pub fn try_send(&self, msg: RelayMessage) -> Result<(), RelayError> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        match slot.as_ref() {
            None => Err(RelayError::NoConsumerRegistered),
            Some(tx) => tx.send(msg).map_err(|_| RelayError::ConsumerGone),
        }
    }

    /// Like [`try_send`](Self::try_send), but a failed delivery is only logged.
    pub fn send(&self, msg: RelayMessage) {
        let kind = msg.kind;
        if let Err(e) = self.try_send(msg) {
            warn!(kind = %kind, code = e.code(), "relay message dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_relay_core::types::MessageKind;

    #[test]
    fn send_without_consumer_is_dropped() {
        let queue = RelayQueue::new();
        assert!(!queue.has_consumer());
        let err = queue.try_send(RelayMessage::original("lost")).unwrap_err();
        assert!(matches!(err, RelayError::NoConsumerRegistered));
        // the logging variant must not panic either
        queue.send(RelayMessage::original("lost again"));
    }

    #[test]
    fn late_consumer_sees_only_later_messages() {
        let queue = RelayQueue::new();
        queue.send(RelayMessage::original("before"));

        let mut rx = queue.subscribe();
        queue.send(RelayMessage::original("after"));

        assert_eq!(rx.try_recv().unwrap(), RelayMessage::original("after"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn re_registration_replaces_consumer() {
        let queue = RelayQueue::new();
        let mut first = queue.subscribe();
        queue.send(RelayMessage::original("one"));

        let mut second = queue.subscribe();
        queue.send(RelayMessage::original("two"));

        assert_eq!(first.try_recv().unwrap().text, "one");
        assert!(first.try_recv().is_err());
        assert_eq!(second.try_recv().unwrap().text, "two");
    }

    #[test]
    fn dropped_consumer_reports_gone() {
        let queue = RelayQueue::new();
        let rx = queue.subscribe();
        assert!(queue.has_consumer());
        drop(rx);
        assert!(!queue.has_consumer());
        let err = queue.try_send(RelayMessage::error("x")).unwrap_err();
        assert!(matches!(err, RelayError::ConsumerGone));
    }

    #[test]
    fn unregister_closes_the_consumer_channel() {
        let queue = RelayQueue::new();
        let mut rx = queue.subscribe();
        queue.send(RelayMessage::original("queued"));

        assert!(queue.unregister());
        assert!(!queue.unregister());

        assert_eq!(rx.try_recv().unwrap().text, "queued");
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn clones_share_the_slot() {
        let queue = RelayQueue::new();
        let producer = queue.clone();
        let mut rx = queue.subscribe();
        producer.send(RelayMessage::response("shared"));
        assert_eq!(rx.try_recv().unwrap().kind, MessageKind::Response);
    }

    #[test]
    fn per_producer_order_is_preserved() {
        let queue = RelayQueue::new();
        let mut rx = queue.subscribe();

        let mut handles = Vec::new();
        for producer in 0..4 {
            let q = queue.clone();
            handles.push(std::thread::spawn(move || {
                for seq in 0..100 {
                    q.send(RelayMessage::original(format!("{producer}:{seq}")));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let mut last_seen = [-1i32; 4];
        let mut total = 0;
        while let Ok(msg) = rx.try_recv() {
            let (producer, seq) = msg.text.split_once(':').unwrap();
            let producer: usize = producer.parse().unwrap();
            let seq: i32 = seq.parse().unwrap();
            assert!(seq > last_seen[producer], "producer {producer} out of order");
            last_seen[producer] = seq;
            total += 1;
        }
        assert_eq!(total, 400);
    }
}
