//! Inline event path: filter → extract → relay original → dispatch.
//!
//! Runs on whatever thread the event source delivers on. Nothing here awaits
//! or performs I/O; completion calls are handed to a [`PayloadDispatch`].

use std::sync::Arc;

use notify_relay_core::config::RelayConfig;
use notify_relay_core::types::{Payload, RawEvent, RelayMessage};
use tracing::{debug, warn};

use crate::{extract::PayloadExtractor, filter::EventFilter, queue::RelayQueue};

/// Receives each extracted payload for background processing.
pub trait PayloadDispatch: Send + Sync {
    /// Must return immediately; the actual work runs elsewhere.
    fn dispatch(&self, payload: Payload);
}

pub struct EventPipeline {
    filter: EventFilter,
    extractor: PayloadExtractor,
    queue: RelayQueue,
    dispatcher: Arc<dyn PayloadDispatch>,
    skip_without_consumer: bool,
}

impl EventPipeline {
    pub fn new(
        filter: EventFilter,
        extractor: PayloadExtractor,
        queue: RelayQueue,
        dispatcher: Arc<dyn PayloadDispatch>,
    ) -> Self {
        Self {
            filter,
            extractor,
            queue,
            dispatcher,
            skip_without_consumer: true,
        }
    }

    pub fn from_config(
        config: &RelayConfig,
        queue: RelayQueue,
        dispatcher: Arc<dyn PayloadDispatch>,
    ) -> Self {
        Self::new(
            EventFilter::new(config.source.target.clone()),
            PayloadExtractor::new(config.source.malformed),
            queue,
            dispatcher,
        )
        .skip_without_consumer(config.completion.skip_without_consumer)
    }

    /// When set (the default), events that arrive while no consumer is
    /// registered are dropped before any completion call is made.
    pub fn skip_without_consumer(mut self, skip: bool) -> Self {
        self.skip_without_consumer = skip;
        self
    }

    pub fn queue(&self) -> &RelayQueue {
        &self.queue
    }

    pub fn target(&self) -> &str {
        self.filter.target()
    }

    /// Process one event from the source. Returns the number of payloads
    /// relayed and dispatched. Never fails.
    pub fn on_event(&self, event: RawEvent) -> usize {
        let Some(event) = self.filter.accept(event) else {
            return 0;
        };

        if self.skip_without_consumer && !self.queue.has_consumer() {
            warn!(source_id = %event.source_id, "no relay consumer registered, event dropped");
            return 0;
        }

        let mut relayed = 0;
        for payload in self.extractor.extract(&event) {
            self.queue.send(RelayMessage::original(payload.body.clone()));
            self.dispatcher.dispatch(payload);
            relayed += 1;
        }
        debug!(source_id = %event.source_id, relayed, "event processed");
        relayed
    }
}
