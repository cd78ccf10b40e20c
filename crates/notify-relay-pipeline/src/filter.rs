//! Source filter for incoming notification events.
//!
//! Exact-match on the configured target identifier; anything else is dropped
//! without error.

use notify_relay_core::types::RawEvent;
use tracing::{debug, info};

/// Passes through only events emitted by the configured target application.
#[derive(Debug, Clone)]
pub struct EventFilter {
    target: String,
}

impl EventFilter {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the event unchanged when it comes from the target source and
    /// carries at least one non-empty fragment; `None` otherwise.
    ///
    /// Matching is exact and case-sensitive, like Android package names.
    pub fn accept(&self, event: RawEvent) -> Option<RawEvent> {
        if event.source_id != self.target {
            debug!(source_id = %event.source_id, "ignored event from non-target source");
            return None;
        }
        if !has_text(&event) {
            debug!(source_id = %event.source_id, "ignored event without text");
            return None;
        }
        info!(
            source_id = %event.source_id,
            fragments = event.text_fragments.len(),
            "accepted event"
        );
        Some(event)
    }
}

fn has_text(event: &RawEvent) -> bool {
    event.text_fragments.iter().any(|f| !f.is_empty())
}
