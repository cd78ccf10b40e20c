//! Fragment parsing: `label:body` → [`Payload`].

use std::iter::FusedIterator;
use std::slice;

use notify_relay_core::config::MalformedPolicy;
use notify_relay_core::error::RelayError;
use notify_relay_core::types::{Payload, RawEvent};
use tracing::debug;

/// Turns the text fragments of an accepted event into payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayloadExtractor {
    policy: MalformedPolicy,
}

impl PayloadExtractor {
    pub fn new(policy: MalformedPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MalformedPolicy {
        self.policy
    }

    /// Lazily yields one payload per well-formed fragment, in fragment order.
    ///
    /// Each call starts over from the first fragment.
    pub fn extract<'a>(&self, event: &'a RawEvent) -> Payloads<'a> {
        Payloads {
            source_id: &event.source_id,
            fragments: event.text_fragments.iter(),
            policy: self.policy,
            done: false,
        }
    }
}

/// Iterator returned by [`PayloadExtractor::extract`].
pub struct Payloads<'a> {
    source_id: &'a str,
    fragments: slice::Iter<'a, String>,
    policy: MalformedPolicy,
    done: bool,
}

impl Iterator for Payloads<'_> {
    type Item = Payload;

    fn next(&mut self) -> Option<Payload> {
        if self.done {
            return None;
        }

        for fragment in self.fragments.by_ref() {
            if fragment.is_empty() {
                continue;
            }
            match parse_fragment(fragment) {
                Ok(body) => {
                    return Some(Payload {
                        source_id: self.source_id.to_string(),
                        body: body.to_string(),
                    });
                }
                Err(e) => {
                    debug!(
                        source_id = %self.source_id,
                        policy = ?self.policy,
                        error = %e,
                        "dropping malformed fragment"
                    );
                    if self.policy == MalformedPolicy::Abort {
                        self.done = true;
                        return None;
                    }
                }
            }
        }

        self.done = true;
        None
    }
}

impl FusedIterator for Payloads<'_> {}

/// Split a fragment on its first `:` and return everything after it.
///
/// The body is returned verbatim (later colons and surrounding whitespace
/// included) but must contain something other than whitespace.
pub fn parse_fragment(fragment: &str) -> Result<&str, RelayError> {
    match fragment.split_once(':') {
        Some((_label, body)) if !body.trim().is_empty() => Ok(body),
        _ => Err(RelayError::MalformedFragment {
            fragment: fragment.to_string(),
        }),
    }
}
