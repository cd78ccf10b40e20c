//! Line-oriented event source: one JSON `RawEvent` per line.
//!
//! Runs on its own blocking thread and feeds the pipeline synchronously, one
//! event at a time.

use std::io::{self, BufRead};

use notify_relay_core::error::{RelayError, Result};
use notify_relay_core::types::RawEvent;
use notify_relay_pipeline::EventPipeline;
use tracing::{info, warn};

/// Feed every parseable line of `reader` to the pipeline until EOF.
///
/// Blank lines are ignored; lines that are not valid events are logged and
/// skipped. A read failure ends the source. Returns the number of events
/// delivered.
pub fn read_jsonl<R: BufRead>(reader: R, pipeline: &EventPipeline) -> usize {
    let mut delivered = 0;
    for (lineno, line) in reader.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(event)) => {
                pipeline.on_event(event);
                delivered += 1;
            }
            Ok(None) => continue,
            Err(e @ RelayError::Io(_)) => {
                warn!(code = e.code(), error = %e, "event source read failed, stopping");
                break;
            }
            Err(e) => warn!(
                line = lineno + 1,
                code = e.code(),
                error = %e,
                "skipping malformed event line"
            ),
        }
    }
    info!(delivered, "event source reached end of input");
    delivered
}

/// `None` for a blank line.
fn parse_line(line: io::Result<String>) -> Result<Option<RawEvent>> {
    let line = line?;
    if line.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&line)?))
}
