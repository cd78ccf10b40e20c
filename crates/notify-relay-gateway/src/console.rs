//! Terminal display consumer.

use std::io::Write;

use notify_relay_core::types::RelayMessage;
use notify_relay_pipeline::RelayConsumer;
use tracing::warn;

/// Writes each relayed message as one `label: text` line.
pub struct Console<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> RelayConsumer for Console<W> {
    fn render(&mut self, msg: &RelayMessage) {
        if let Err(e) = writeln!(self.out, "{msg}").and_then(|_| self.out.flush()) {
            warn!(error = %e, "failed to render relay message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_labelled_line_per_message() {
        let mut console = Console::new(Vec::new());
        console.render(&RelayMessage::original("hello"));
        console.render(&RelayMessage::response("{\"id\":1}"));
        console.render(&RelayMessage::error("HTTP 500"));

        let text = String::from_utf8(console.into_inner()).unwrap();
        assert_eq!(
            text,
            "message: hello\nresponse: {\"id\":1}\nerror: HTTP 500\n"
        );
    }
}
