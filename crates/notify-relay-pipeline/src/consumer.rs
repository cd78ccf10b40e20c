//! Display consumer seam and the loop that drains the relay queue into it.

use notify_relay_core::types::RelayMessage;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// The display side of the relay.
///
/// Rendering happens on the consumer's own task; producers never wait on it.
pub trait RelayConsumer: Send {
    fn render(&mut self, msg: &RelayMessage);
}

/// Render every message from `rx` in arrival order.
///
/// Returns the number of messages rendered once every sender is gone, which
/// happens when the queue is dropped, unregistered, or another consumer
/// registers.
pub async fn drain<C>(mut rx: mpsc::UnboundedReceiver<RelayMessage>, consumer: &mut C) -> usize
where
    C: RelayConsumer + ?Sized,
{
    let mut rendered = 0;
    while let Some(msg) = rx.recv().await {
        debug!(kind = %msg.kind, len = msg.text.len(), "rendering relay message");
        consumer.render(&msg);
        rendered += 1;
    }
    info!(rendered, "relay consumer drained");
    rendered
}
