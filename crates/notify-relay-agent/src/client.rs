//! Background completion calls, one per payload.
//!
//! Per payload: received → request sent → responded | failed. Both terminal
//! states produce exactly one [`RelayMessage`]; there are no retries and no
//! cancellation of in-flight calls.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use uuid::Uuid;

use notify_relay_core::config::CompletionConfig;
use notify_relay_core::error::RelayError;
use notify_relay_core::types::{Payload, RelayMessage};
use notify_relay_pipeline::{PayloadDispatch, RelayQueue};

use crate::provider::{CompletionProvider, CompletionRequest};

/// Cheap to clone; every clone shares the provider, queue and permit pool.
#[derive(Clone)]
pub struct CompletionClient {
    provider: Arc<dyn CompletionProvider>,
    queue: RelayQueue,
    config: Arc<CompletionConfig>,
    runtime: Handle,
    /// Present only when `max_in_flight` is configured.
    permits: Option<Arc<Semaphore>>,
    tracker: TaskTracker,
}

impl CompletionClient {
    /// `runtime` is where completion tasks are spawned, so `dispatch` can be
    /// called from threads that are not part of it (e.g. an event-source thread).
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        queue: RelayQueue,
        config: CompletionConfig,
        runtime: Handle,
    ) -> Self {
        let permits = config
            .max_in_flight
            .filter(|n| *n > 0)
            .map(|n| Arc::new(Semaphore::new(n)));

        info!(
            provider = provider.name(),
            max_in_flight = ?config.max_in_flight,
            "completion client ready"
        );

        Self {
            provider,
            queue,
            config: Arc::new(config),
            runtime,
            permits,
            tracker: TaskTracker::new(),
        }
    }

    /// Completion tasks spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every spawned completion task to finish on its own.
    ///
    /// Nothing is cancelled; each call ends by responding, failing, or hitting
    /// its request timeout. Tasks spawned while waiting are waited for too.
    ///
    /// Meant for a single caller at shutdown: a concurrent caller can be left
    /// waiting once the first one reopens the tracker.
    pub async fn wait_in_flight(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    pub fn request_for(&self, payload: &Payload) -> CompletionRequest {
        CompletionRequest::new(&self.config, payload.body.as_str())
    }

    /// Run one completion call and turn its outcome into a message.
    ///
    /// Always yields exactly one message: `Response` with the raw body on
    /// success, `Error` with a diagnostic otherwise.
    pub async fn complete(&self, payload: Payload) -> RelayMessage {
        let request_id = Uuid::now_v7();
        let req = self.request_for(&payload);

        let _permit = match &self.permits {
            Some(permits) => Arc::clone(permits).acquire_owned().await.ok(),
            None => None,
        };

        debug!(%request_id, source_id = %payload.source_id, "completion request sent");
        match self.provider.complete(&req).await {
            Ok(result) => {
                debug!(%request_id, status = result.status, "completion responded");
                RelayMessage::response(result.body)
            }
            Err(e) => {
                let err = RelayError::from(e);
                warn!(%request_id, code = err.code(), error = %err, "completion failed");
                RelayMessage::error(err.to_string())
            }
        }
    }

    /// Spawn [`complete`](Self::complete) on the client's runtime and relay
    /// its message. The returned handle may be dropped; the task still runs.
    pub fn spawn(&self, payload: Payload) -> JoinHandle<()> {
        let this = self.clone();
        self.tracker.spawn_on(
            async move {
                let msg = this.complete(payload).await;
                this.queue.send(msg);
            },
            &self.runtime,
        )
    }
}

impl PayloadDispatch for CompletionClient {
    fn dispatch(&self, payload: Payload) {
        let _ = self.spawn(payload);
    }
}
