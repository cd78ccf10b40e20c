use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use notify_relay_agent::{CompletionClient, HttpCompletionProvider};
use notify_relay_core::config::RelayConfig;
use notify_relay_pipeline::{drain, EventPipeline, RelayQueue};

mod app;
mod console;
mod http;
mod source;

/// Relay notification text from one app to a chat-completions endpoint.
#[derive(Parser, Debug)]
#[command(name = "notify-relay", version)]
struct Cli {
    /// Config file (default: $NOTIFY_RELAY_CONFIG, then ~/.notify-relay/relay.toml).
    #[arg(short, long)]
    config: Option<String>,

    /// Read newline-delimited JSON events from stdin instead of serving HTTP.
    #[arg(long)]
    stdin: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "notify_relay_gateway=info,notify_relay_pipeline=info,notify_relay_agent=info,tower_http=debug".into()
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // explicit flag > NOTIFY_RELAY_CONFIG env > ~/.notify-relay/relay.toml
    let config_path = cli
        .config
        .clone()
        .or_else(|| std::env::var("NOTIFY_RELAY_CONFIG").ok());
    let config = RelayConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        RelayConfig::default()
    });
    info!(
        target_source = %config.source.target,
        malformed = ?config.source.malformed,
        url = %config.completion.url,
        "relay configured"
    );

    // the display consumer registers first so no early message is lost
    let queue = RelayQueue::new();
    let rx = queue.subscribe();
    let consumer = tokio::spawn(async move {
        let mut console = console::Console::new(std::io::stdout());
        drain(rx, &mut console).await
    });

    let provider = HttpCompletionProvider::from_config(&config.completion)?;
    let client = CompletionClient::new(
        Arc::new(provider),
        queue.clone(),
        config.completion.clone(),
        tokio::runtime::Handle::current(),
    );
    let pipeline = Arc::new(EventPipeline::from_config(
        &config,
        queue.clone(),
        Arc::new(client.clone()),
    ));

    if cli.stdin {
        info!("reading events from stdin");
        let events = Arc::clone(&pipeline);
        tokio::task::spawn_blocking(move || {
            source::read_jsonl(std::io::stdin().lock(), &events)
        })
        .await?;
    } else {
        let addr: SocketAddr =
            format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
        let state = Arc::new(app::AppState::new(Arc::clone(&pipeline), client.clone()));
        let router = app::build_router(state);

        info!("notify-relay listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
                info!("shutdown requested");
            })
            .await?;
    }

    // let in-flight completions respond or time out on their own
    let grace = Duration::from_secs(
        config.completion.connect_timeout_secs + config.completion.request_timeout_secs,
    );
    if tokio::time::timeout(grace, client.wait_in_flight())
        .await
        .is_err()
    {
        warn!(in_flight = client.in_flight(), "completion calls still running at exit");
    }

    queue.unregister();
    let rendered = consumer.await?;
    info!(rendered, "notify-relay stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use notify_relay_agent::{CompletionProvider, CompletionRequest, CompletionResult, ProviderError};
    use notify_relay_core::types::RelayMessage;
    use tower::ServiceExt;

    struct Echo;

    #[async_trait]
    impl CompletionProvider for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        async fn complete(&self, req: &CompletionRequest) -> Result<CompletionResult, ProviderError> {
            Ok(CompletionResult {
                status: 200,
                body: format!("re: {}", req.message()),
            })
        }
    }

    fn state() -> (Arc<app::AppState>, RelayQueue) {
        let config = RelayConfig::default();
        let queue = RelayQueue::new();
        let client = CompletionClient::new(
            Arc::new(Echo),
            queue.clone(),
            config.completion.clone(),
            tokio::runtime::Handle::current(),
        );
        let pipeline = Arc::new(EventPipeline::from_config(
            &config,
            queue.clone(),
            Arc::new(client.clone()),
        ));
        (Arc::new(app::AppState::new(pipeline, client)), queue)
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn post_event_relays_and_returns_count() {
        let (state, queue) = state();
        let mut rx = queue.subscribe();
        let router = app::build_router(state.clone());

        let req = Request::post("/events")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"source_id":"com.tencent.mm","text_fragments":["alice:hi","bob:yo"]}"#,
            ))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(resp).await["payloads"], 2);
        assert_eq!(rx.recv().await.unwrap(), RelayMessage::original("hi"));
        assert_eq!(rx.recv().await.unwrap(), RelayMessage::original("yo"));

        state.client.wait_in_flight().await;
        let mut responses: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|m| m.to_string())
            .collect();
        responses.sort();
        assert_eq!(responses, vec!["response: re: hi", "response: re: yo"]);
    }

    #[tokio::test]
    async fn post_event_from_other_source_relays_nothing() {
        let (state, queue) = state();
        let mut rx = queue.subscribe();
        let router = app::build_router(state);

        let req = Request::post("/events")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"source_id":"com.whatsapp","text_fragments":["a:b"]}"#))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(resp).await["payloads"], 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn null_fragment_does_not_drop_the_event() {
        let (state, queue) = state();
        let mut rx = queue.subscribe();
        let router = app::build_router(state.clone());

        let req = Request::post("/events")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"source_id":"com.tencent.mm","text_fragments":[null,"alice:hi"]}"#,
            ))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(body_json(resp).await["payloads"], 1);
        assert_eq!(rx.recv().await.unwrap(), RelayMessage::original("hi"));

        state.client.wait_in_flight().await;
        assert_eq!(rx.try_recv().unwrap(), RelayMessage::response("re: hi"));
    }

    #[tokio::test]
    async fn malformed_event_body_is_rejected() {
        let (state, _queue) = state();
        let router = app::build_router(state);

        let req = Request::post("/events")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text_fragments":"oops"}"#))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();

        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn health_reports_consumer_and_target() {
        let (state, queue) = state();
        let router = app::build_router(state);

        let resp = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["target"], "com.tencent.mm");
        assert_eq!(json["consumer_registered"], false);

        let _rx = queue.subscribe();
        let resp = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(resp).await["consumer_registered"], true);
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from(["notify-relay", "--config", "/tmp/relay.toml", "--stdin"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("/tmp/relay.toml"));
        assert!(cli.stdin);
    }
}
