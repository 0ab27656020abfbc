use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio::sync::Mutex;

use inbox_api::config::{Config, EnvMsDuration, RetryPolicyConfig};
use inbox_api::server;
use inbox_common::ticket::{TicketPriority, TicketStatus};

/// A config wired for tests: artifacts in a caller-provided directory, fast
/// retry backoff so delivery failures settle within the test timeout.
pub fn test_config(tickets_path: &str, metrics_path: &str, webhook_url: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        prometheus_port: 0,
        export_prometheus: false,
        tickets_path: tickets_path.to_string(),
        metrics_path: metrics_path.to_string(),
        webhook_url: webhook_url.to_string(),
        max_attempts: 3,
        request_timeout: EnvMsDuration(Duration::from_secs(2)),
        max_concurrent_deliveries: 16,
        retry_policy: RetryPolicyConfig {
            backoff_coefficient: 2,
            initial_interval: EnvMsDuration(Duration::from_millis(10)),
            maximum_interval: EnvMsDuration(Duration::from_millis(50)),
        },
        notify_on_priority: TicketPriority::High,
        notify_on_status: TicketStatus::Closed,
    }
}

pub struct ServerHandle {
    pub addr: SocketAddr,
    client: reqwest::Client,
}

impl ServerHandle {
    pub async fn for_config(config: Config) -> ServerHandle {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            server::serve(config, listener, std::future::pending())
                .await
                .expect("server failed");
        });

        ServerHandle {
            addr,
            client: reqwest::Client::new(),
        }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("http://{}{}", self.addr, path))
            .send()
            .await
            .expect("failed to send request")
    }

    pub async fn patch(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .patch(format!("http://{}{}", self.addr, path))
            .json(&body)
            .send()
            .await
            .expect("failed to send request")
    }
}

/// A stand-in for the external automation endpoint: records every delivered
/// body and answers with a fixed status code.
pub struct WebhookRecorder {
    pub url: String,
    pub hits: Arc<AtomicU32>,
    pub bodies: Arc<Mutex<Vec<Value>>>,
}

impl WebhookRecorder {
    pub async fn spawn(status: StatusCode) -> WebhookRecorder {
        let hits = Arc::new(AtomicU32::new(0));
        let bodies: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));

        #[derive(Clone)]
        struct RecorderState {
            hits: Arc<AtomicU32>,
            bodies: Arc<Mutex<Vec<Value>>>,
            status: Arc<AtomicU16>,
        }

        async fn handler(
            State(state): State<RecorderState>,
            Json(body): Json<Value>,
        ) -> StatusCode {
            state.hits.fetch_add(1, Ordering::SeqCst);
            state.bodies.lock().await.push(body);
            StatusCode::from_u16(state.status.load(Ordering::SeqCst)).unwrap()
        }

        let state = RecorderState {
            hits: hits.clone(),
            bodies: bodies.clone(),
            status: Arc::new(AtomicU16::new(status.as_u16())),
        };
        let app = Router::new().route("/webhook", post(handler)).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        WebhookRecorder {
            url: format!("http://{}/webhook", addr),
            hits,
            bodies,
        }
    }

    /// Block until at least `expected` deliveries arrived, or panic after a
    /// couple of seconds.
    pub async fn wait_for_hits(&self, expected: u32) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.hits.load(Ordering::SeqCst) < expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "expected {} webhook deliveries, saw {}",
                expected,
                self.hits.load(Ordering::SeqCst)
            )
        });
    }

    /// Let in-flight deliveries settle, then return the count.
    pub async fn settled_hits(&self) -> u32 {
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.hits.load(Ordering::SeqCst)
    }
}
