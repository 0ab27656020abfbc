use std::sync::Arc;
use std::time;

use http::StatusCode;
use metrics::counter;
use reqwest::header;
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, warn};
use url::Url;

use inbox_common::retry::RetryPolicy;
use inbox_common::ticket::NotificationEvent;

use crate::error::DeliveryError;

/// A worker that drains the notification queue and spawns one delivery task
/// per event.
///
/// Delivery tasks hold no ticket-store state, only a semaphore permit; a slow
/// or failing webhook endpoint backs up the queue but never the update path.
pub struct NotificationWorker {
    /// Queue of events awaiting delivery, fed by the update path.
    receiver: mpsc::UnboundedReceiver<NotificationEvent>,
    /// The client used for HTTP requests.
    client: reqwest::Client,
    /// The webhook endpoint events are POSTed to.
    endpoint: Url,
    /// Total number of delivery attempts per event, first try included.
    max_attempts: u32,
    /// The retry policy used to calculate backoff between attempts.
    retry_policy: RetryPolicy,
    /// Maximum number of concurrent deliveries in flight.
    max_concurrent_deliveries: usize,
}

impl NotificationWorker {
    pub fn new(
        receiver: mpsc::UnboundedReceiver<NotificationEvent>,
        endpoint: Url,
        request_timeout: time::Duration,
        max_attempts: u32,
        max_concurrent_deliveries: usize,
        retry_policy: RetryPolicy,
    ) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent("Inbox Notification Worker")
            .timeout(request_timeout)
            .build()
            .expect("failed to construct reqwest client for notification worker");

        Self {
            receiver,
            client,
            endpoint,
            max_attempts: max_attempts.max(1),
            retry_policy,
            max_concurrent_deliveries,
        }
    }

    /// Run until every sink is dropped and the queue is drained.
    pub async fn run(mut self) {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_deliveries));

        while let Some(event) = self.receiver.recv().await {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .expect("semaphore has been closed");

            counter!("notification_jobs_total").increment(1);

            let client = self.client.clone();
            let endpoint = self.endpoint.clone();
            let retry_policy = self.retry_policy;
            let max_attempts = self.max_attempts;

            tokio::spawn(async move {
                let ticket_id = event.id;
                let result =
                    deliver_with_retry(client, endpoint, event, retry_policy, max_attempts).await;
                drop(permit);

                // A failed delivery is final here: the ticket update that
                // produced the event already committed and stays committed.
                if let Err(err) = result {
                    counter!("notification_jobs_failed").increment(1);
                    error!(ticket_id, "failed to deliver notification: {}", err);
                }
            });
        }
    }
}

/// Attempt delivery of one event, sleeping through the policy's backoff
/// between transient failures, until it succeeds, is permanently rejected,
/// or `max_attempts` is reached.
async fn deliver_with_retry(
    client: reqwest::Client,
    endpoint: Url,
    event: NotificationEvent,
    retry_policy: RetryPolicy,
    max_attempts: u32,
) -> Result<(), DeliveryError> {
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match send_notification(&client, &endpoint, &event).await {
            Ok(_) => {
                counter!("notification_jobs_completed").increment(1);
                return Ok(());
            }
            Err(DeliveryError::Retryable { error, retry_after }) => {
                if attempt >= max_attempts {
                    return Err(DeliveryError::AttemptsExhausted {
                        attempts: attempt,
                        error,
                    });
                }

                let interval = retry_policy.retry_interval(attempt - 1, retry_after);
                counter!("notification_jobs_retried").increment(1);
                warn!(
                    ticket_id = event.id,
                    attempt,
                    backoff_ms = interval.as_millis() as u64,
                    "transient delivery failure, will retry: {}",
                    error
                );
                tokio::time::sleep(interval).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// POST one event to the webhook endpoint and classify the outcome.
///
/// Network errors, 429 and 5xx responses are transient; any other error
/// status is a permanent rejection.
async fn send_notification(
    client: &reqwest::Client,
    endpoint: &Url,
    event: &NotificationEvent,
) -> Result<reqwest::Response, DeliveryError> {
    let response = client
        .post(endpoint.clone())
        .json(event)
        .send()
        .await
        .map_err(|error| DeliveryError::Retryable {
            error,
            retry_after: None,
        })?;

    let retry_after = parse_retry_after_header(response.headers());

    match response.error_for_status() {
        Ok(response) => Ok(response),
        Err(err) => {
            if is_retryable_status(
                err.status()
                    .expect("status code is set as error is generated from a response"),
            ) {
                Err(DeliveryError::Retryable {
                    error: err,
                    retry_after,
                })
            } else {
                Err(DeliveryError::Rejected(err))
            }
        }
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Attempt to parse a duration out of a Retry-After header, returning None if
/// not possible. The header can carry either a number of seconds or an
/// RFC 2822 date; we try both.
fn parse_retry_after_header(header_map: &reqwest::header::HeaderMap) -> Option<time::Duration> {
    let retry_after = header_map
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?;

    if let Ok(seconds) = retry_after.parse::<u64>() {
        return Some(time::Duration::from_secs(seconds));
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc2822(retry_after) {
        let duration =
            chrono::DateTime::<chrono::offset::Utc>::from(dt) - chrono::offset::Utc::now();

        // This can only fail when negative, in which case we return None.
        return duration.to_std().ok();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicU32, Ordering};

    use axum::extract::State;
    use axum::routing::post;
    use axum::Router;
    use chrono::Utc;

    use inbox_common::ticket::{TicketPriority, TicketStatus};

    fn sample_event() -> NotificationEvent {
        NotificationEvent {
            id: 12,
            subject: "Order never arrived".to_string(),
            status: TicketStatus::Open,
            priority: TicketPriority::High,
            customer_name: "Ana Souza".to_string(),
            channel: "Email".to_string(),
            created_at: Utc::now(),
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::build(2, time::Duration::from_millis(5))
            .maximum_interval(time::Duration::from_millis(20))
            .provide()
    }

    /// Spin up a local endpoint that counts requests and always answers with
    /// `status`. Returns the endpoint URL and the request counter.
    async fn spawn_endpoint(status: StatusCode) -> (Url, Arc<AtomicU32>) {
        let hits = Arc::new(AtomicU32::new(0));

        async fn handler(State(state): State<(Arc<AtomicU32>, u16)>) -> StatusCode {
            let (hits, status) = state;
            hits.fetch_add(1, Ordering::SeqCst);
            StatusCode::from_u16(status).unwrap()
        }

        let app = Router::new()
            .route("/hook", post(handler))
            .with_state((hits.clone(), status.as_u16()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let url = Url::parse(&format!("http://{}/hook", addr)).unwrap();
        (url, hits)
    }

    #[test]
    fn test_is_retryable_status() {
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_parse_retry_after_header() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "120".parse().unwrap());

        let duration = parse_retry_after_header(&headers).unwrap();
        assert_eq!(duration, time::Duration::from_secs(120));

        headers.remove(reqwest::header::RETRY_AFTER);

        let duration = parse_retry_after_header(&headers);
        assert_eq!(duration, None);

        headers.insert(
            reqwest::header::RETRY_AFTER,
            "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap(),
        );

        let duration = parse_retry_after_header(&headers);
        assert_eq!(duration, None);
    }

    #[tokio::test]
    async fn test_successful_delivery_attempts_once() {
        let (url, hits) = spawn_endpoint(StatusCode::OK).await;
        let client = reqwest::Client::new();

        let result = deliver_with_retry(client, url, sample_event(), fast_policy(), 3).await;

        assert!(result.is_ok());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_exactly_max_attempts_times() {
        let (url, hits) = spawn_endpoint(StatusCode::INTERNAL_SERVER_ERROR).await;
        let client = reqwest::Client::new();

        let result = deliver_with_retry(client, url, sample_event(), fast_policy(), 3).await;

        assert!(matches!(
            result,
            Err(DeliveryError::AttemptsExhausted { attempts: 3, .. })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let (url, hits) = spawn_endpoint(StatusCode::UNPROCESSABLE_ENTITY).await;
        let client = reqwest::Client::new();

        let result = deliver_with_retry(client, url, sample_event(), fast_policy(), 3).await;

        assert!(matches!(result, Err(DeliveryError::Rejected(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_worker_drains_queue_and_delivers() {
        let (url, hits) = spawn_endpoint(StatusCode::OK).await;
        let (sink, receiver) = crate::queue::notification_channel();

        let worker = NotificationWorker::new(
            receiver,
            url,
            time::Duration::from_secs(5),
            3,
            8,
            fast_policy(),
        );
        let handle = tokio::spawn(worker.run());

        for id in 0..4 {
            let mut event = sample_event();
            event.id = id;
            sink.enqueue(event);
        }
        drop(sink);

        // Worker exits once all sinks are gone and the queue is drained;
        // spawned deliveries may still be settling briefly after that.
        handle.await.unwrap();
        tokio::time::timeout(time::Duration::from_secs(5), async {
            while hits.load(Ordering::SeqCst) < 4 {
                tokio::time::sleep(time::Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("all four events should be delivered");
    }
}
