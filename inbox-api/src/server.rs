use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use eyre::{Result, WrapErr};
use tracing::{info, warn};
use url::Url;

use inbox_common::retry::RetryPolicy;
use inbox_common::ticket::Ticket;
use inbox_dispatch::queue::notification_channel;
use inbox_dispatch::worker::NotificationWorker;

use crate::config::Config;
use crate::router;
use crate::snapshot::SnapshotPublisher;
use crate::store::{MemoryTicketStore, TicketStore};
use crate::transition::NotifyRule;

/// Wire up the store, snapshot publisher and notification worker, then serve
/// the app on `listener` until `shutdown` resolves.
pub async fn serve<F>(config: Config, listener: tokio::net::TcpListener, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let store = Arc::new(MemoryTicketStore::new());
    seed_tickets(store.as_ref(), Path::new(&config.tickets_path)).await;
    let store: Arc<dyn TicketStore> = store;

    let snapshot = SnapshotPublisher::new();
    snapshot.publish_from_file(Path::new(&config.metrics_path));

    let endpoint: Url = config
        .webhook_url
        .parse()
        .wrap_err("WEBHOOK_URL is not a valid URL")?;
    let retry_policy = RetryPolicy::build(
        config.retry_policy.backoff_coefficient,
        config.retry_policy.initial_interval.0,
    )
    .maximum_interval(config.retry_policy.maximum_interval.0)
    .provide();

    let (notifications, receiver) = notification_channel();
    let worker = NotificationWorker::new(
        receiver,
        endpoint,
        config.request_timeout.0,
        config.max_attempts,
        config.max_concurrent_deliveries,
        retry_policy,
    );
    tokio::spawn(worker.run());

    let notify_rule = NotifyRule {
        priority: config.notify_on_priority,
        status: config.notify_on_status,
    };

    let app = router::router(store, snapshot, notifications, notify_rule);

    info!("listening on {:?}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Load the batch job's ticket artifact into the store. The service still
/// starts with an empty store when the artifact is absent; the batch job
/// just hasn't run yet.
async fn seed_tickets(store: &MemoryTicketStore, path: &Path) {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!("tickets artifact {} not loaded: {}", path.display(), err);
            return;
        }
    };

    let tickets: Vec<Ticket> = match serde_json::from_slice(&raw) {
        Ok(tickets) => tickets,
        Err(err) => {
            warn!(
                "tickets artifact {} is not a valid ticket list: {}",
                path.display(),
                err
            );
            return;
        }
    };

    let count = tickets.len();
    for ticket in tickets {
        store.insert(ticket).await;
    }
    info!(count, "seeded ticket store from batch artifact");
}
