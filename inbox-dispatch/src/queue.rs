use metrics::counter;
use tokio::sync::mpsc;
use tracing::warn;

use inbox_common::ticket::NotificationEvent;

/// Create the in-process delivery queue: a clone-able sink for the update
/// path and the receiver the `NotificationWorker` drains.
pub fn notification_channel() -> (
    NotificationSink,
    mpsc::UnboundedReceiver<NotificationEvent>,
) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (NotificationSink { sender }, receiver)
}

/// Hand-off point between the update path and the worker.
///
/// `enqueue` never blocks and never fails the caller: once the ticket write
/// has committed, delivery problems are the worker's to report.
#[derive(Clone)]
pub struct NotificationSink {
    sender: mpsc::UnboundedSender<NotificationEvent>,
}

impl NotificationSink {
    pub fn enqueue(&self, event: NotificationEvent) {
        counter!("notification_events_enqueued_total").increment(1);

        if let Err(err) = self.sender.send(event) {
            // Worker is gone, likely because the process is shutting down.
            counter!("notification_events_dropped_total").increment(1);
            warn!("notification worker unavailable, event dropped: {}", err);
        }
    }
}
