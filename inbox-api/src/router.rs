use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};
use tower_http::trace::TraceLayer;

use inbox_common::metrics::track_requests;
use inbox_dispatch::queue::NotificationSink;

use crate::snapshot::SnapshotPublisher;
use crate::store::TicketStore;
use crate::transition::NotifyRule;
use crate::{dashboard, tickets};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TicketStore>,
    pub snapshot: SnapshotPublisher,
    pub notifications: NotificationSink,
    pub notify_rule: NotifyRule,
}

async fn index() -> &'static str {
    "inbox"
}

pub fn router(
    store: Arc<dyn TicketStore>,
    snapshot: SnapshotPublisher,
    notifications: NotificationSink,
    notify_rule: NotifyRule,
) -> Router {
    let state = AppState {
        store,
        snapshot,
        notifications,
        notify_rule,
    };

    Router::new()
        .route("/", get(index))
        .route("/metrics", get(dashboard::metrics))
        .route("/tickets", get(tickets::list))
        .route("/tickets/:id", patch(tickets::update))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_requests))
        .with_state(state)
}
