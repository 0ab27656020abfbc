use axum::extract::{Path, Query, State};
use axum::Json;
use metrics::counter;
use serde::Deserialize;
use tracing::instrument;

use inbox_common::ticket::{NotificationEvent, Ticket, UpdateRequest};

use crate::api::ApiError;
use crate::router;
use crate::store::StoreError;

/// How many times the update path re-reads after losing a compare-and-write
/// race before giving up. Each loss means another writer made progress, so
/// in practice one retry is already rare.
const MAX_WRITE_ATTEMPTS: usize = 5;

#[derive(Deserialize, Default)]
pub struct ListQuery {
    pub search: Option<String>,
}

pub async fn list(
    State(state): State<router::AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<Ticket>> {
    let tickets = state.store.list(query.search.as_deref()).await;
    Json(tickets)
}

#[instrument(skip(state, request), fields(ticket_id = id))]
pub async fn update(
    State(state): State<router::AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<Ticket>, ApiError> {
    for _ in 0..MAX_WRITE_ATTEMPTS {
        let previous = match state.store.get(id).await {
            Ok(ticket) => ticket,
            Err(StoreError::NotFound(id)) => return Err(ApiError::TicketNotFound(id)),
            Err(StoreError::Conflict(id)) => return Err(ApiError::StoreContention(id)),
        };

        // Validation happens against the freshly read state, so after losing
        // a race the request is re-judged against what the winner wrote.
        let transition = crate::transition::evaluate(&previous, &request, &state.notify_rule)?;

        match state
            .store
            .compare_and_write(&previous, transition.ticket.clone())
            .await
        {
            Ok(()) => {
                counter!("ticket_updates_total").increment(1);

                if transition.notify {
                    // Fire-and-forget: the write above is already committed
                    // and delivery problems stay with the worker.
                    state
                        .notifications
                        .enqueue(NotificationEvent::from(&transition.ticket));
                }

                return Ok(Json(transition.ticket));
            }
            Err(StoreError::Conflict(_)) => {
                counter!("ticket_update_conflicts_total").increment(1);
                continue;
            }
            Err(StoreError::NotFound(id)) => return Err(ApiError::TicketNotFound(id)),
        }
    }

    Err(ApiError::StoreContention(id))
}
