use axum::extract::State;
use axum::Json;

use inbox_common::snapshot::MetricsSnapshot;

use crate::api::ApiError;
use crate::router;

/// Serve the published business metrics. Until a batch run has published a
/// snapshot there is nothing consistent to serve, so this fails rather than
/// fabricating zeros.
pub async fn metrics(
    State(state): State<router::AppState>,
) -> Result<Json<MetricsSnapshot>, ApiError> {
    let snapshot = state.snapshot.current().ok_or(ApiError::MetricsUnavailable)?;
    Ok(Json(snapshot.as_ref().clone()))
}
