use super::AppState;
use crate::api::wrap;
use crate::error::ApiResult;
use axum::extract::State;
use axum::response::Response;
use tracing::warn;

/// GET /api/keepalive - touches the identity backend so it counts as
/// active. Always 204 so cron callers never see a failure.
pub(super) async fn keepalive(State(state): State<AppState>) -> Response {
    wrap(keepalive_inner(state)).await
}

async fn keepalive_inner(state: AppState) -> ApiResult<()> {
    if let Err(err) = state.sessions.provider().ping().await {
        warn!(target: "jar_ledger::keepalive", error = %err, "identity provider ping failed");
    }
    Ok(())
}
