// HTTP surface
//
// Every handler follows the same order: identity, then guards, then one
// data operation. Handlers return plain values and `wrap` renders them.

mod keepalive;
mod transactions;

use crate::error::HttpError;
use crate::session::{Identity, IdentityProvider, RequestContext, SessionResolver};
use crate::store::LedgerStore;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub sessions: SessionResolver,
    pub session_cookie: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        provider: Arc<dyn IdentityProvider>,
        session_cookie: impl Into<String>,
    ) -> Self {
        AppState {
            store,
            sessions: SessionResolver::new(provider),
            session_cookie: session_cookie.into(),
        }
    }

    async fn require_identity(&self, headers: &HeaderMap) -> Result<Identity, HttpError> {
        let ctx = RequestContext::from_headers(headers, &self.session_cookie);
        self.sessions.require_identity(&ctx).await
    }
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/jars/:jar_id/transactions",
            get(transactions::list).post(transactions::create),
        )
        .route("/jars/:jar_id/transactions/recent", get(transactions::recent))
        .route(
            "/jars/:jar_id/transactions/:id",
            get(transactions::get_one)
                .patch(transactions::update)
                .delete(transactions::remove),
        )
        .route("/keepalive", get(keepalive::keepalive))
        .with_state(state);

    Router::new().nest("/api", api_routes)
}
