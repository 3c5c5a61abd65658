// Session resolver
//
// Identity comes from an explicit RequestContext instead of ambient
// request state, so guards can be exercised without a live request.

use crate::error::{DenialKind, HttpError};
use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_SESSION_COOKIE: &str = "jar_session";

// ============================================================================
// IDENTITY
// ============================================================================

/// Authenticated caller id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Identity(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// IDENTITY PROVIDER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no session token")]
    MissingToken,

    #[error("session token not recognized")]
    InvalidToken,

    #[error("session expired")]
    Expired,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_user(&self, token: Option<&str>) -> Result<AuthUser, AuthError>;

    /// Cheap round trip used by the keepalive route.
    async fn ping(&self) -> anyhow::Result<()>;
}

// ============================================================================
// REQUEST CONTEXT
// ============================================================================

/// Everything the resolver may read from the current request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    bearer: Option<String>,
    session_cookie: Option<String>,
}

impl RequestContext {
    /// Context for code running outside any request.
    pub fn detached() -> Self {
        RequestContext::default()
    }

    pub fn with_bearer(token: impl Into<String>) -> Self {
        RequestContext {
            bearer: Some(token.into()),
            session_cookie: None,
        }
    }

    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_bearer);

        let session_cookie = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(|raw| parse_cookie(raw, cookie_name));

        RequestContext {
            bearer,
            session_cookie,
        }
    }

    /// Bearer token wins over the cookie.
    pub fn token(&self) -> Option<&str> {
        self.bearer.as_deref().or(self.session_cookie.as_deref())
    }
}

fn parse_bearer(value: &str) -> Option<String> {
    let scheme = value.get(..7)?;
    let rest = value.get(7..)?;
    if !scheme.eq_ignore_ascii_case("bearer ") {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then(|| token.to_string())
}

fn parse_cookie(raw: &str, name: &str) -> Option<String> {
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key != name || value.is_empty() {
            return None;
        }
        let decoded = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        Some(decoded)
    })
}

// ============================================================================
// RESOLVER
// ============================================================================

#[derive(Clone)]
pub struct SessionResolver {
    provider: Arc<dyn IdentityProvider>,
}

impl SessionResolver {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        SessionResolver { provider }
    }

    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.provider
    }

    /// Never fails; an unusable session is just "no identity".
    pub async fn resolve_identity(&self, ctx: &RequestContext) -> Option<Identity> {
        match self.provider.get_user(ctx.token()).await {
            Ok(user) if !user.id.is_empty() => Some(Identity(user.id)),
            Ok(_) => None,
            Err(err) => {
                debug!(target: "jar_ledger::session", reason = %err, "no identity for request");
                None
            }
        }
    }

    pub async fn require_identity(&self, ctx: &RequestContext) -> Result<Identity, HttpError> {
        self.resolve_identity(ctx)
            .await
            .ok_or_else(|| HttpError::new(DenialKind::Unauthenticated, "Unauthorized"))
    }
}
