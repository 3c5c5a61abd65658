// Session-backed identity provider
//
// Raw tokens are handed out once and never stored; the table only keeps
// their SHA-256 digest.

use crate::session::{AuthError, AuthUser, IdentityProvider};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::sync::{Arc, Mutex};

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Create a session for `user_id` valid for `ttl`. Returns the raw token.
pub fn issue_session(conn: &Connection, user_id: &str, ttl: Duration) -> Result<String> {
    let token = format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    );
    let now = Utc::now();

    conn.execute(
        "INSERT INTO sessions (token_hash, user_id, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            hash_token(&token),
            user_id,
            (now + ttl).to_rfc3339_opts(SecondsFormat::Millis, true),
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        ],
    )
    .with_context(|| format!("Failed to issue session for {}", user_id))?;

    Ok(token)
}

pub struct SqliteIdentityProvider {
    db: Arc<Mutex<Connection>>,
}

impl SqliteIdentityProvider {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        SqliteIdentityProvider { db }
    }

    fn lookup(&self, token_hash: &str) -> Result<Option<(String, String)>> {
        let conn = self.db.lock().map_err(|_| anyhow!("database mutex poisoned"))?;
        Ok(conn
            .query_row(
                "SELECT user_id, expires_at FROM sessions WHERE token_hash = ?1",
                [token_hash],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?)
    }
}

#[async_trait]
impl IdentityProvider for SqliteIdentityProvider {
    async fn get_user(&self, token: Option<&str>) -> Result<AuthUser, AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        let (user_id, expires_at) = self
            .lookup(&hash_token(token))?
            .ok_or(AuthError::InvalidToken)?;

        let expires_at = DateTime::parse_from_rfc3339(&expires_at)
            .context("Invalid session expiry in database")?
            .with_timezone(&Utc);
        if expires_at <= Utc::now() {
            return Err(AuthError::Expired);
        }

        Ok(AuthUser { id: user_id })
    }

    async fn ping(&self) -> Result<()> {
        let conn = self.db.lock().map_err(|_| anyhow!("database mutex poisoned"))?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}
