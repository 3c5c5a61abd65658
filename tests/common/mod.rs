// Shared fakes for route tests: an in-memory store that records every
// mutation, and an identity provider keyed by bearer token.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use jar_ledger::{
    router, AccessStore, AppState, AuthError, AuthUser, CategoryType, ChildKind, IdentityProvider,
    LedgerStore, MemberRole, Membership, Money, NewTransaction, Transaction, TransactionFilter,
    TransactionPatch, TransactionType, TransactionWithCategory,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    List(String, TransactionFilter),
    Create(NewTransaction),
    Update(String, TransactionPatch),
    Delete(String),
}

#[derive(Default)]
pub struct FakeStore {
    members: Mutex<Vec<Membership>>,
    categories: Mutex<HashMap<String, (String, CategoryType)>>,
    transactions: Mutex<HashMap<String, Transaction>>,
    pub calls: Mutex<Vec<Call>>,
    pub fail_lists: bool,
}

impl FakeStore {
    pub fn member(self, jar: &str, user: &str) -> Self {
        self.members.lock().unwrap().push(Membership {
            jar_id: jar.into(),
            user_id: user.into(),
            role: MemberRole::Member,
        });
        self
    }

    pub fn category(self, id: &str, jar: &str, entry_type: CategoryType) -> Self {
        self.categories
            .lock()
            .unwrap()
            .insert(id.into(), (jar.into(), entry_type));
        self
    }

    pub fn transaction(self, id: &str, jar: &str) -> Self {
        let date = Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap();
        self.transactions.lock().unwrap().insert(
            id.into(),
            Transaction {
                id: id.into(),
                jar_id: jar.into(),
                created_by: "u1".into(),
                kind: TransactionType::Expense,
                amount: Money::from_cents(2500),
                currency: Some("CAD".into()),
                category_id: None,
                goal_id: None,
                date,
                note: Some("original".into()),
                transfer_counterparty_jar_id: None,
                metadata: None,
                created_at: date,
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::List(..)))
            .collect()
    }

    pub fn stored(&self, id: &str) -> Option<Transaction> {
        self.transactions.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl AccessStore for FakeStore {
    async fn find_membership(&self, jar_id: &str, user_id: &str) -> Result<Option<Membership>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .find(|m| m.jar_id == jar_id && m.user_id == user_id)
            .cloned())
    }

    async fn find_child_jar(&self, kind: ChildKind, id: &str) -> Result<Option<String>> {
        Ok(match kind {
            ChildKind::Transaction => {
                self.transactions.lock().unwrap().get(id).map(|t| t.jar_id.clone())
            }
            ChildKind::Category => {
                self.categories.lock().unwrap().get(id).map(|(jar, _)| jar.clone())
            }
            _ => None,
        })
    }
}

#[async_trait]
impl LedgerStore for FakeStore {
    async fn find_category_type(
        &self,
        jar_id: &str,
        category_id: &str,
    ) -> Result<Option<CategoryType>> {
        Ok(self
            .categories
            .lock()
            .unwrap()
            .get(category_id)
            .filter(|(jar, _)| jar == jar_id)
            .map(|(_, t)| *t))
    }

    async fn list_transactions(
        &self,
        jar_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<TransactionWithCategory>> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::List(jar_id.into(), filter.clone()));
        if self.fail_lists {
            return Err(anyhow!("database is locked: /var/lib/jar-ledger/secret.db"));
        }
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.jar_id == jar_id)
            .map(|t| TransactionWithCategory {
                transaction: t.clone(),
                category: None,
            })
            .collect())
    }

    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>> {
        Ok(self.stored(id))
    }

    async fn create_transaction(&self, new: NewTransaction) -> Result<TransactionWithCategory> {
        self.calls.lock().unwrap().push(Call::Create(new.clone()));
        let tx = Transaction {
            id: "t_new".into(),
            jar_id: new.jar_id,
            created_by: new.created_by,
            kind: new.kind,
            amount: new.amount,
            currency: new.currency,
            category_id: new.category_id,
            goal_id: new.goal_id,
            date: new.date,
            note: new.note,
            transfer_counterparty_jar_id: new.transfer_counterparty_jar_id,
            metadata: new.metadata,
            created_at: Utc::now(),
        };
        Ok(TransactionWithCategory {
            transaction: tx,
            category: None,
        })
    }

    async fn update_transaction(&self, id: &str, patch: &TransactionPatch) -> Result<Transaction> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Update(id.into(), patch.clone()));
        let mut txs = self.transactions.lock().unwrap();
        let tx = txs.get_mut(id).ok_or_else(|| anyhow!("no transaction {}", id))?;
        if let Some(note) = &patch.note {
            tx.note = note.clone();
        }
        if let Some(amount) = patch.amount {
            tx.amount = amount;
        }
        Ok(tx.clone())
    }

    async fn delete_transaction(&self, id: &str) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Delete(id.into()));
        self.transactions.lock().unwrap().remove(id);
        Ok(())
    }
}

/// Tokens of the form `token-<user>` resolve to `<user>`.
pub struct TokenProvider;

#[async_trait]
impl IdentityProvider for TokenProvider {
    async fn get_user(&self, token: Option<&str>) -> Result<AuthUser, AuthError> {
        let token = token.ok_or(AuthError::MissingToken)?;
        token
            .strip_prefix("token-")
            .map(|id| AuthUser { id: id.to_string() })
            .ok_or(AuthError::InvalidToken)
    }

    async fn ping(&self) -> Result<()> {
        Err(anyhow!("auth backend unreachable"))
    }
}

pub fn app(store: Arc<FakeStore>) -> Router {
    router(AppState::new(store, Arc::new(TokenProvider), "jar_session"))
}

pub fn request(method: &str, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("authorization", format!("Bearer token-{}", user));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Status plus parsed JSON body (`Value::Null` when empty).
pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
