use super::AppState;
use crate::api::{wrap, Reply};
use crate::error::{bad_request, ApiResult, DenialKind, HttpError};
use crate::guards::{authorize_in_jar, require_membership, ChildKind};
use crate::ledger::{recent_transactions, DEFAULT_RECENT_LIMIT};
use crate::model::{CategoryType, NewTransaction, TransactionFilter, TransactionType};
use crate::store::LedgerStore;
use crate::validation::{lenient_json, parse_limit, pick_patch, CreateTransaction, ListQuery};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use std::collections::HashMap;
use tracing::info;

// ============================================================================
// CATEGORY RULES
// ============================================================================

fn rule_violation(message: &str) -> HttpError {
    HttpError::new(DenialKind::BadInput, message)
}

/// INCOME needs an INCOME category, EXPENSE an EXPENSE one.
fn check_entry_type(kind: TransactionType, entry_type: CategoryType) -> Result<(), HttpError> {
    match (kind, entry_type) {
        (TransactionType::Expense, t) if t != CategoryType::Expense => {
            Err(rule_violation("EXPENSE must use an EXPENSE category."))
        }
        (TransactionType::Income, t) if t != CategoryType::Income => {
            Err(rule_violation("INCOME must use an INCOME category."))
        }
        _ => Ok(()),
    }
}

async fn category_type_in_jar(
    store: &dyn LedgerStore,
    jar_id: &str,
    category_id: &str,
) -> ApiResult<CategoryType> {
    let entry_type = store
        .find_category_type(jar_id, category_id)
        .await?
        .ok_or_else(|| rule_violation("Category not found in this jar."))?;
    Ok(entry_type)
}

async fn check_new_category(
    store: &dyn LedgerStore,
    jar_id: &str,
    kind: TransactionType,
    category_id: Option<&str>,
) -> ApiResult<()> {
    if kind == TransactionType::Transfer {
        if category_id.is_some() {
            return Err(rule_violation("Transfers cannot have categoryId.").into());
        }
        return Ok(());
    }

    let category_id =
        category_id.ok_or_else(|| rule_violation("categoryId is required for INCOME/EXPENSE."))?;
    let entry_type = category_type_in_jar(store, jar_id, category_id).await?;
    check_entry_type(kind, entry_type)?;
    Ok(())
}

// ============================================================================
// COLLECTION: /api/jars/:jar_id/transactions
// ============================================================================

/// GET - list, newest first, optionally filtered by type and date window
pub(super) async fn list(
    State(state): State<AppState>,
    Path(jar_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    wrap(list_inner(state, jar_id, params, headers)).await
}

async fn list_inner(
    state: AppState,
    jar_id: String,
    params: HashMap<String, String>,
    headers: HeaderMap,
) -> ApiResult<Reply> {
    let identity = state.require_identity(&headers).await?;
    require_membership(state.store.as_ref(), &jar_id, &identity).await?;

    let query = ListQuery::parse(&params)?;
    let filter = TransactionFilter {
        kind: query.kind,
        from: query.from,
        to: query.to,
        limit: None,
    };

    let rows = state.store.list_transactions(&jar_id, &filter).await?;
    Ok(Reply::json(rows))
}

/// POST - create, 201 with the stored row
pub(super) async fn create(
    State(state): State<AppState>,
    Path(jar_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    wrap(create_inner(state, jar_id, headers, body)).await
}

async fn create_inner(
    state: AppState,
    jar_id: String,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Reply> {
    let identity = state.require_identity(&headers).await?;
    require_membership(state.store.as_ref(), &jar_id, &identity).await?;

    let body = CreateTransaction::parse(&body)?;
    check_new_category(
        state.store.as_ref(),
        &jar_id,
        body.kind,
        body.category_id.as_deref(),
    )
    .await?;

    let created = state
        .store
        .create_transaction(NewTransaction {
            jar_id: jar_id.clone(),
            created_by: identity.as_str().to_string(),
            kind: body.kind,
            amount: body.amount,
            currency: body.currency,
            category_id: body.category_id,
            goal_id: body.goal_id,
            date: body.date,
            note: body.note,
            transfer_counterparty_jar_id: body.transfer_counterparty_jar_id,
            metadata: body.metadata,
        })
        .await?;

    info!(
        target: "jar_ledger::routes",
        jar_id = %jar_id,
        tx_id = %created.transaction.id,
        user_id = %identity,
        "transaction created"
    );
    Ok(Reply::created(created))
}

/// GET /recent - compact feed, `?limit=` clamped to [1, 200]
pub(super) async fn recent(
    State(state): State<AppState>,
    Path(jar_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    wrap(recent_inner(state, jar_id, params, headers)).await
}

async fn recent_inner(
    state: AppState,
    jar_id: String,
    params: HashMap<String, String>,
    headers: HeaderMap,
) -> ApiResult<Reply> {
    let identity = state.require_identity(&headers).await?;
    let limit = parse_limit(&params, DEFAULT_RECENT_LIMIT);

    let items = recent_transactions(state.store.as_ref(), &identity, &jar_id, limit).await?;
    Ok(Reply::json(items))
}

// ============================================================================
// ITEM: /api/jars/:jar_id/transactions/:id
// ============================================================================

pub(super) async fn get_one(
    State(state): State<AppState>,
    Path((jar_id, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    wrap(get_inner(state, jar_id, id, headers)).await
}

async fn get_inner(
    state: AppState,
    jar_id: String,
    id: String,
    headers: HeaderMap,
) -> ApiResult<Reply> {
    let identity = state.require_identity(&headers).await?;
    authorize_in_jar(state.store.as_ref(), ChildKind::Transaction, &jar_id, &id, &identity).await?;

    let tx = state
        .store
        .get_transaction(&id)
        .await?
        .ok_or_else(|| HttpError::new(DenialKind::NotFound, "Not found"))?;
    Ok(Reply::json(tx))
}

/// PATCH - whitelisted partial update
pub(super) async fn update(
    State(state): State<AppState>,
    Path((jar_id, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    wrap(update_inner(state, jar_id, id, headers, body)).await
}

async fn update_inner(
    state: AppState,
    jar_id: String,
    id: String,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Reply> {
    let identity = state.require_identity(&headers).await?;
    authorize_in_jar(state.store.as_ref(), ChildKind::Transaction, &jar_id, &id, &identity).await?;

    let patch = pick_patch(&lenient_json(&body))?;
    if patch.is_empty() {
        return Err(bad_request(Some("No updatable fields")).into());
    }

    if let Some(Some(category_id)) = &patch.category_id {
        let entry_type = category_type_in_jar(state.store.as_ref(), &jar_id, category_id).await?;
        if let Some(kind) = patch.kind {
            check_entry_type(kind, entry_type)?;
        }
    }

    let updated = state.store.update_transaction(&id, &patch).await?;
    info!(
        target: "jar_ledger::routes",
        jar_id = %jar_id,
        tx_id = %id,
        user_id = %identity,
        "transaction updated"
    );
    Ok(Reply::json(updated))
}

/// DELETE - 204 on success
pub(super) async fn remove(
    State(state): State<AppState>,
    Path((jar_id, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    wrap(remove_inner(state, jar_id, id, headers)).await
}

async fn remove_inner(
    state: AppState,
    jar_id: String,
    id: String,
    headers: HeaderMap,
) -> ApiResult<()> {
    let identity = state.require_identity(&headers).await?;
    authorize_in_jar(state.store.as_ref(), ChildKind::Transaction, &jar_id, &id, &identity).await?;

    state.store.delete_transaction(&id).await?;
    info!(
        target: "jar_ledger::routes",
        jar_id = %jar_id,
        tx_id = %id,
        user_id = %identity,
        "transaction deleted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_pairing() {
        assert!(check_entry_type(TransactionType::Expense, CategoryType::Expense).is_ok());
        assert!(check_entry_type(TransactionType::Income, CategoryType::Income).is_ok());

        let err = check_entry_type(TransactionType::Expense, CategoryType::Income).unwrap_err();
        assert_eq!(err.message, "EXPENSE must use an EXPENSE category.");
        let err = check_entry_type(TransactionType::Income, CategoryType::Savings).unwrap_err();
        assert_eq!(err.message, "INCOME must use an INCOME category.");
        assert_eq!(err.status().as_u16(), 400);
    }
}
