// Read models for jar pages
//
// Compact transaction items for the jar overview. Same guards as the
// routes, different projection.

use crate::error::ApiError;
use crate::guards::require_membership;
use crate::model::{format_timestamp, TransactionFilter, TransactionType, TransactionWithCategory};
use crate::session::Identity;
use crate::store::LedgerStore;
use serde::Serialize;

pub const DEFAULT_RECENT_LIMIT: i64 = 50;
pub const MAX_RECENT_LIMIT: i64 = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryName {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TxItem {
    pub id: String,
    /// RFC 3339, UTC, millisecond precision
    pub date: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub currency: Option<String>,
    pub note: Option<String>,
    pub category: Option<CategoryName>,
}

impl From<TransactionWithCategory> for TxItem {
    fn from(row: TransactionWithCategory) -> Self {
        let tx = row.transaction;
        TxItem {
            id: tx.id,
            date: format_timestamp(&tx.date),
            amount: tx.amount.as_f64(),
            kind: tx.kind,
            currency: tx.currency,
            note: tx.note,
            category: row.category.map(|c| CategoryName { name: c.name }),
        }
    }
}

pub fn clamp_limit(limit: i64) -> usize {
    limit.clamp(1, MAX_RECENT_LIMIT) as usize
}

/// Newest transactions of a jar, after checking membership.
pub async fn recent_transactions<S>(
    store: &S,
    identity: &Identity,
    jar_id: &str,
    limit: i64,
) -> Result<Vec<TxItem>, ApiError>
where
    S: LedgerStore + ?Sized,
{
    require_membership(store, jar_id, identity).await?;

    let filter = TransactionFilter {
        limit: Some(clamp_limit(limit)),
        ..Default::default()
    };
    let rows = store.list_transactions(jar_id, &filter).await?;

    Ok(rows.into_iter().map(TxItem::from).collect())
}
