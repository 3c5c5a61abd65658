// Persistence seams
//
// The guard layer only needs AccessStore. Route handlers need the full
// LedgerStore. Both are plain async point lookups and mutations; nothing
// here composes calls into one atomic unit.

pub mod sessions;
pub mod sqlite;

use crate::guards::ChildKind;
use crate::model::{
    CategoryType, Membership, NewTransaction, Transaction, TransactionFilter, TransactionPatch,
    TransactionWithCategory,
};
use anyhow::Result;
use async_trait::async_trait;

pub use sessions::{issue_session, SqliteIdentityProvider};
pub use sqlite::{add_member, create_category, create_jar, setup_database, SqliteStore};

/// Lookups the guard layer runs before any data operation.
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Composite-key lookup of (jar, user).
    async fn find_membership(&self, jar_id: &str, user_id: &str) -> Result<Option<Membership>>;

    /// Owning jar of a child row, selecting nothing else.
    async fn find_child_jar(&self, kind: ChildKind, id: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait LedgerStore: AccessStore {
    /// Entry type of a category, only if it belongs to `jar_id`.
    async fn find_category_type(
        &self,
        jar_id: &str,
        category_id: &str,
    ) -> Result<Option<CategoryType>>;

    /// Newest first: date desc, then creation time desc.
    async fn list_transactions(
        &self,
        jar_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<TransactionWithCategory>>;

    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>>;

    async fn create_transaction(&self, new: NewTransaction) -> Result<TransactionWithCategory>;

    async fn update_transaction(&self, id: &str, patch: &TransactionPatch) -> Result<Transaction>;

    async fn delete_transaction(&self, id: &str) -> Result<()>;
}
