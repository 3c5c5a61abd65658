use crate::guards::ChildKind;
use crate::model::{
    Category, CategoryType, MemberRole, Membership, Money, NewTransaction, Transaction,
    TransactionFilter, TransactionPatch, TransactionWithCategory,
};
use crate::store::{AccessStore, LedgerStore};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS jars (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            created_by TEXT NOT NULL,
            currency TEXT NOT NULL DEFAULT 'CAD',
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS jar_members (
            jar_id TEXT NOT NULL REFERENCES jars(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL,
            role TEXT NOT NULL,
            joined_at TEXT NOT NULL,
            PRIMARY KEY (jar_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            jar_id TEXT NOT NULL REFERENCES jars(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            entry_type TEXT NOT NULL,
            UNIQUE (jar_id, name)
        );

        CREATE TABLE IF NOT EXISTS budgets (
            id TEXT PRIMARY KEY,
            jar_id TEXT NOT NULL REFERENCES jars(id) ON DELETE CASCADE,
            category_id TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
            monthly_cents INTEGER NOT NULL,
            UNIQUE (jar_id, category_id)
        );

        CREATE TABLE IF NOT EXISTS goals (
            id TEXT PRIMARY KEY,
            jar_id TEXT NOT NULL REFERENCES jars(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            target_cents INTEGER NOT NULL,
            target_date TEXT,
            UNIQUE (jar_id, name)
        );

        CREATE TABLE IF NOT EXISTS invites (
            id TEXT PRIMARY KEY,
            jar_id TEXT NOT NULL REFERENCES jars(id) ON DELETE CASCADE,
            email TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recurring_transactions (
            id TEXT PRIMARY KEY,
            jar_id TEXT NOT NULL REFERENCES jars(id) ON DELETE CASCADE,
            type TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            category_id TEXT REFERENCES categories(id) ON DELETE SET NULL,
            cadence TEXT NOT NULL,
            next_run TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            jar_id TEXT NOT NULL REFERENCES jars(id) ON DELETE CASCADE,
            created_by TEXT NOT NULL,
            type TEXT NOT NULL,
            amount_cents INTEGER NOT NULL,
            currency TEXT,
            category_id TEXT REFERENCES categories(id) ON DELETE SET NULL,
            goal_id TEXT REFERENCES goals(id) ON DELETE SET NULL,
            date TEXT NOT NULL,
            note TEXT,
            transfer_counterparty_jar_id TEXT REFERENCES jars(id) ON DELETE SET NULL,
            metadata TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sessions (
            token_hash TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_members_user ON jar_members(user_id);
        CREATE INDEX IF NOT EXISTS idx_transactions_jar_date ON transactions(jar_id, date);
        CREATE INDEX IF NOT EXISTS idx_categories_jar ON categories(jar_id);
        CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);",
    )?;

    Ok(())
}

// ============================================================================
// ADMIN HELPERS
// ============================================================================

/// Create a jar and make `owner` its OWNER member. Returns the jar id.
pub fn create_jar(conn: &Connection, name: &str, owner: &str) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = to_text(Utc::now());

    conn.execute(
        "INSERT INTO jars (id, name, created_by, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![id, name, owner, now],
    )?;
    add_member(conn, &id, owner, MemberRole::Owner)?;

    Ok(id)
}

/// Insert or update a membership row.
pub fn add_member(conn: &Connection, jar_id: &str, user_id: &str, role: MemberRole) -> Result<()> {
    conn.execute(
        "INSERT INTO jar_members (jar_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (jar_id, user_id) DO UPDATE SET role = excluded.role",
        params![jar_id, user_id, role.as_str(), to_text(Utc::now())],
    )
    .with_context(|| format!("Failed to add {} to jar {}", user_id, jar_id))?;
    Ok(())
}

pub fn create_category(
    conn: &Connection,
    jar_id: &str,
    name: &str,
    entry_type: CategoryType,
) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO categories (id, jar_id, name, entry_type) VALUES (?1, ?2, ?3, ?4)",
        params![id, jar_id, name, entry_type.as_str()],
    )
    .with_context(|| format!("Failed to create category {} in jar {}", name, jar_id))?;
    Ok(id)
}

// ============================================================================
// ROW MAPPING
// ============================================================================

fn to_text(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid timestamp in database: {}", raw))?
        .with_timezone(&Utc))
}

/// Raw column values; parsing happens outside rusqlite's row callback so
/// errors keep their context.
struct TransactionColumns {
    id: String,
    jar_id: String,
    created_by: String,
    kind: String,
    amount_cents: i64,
    currency: Option<String>,
    category_id: Option<String>,
    goal_id: Option<String>,
    date: String,
    note: Option<String>,
    transfer_counterparty_jar_id: Option<String>,
    metadata: Option<String>,
    created_at: String,
}

const TRANSACTION_COLUMNS: &str = "t.id, t.jar_id, t.created_by, t.type, t.amount_cents, t.currency,
     t.category_id, t.goal_id, t.date, t.note, t.transfer_counterparty_jar_id, t.metadata,
     t.created_at";

impl TransactionColumns {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(TransactionColumns {
            id: row.get(0)?,
            jar_id: row.get(1)?,
            created_by: row.get(2)?,
            kind: row.get(3)?,
            amount_cents: row.get(4)?,
            currency: row.get(5)?,
            category_id: row.get(6)?,
            goal_id: row.get(7)?,
            date: row.get(8)?,
            note: row.get(9)?,
            transfer_counterparty_jar_id: row.get(10)?,
            metadata: row.get(11)?,
            created_at: row.get(12)?,
        })
    }

    fn into_transaction(self) -> Result<Transaction> {
        let metadata = match self.metadata {
            Some(json) => Some(serde_json::from_str(&json).context("Invalid metadata JSON")?),
            None => None,
        };

        Ok(Transaction {
            kind: self.kind.parse()?,
            amount: Money::from_cents(self.amount_cents),
            date: parse_time(&self.date)?,
            created_at: parse_time(&self.created_at)?,
            id: self.id,
            jar_id: self.jar_id,
            created_by: self.created_by,
            currency: self.currency,
            category_id: self.category_id,
            goal_id: self.goal_id,
            note: self.note,
            transfer_counterparty_jar_id: self.transfer_counterparty_jar_id,
            metadata,
        })
    }
}

struct CategoryColumns {
    id: Option<String>,
    jar_id: Option<String>,
    name: Option<String>,
    entry_type: Option<String>,
}

impl CategoryColumns {
    /// Reads the four category columns starting at `offset` (LEFT JOIN, so
    /// all may be NULL).
    fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(CategoryColumns {
            id: row.get(offset)?,
            jar_id: row.get(offset + 1)?,
            name: row.get(offset + 2)?,
            entry_type: row.get(offset + 3)?,
        })
    }

    fn into_category(self) -> Result<Option<Category>> {
        match (self.id, self.jar_id, self.name, self.entry_type) {
            (Some(id), Some(jar_id), Some(name), Some(entry_type)) => Ok(Some(Category {
                id,
                jar_id,
                name,
                entry_type: entry_type.parse()?,
            })),
            _ => Ok(None),
        }
    }
}

// ============================================================================
// SQLITE STORE
// ============================================================================

#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        SqliteStore { db }
    }

    /// Open (or create) the database file and run migrations.
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {:?}", path))?;
        setup_database(&conn)?;
        Ok(SqliteStore::new(Arc::new(Mutex::new(conn))))
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteStore::new(Arc::new(Mutex::new(conn))))
    }

    pub fn handle(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.db)
    }

    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.db.lock().map_err(|_| anyhow!("database mutex poisoned"))
    }

    fn load_transaction(conn: &Connection, id: &str) -> Result<Option<Transaction>> {
        let sql = format!("SELECT {} FROM transactions t WHERE t.id = ?1", TRANSACTION_COLUMNS);
        conn.query_row(&sql, [id], TransactionColumns::from_row)
            .optional()?
            .map(TransactionColumns::into_transaction)
            .transpose()
    }

    fn load_with_category(conn: &Connection, id: &str) -> Result<TransactionWithCategory> {
        let sql = format!(
            "SELECT {}, c.id, c.jar_id, c.name, c.entry_type
             FROM transactions t LEFT JOIN categories c ON c.id = t.category_id
             WHERE t.id = ?1",
            TRANSACTION_COLUMNS
        );
        let (tx, category) = conn.query_row(&sql, [id], |row| {
            Ok((TransactionColumns::from_row(row)?, CategoryColumns::from_row(row, 13)?))
        })?;

        Ok(TransactionWithCategory {
            transaction: tx.into_transaction()?,
            category: category.into_category()?,
        })
    }
}

#[async_trait]
impl AccessStore for SqliteStore {
    async fn find_membership(&self, jar_id: &str, user_id: &str) -> Result<Option<Membership>> {
        let conn = self.conn()?;
        let role: Option<String> = conn
            .query_row(
                "SELECT role FROM jar_members WHERE jar_id = ?1 AND user_id = ?2",
                params![jar_id, user_id],
                |row| row.get(0),
            )
            .optional()?;

        match role {
            Some(role) => Ok(Some(Membership {
                jar_id: jar_id.to_string(),
                user_id: user_id.to_string(),
                role: role.parse()?,
            })),
            None => Ok(None),
        }
    }

    async fn find_child_jar(&self, kind: ChildKind, id: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let sql = format!("SELECT jar_id FROM {} WHERE id = ?1", kind.table());
        Ok(conn.query_row(&sql, [id], |row| row.get(0)).optional()?)
    }
}

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn find_category_type(
        &self,
        jar_id: &str,
        category_id: &str,
    ) -> Result<Option<CategoryType>> {
        let conn = self.conn()?;
        let entry_type: Option<String> = conn
            .query_row(
                "SELECT entry_type FROM categories WHERE id = ?1 AND jar_id = ?2",
                params![category_id, jar_id],
                |row| row.get(0),
            )
            .optional()?;

        entry_type.map(|t| t.parse()).transpose()
    }

    async fn list_transactions(
        &self,
        jar_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<TransactionWithCategory>> {
        let mut sql = format!(
            "SELECT {}, c.id, c.jar_id, c.name, c.entry_type
             FROM transactions t LEFT JOIN categories c ON c.id = t.category_id
             WHERE t.jar_id = ?1",
            TRANSACTION_COLUMNS
        );
        let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(jar_id.to_string())];

        if let Some(kind) = filter.kind {
            args.push(Box::new(kind.as_str()));
            sql.push_str(&format!(" AND t.type = ?{}", args.len()));
        }
        if let Some(from) = filter.from {
            args.push(Box::new(to_text(from)));
            sql.push_str(&format!(" AND t.date >= ?{}", args.len()));
        }
        if let Some(to) = filter.to {
            args.push(Box::new(to_text(to)));
            sql.push_str(&format!(" AND t.date < ?{}", args.len()));
        }
        sql.push_str(" ORDER BY t.date DESC, t.created_at DESC");
        if let Some(limit) = filter.limit {
            args.push(Box::new(limit as i64));
            sql.push_str(&format!(" LIMIT ?{}", args.len()));
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok((TransactionColumns::from_row(row)?, CategoryColumns::from_row(row, 13)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(tx, category)| {
                Ok(TransactionWithCategory {
                    transaction: tx.into_transaction()?,
                    category: category.into_category()?,
                })
            })
            .collect()
    }

    async fn get_transaction(&self, id: &str) -> Result<Option<Transaction>> {
        let conn = self.conn()?;
        Self::load_transaction(&conn, id)
    }

    async fn create_transaction(&self, new: NewTransaction) -> Result<TransactionWithCategory> {
        let id = uuid::Uuid::new_v4().to_string();
        let metadata = new.metadata.as_ref().map(serde_json::to_string).transpose()?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO transactions (
                id, jar_id, created_by, type, amount_cents, currency, category_id, goal_id,
                date, note, transfer_counterparty_jar_id, metadata, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                id,
                new.jar_id,
                new.created_by,
                new.kind.as_str(),
                new.amount.cents(),
                new.currency,
                new.category_id,
                new.goal_id,
                to_text(new.date),
                new.note,
                new.transfer_counterparty_jar_id,
                metadata,
                to_text(Utc::now()),
            ],
        )
        .context("Failed to insert transaction")?;

        Self::load_with_category(&conn, &id)
    }

    async fn update_transaction(&self, id: &str, patch: &TransactionPatch) -> Result<Transaction> {
        let mut sets: Vec<&str> = Vec::new();
        let mut args: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(amount) = patch.amount {
            sets.push("amount_cents");
            args.push(Box::new(amount.cents()));
        }
        if let Some(note) = &patch.note {
            sets.push("note");
            args.push(Box::new(note.clone()));
        }
        if let Some(date) = patch.date {
            sets.push("date");
            args.push(Box::new(to_text(date)));
        }
        if let Some(kind) = patch.kind {
            sets.push("type");
            args.push(Box::new(kind.as_str()));
        }
        if let Some(metadata) = &patch.metadata {
            sets.push("metadata");
            args.push(Box::new(metadata.as_ref().map(serde_json::to_string).transpose()?));
        }
        if let Some(category_id) = &patch.category_id {
            sets.push("category_id");
            args.push(Box::new(category_id.clone()));
        }
        if let Some(goal_id) = &patch.goal_id {
            sets.push("goal_id");
            args.push(Box::new(goal_id.clone()));
        }
        if let Some(counterparty) = &patch.transfer_counterparty_jar_id {
            sets.push("transfer_counterparty_jar_id");
            args.push(Box::new(counterparty.clone()));
        }

        if sets.is_empty() {
            bail!("empty transaction patch");
        }

        let assignments: Vec<String> = sets
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ?{}", column, i + 1))
            .collect();
        args.push(Box::new(id.to_string()));
        let sql = format!(
            "UPDATE transactions SET {} WHERE id = ?{}",
            assignments.join(", "),
            args.len()
        );

        let conn = self.conn()?;
        let changed = conn
            .execute(&sql, params_from_iter(args.iter()))
            .with_context(|| format!("Failed to update transaction {}", id))?;
        if changed == 0 {
            bail!("transaction {} vanished before update", id);
        }

        Self::load_transaction(&conn, id)?
            .ok_or_else(|| anyhow!("transaction {} missing after update", id))
    }

    async fn delete_transaction(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM transactions WHERE id = ?1", [id])?;
        if deleted == 0 {
            bail!("transaction {} vanished before delete", id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionType;
    use chrono::TimeZone;
    use serde_json::json;

    struct Fixture {
        store: SqliteStore,
        jar: String,
        groceries: String,
        salary: String,
    }

    fn fixture() -> Fixture {
        let store = SqliteStore::open_in_memory().unwrap();
        let (jar, groceries, salary) = {
            let conn = store.conn().unwrap();
            let jar = create_jar(&conn, "Household", "u1").unwrap();
            let groceries =
                create_category(&conn, &jar, "Groceries", CategoryType::Expense).unwrap();
            let salary = create_category(&conn, &jar, "Salary", CategoryType::Income).unwrap();
            (jar, groceries, salary)
        };
        Fixture {
            store,
            jar,
            groceries,
            salary,
        }
    }

    fn expense(f: &Fixture, day: u32, cents: i64) -> NewTransaction {
        NewTransaction {
            jar_id: f.jar.clone(),
            created_by: "u1".into(),
            kind: TransactionType::Expense,
            amount: Money::from_cents(cents),
            currency: Some("CAD".into()),
            category_id: Some(f.groceries.clone()),
            goal_id: None,
            date: Utc.with_ymd_and_hms(2025, 3, day, 12, 0, 0).unwrap(),
            note: None,
            transfer_counterparty_jar_id: None,
            metadata: None,
        }
    }

    #[test]
    fn test_setup_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        setup_database(&conn).unwrap();
    }

    #[tokio::test]
    async fn test_create_jar_adds_owner() {
        let f = fixture();
        let member = f.store.find_membership(&f.jar, "u1").await.unwrap().unwrap();
        assert_eq!(member.role, MemberRole::Owner);
        assert!(f.store.find_membership(&f.jar, "u2").await.unwrap().is_none());

        add_member(&f.store.conn().unwrap(), &f.jar, "u2", MemberRole::Member).unwrap();
        let member = f.store.find_membership(&f.jar, "u2").await.unwrap().unwrap();
        assert_eq!(member.role, MemberRole::Member);
    }

    #[tokio::test]
    async fn test_child_jar_lookup_per_kind() {
        let f = fixture();
        let created = f.store.create_transaction(expense(&f, 1, 1250)).await.unwrap();

        let jar = f
            .store
            .find_child_jar(ChildKind::Transaction, &created.transaction.id)
            .await
            .unwrap();
        assert_eq!(jar.as_deref(), Some(f.jar.as_str()));

        let jar = f.store.find_child_jar(ChildKind::Category, &f.salary).await.unwrap();
        assert_eq!(jar.as_deref(), Some(f.jar.as_str()));

        for kind in ChildKind::ALL {
            assert!(f.store.find_child_jar(kind, "missing").await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_category_type_scoped_to_jar() {
        let f = fixture();
        let other = create_jar(&f.store.conn().unwrap(), "Other", "u9").unwrap();

        assert_eq!(
            f.store.find_category_type(&f.jar, &f.salary).await.unwrap(),
            Some(CategoryType::Income)
        );
        assert_eq!(f.store.find_category_type(&other, &f.salary).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_includes_category() {
        let f = fixture();
        let mut new = expense(&f, 2, 4599);
        new.metadata = Some(json!({"source": "manual"}));

        let created = f.store.create_transaction(new).await.unwrap();
        assert_eq!(created.transaction.amount, Money::from_cents(4599));
        assert_eq!(created.transaction.metadata, Some(json!({"source": "manual"})));
        assert_eq!(created.category.unwrap().name, "Groceries");
    }

    #[tokio::test]
    async fn test_list_orders_and_filters() {
        let f = fixture();
        for day in [3, 1, 2] {
            f.store.create_transaction(expense(&f, day, 100 * day as i64)).await.unwrap();
        }

        let all = f.store.list_transactions(&f.jar, &TransactionFilter::default()).await.unwrap();
        let days: Vec<i64> = all.iter().map(|t| t.transaction.amount.cents() / 100).collect();
        assert_eq!(days, vec![3, 2, 1]);

        let window = TransactionFilter {
            from: Some(Utc.with_ymd_and_hms(2025, 3, 2, 0, 0, 0).unwrap()),
            to: Some(Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let found = f.store.list_transactions(&f.jar, &window).await.unwrap();
        assert_eq!(found.len(), 1);

        let incomes = TransactionFilter {
            kind: Some(TransactionType::Income),
            ..Default::default()
        };
        assert!(f.store.list_transactions(&f.jar, &incomes).await.unwrap().is_empty());

        let limited = TransactionFilter {
            limit: Some(2),
            ..Default::default()
        };
        assert_eq!(f.store.list_transactions(&f.jar, &limited).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_touches_only_patched_columns() {
        let f = fixture();
        let mut new = expense(&f, 5, 1000);
        new.note = Some("before".into());
        let created = f.store.create_transaction(new).await.unwrap().transaction;

        let patch = TransactionPatch {
            note: Some(Some("after".into())),
            category_id: Some(None),
            ..Default::default()
        };
        let updated = f.store.update_transaction(&created.id, &patch).await.unwrap();

        assert_eq!(updated.note.as_deref(), Some("after"));
        assert_eq!(updated.category_id, None);
        assert_eq!(updated.amount, created.amount);
        assert_eq!(updated.date, created.date);
    }

    #[tokio::test]
    async fn test_update_with_unknown_category_fails() {
        let f = fixture();
        let created = f.store.create_transaction(expense(&f, 5, 1000)).await.unwrap().transaction;

        let patch = TransactionPatch {
            category_id: Some(Some("nope".into())),
            ..Default::default()
        };
        assert!(f.store.update_transaction(&created.id, &patch).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let f = fixture();
        let created = f.store.create_transaction(expense(&f, 6, 1000)).await.unwrap().transaction;

        f.store.delete_transaction(&created.id).await.unwrap();
        assert!(f.store.get_transaction(&created.id).await.unwrap().is_none());
        assert!(f.store.delete_transaction(&created.id).await.is_err());
    }
}
