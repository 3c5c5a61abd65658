// Authorization guards
//
// Membership in a jar is the only authorization predicate. Child rows are
// authorized through the jar they belong to, never through their own
// fields.

use crate::error::{forbidden, ApiError, DenialKind, HttpError};
use crate::session::Identity;
use crate::store::AccessStore;
use tracing::debug;

// ============================================================================
// CHILD KINDS
// ============================================================================

/// Every row type that hangs off exactly one jar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildKind {
    Transaction,
    Category,
    Budget,
    Goal,
    Invite,
    RecurringTransaction,
}

impl ChildKind {
    pub const ALL: [ChildKind; 6] = [
        ChildKind::Transaction,
        ChildKind::Category,
        ChildKind::Budget,
        ChildKind::Goal,
        ChildKind::Invite,
        ChildKind::RecurringTransaction,
    ];

    /// Table holding rows of this kind. New kinds must be added here or the
    /// crate does not build.
    pub fn table(&self) -> &'static str {
        match self {
            ChildKind::Transaction => "transactions",
            ChildKind::Category => "categories",
            ChildKind::Budget => "budgets",
            ChildKind::Goal => "goals",
            ChildKind::Invite => "invites",
            ChildKind::RecurringTransaction => "recurring_transactions",
        }
    }
}

// ============================================================================
// GUARDS
// ============================================================================

/// Fails with 403 unless `identity` is a member of `jar_id`. The stored
/// role is not consulted.
pub async fn require_membership<S>(
    store: &S,
    jar_id: &str,
    identity: &Identity,
) -> Result<(), ApiError>
where
    S: AccessStore + ?Sized,
{
    match store.find_membership(jar_id, identity.as_str()).await? {
        Some(_) => Ok(()),
        None => {
            debug!(target: "jar_ledger::guards", jar_id, user_id = %identity, "membership denied");
            Err(HttpError::new(DenialKind::Forbidden, "Forbidden").into())
        }
    }
}

/// Resolve the jar owning a child row and require membership in it.
///
/// Existence is checked first: unknown ids are always 404 whoever asks,
/// existing rows in a foreign jar are 403.
pub async fn authorize_child<S>(
    store: &S,
    kind: ChildKind,
    child_id: &str,
    identity: &Identity,
) -> Result<String, ApiError>
where
    S: AccessStore + ?Sized,
{
    let jar_id = store
        .find_child_jar(kind, child_id)
        .await?
        .ok_or_else(|| HttpError::new(DenialKind::NotFound, "Not found"))?;

    require_membership(store, &jar_id, identity).await?;
    Ok(jar_id)
}

/// `authorize_child` plus a check that the child lives in the jar named
/// by the route.
pub async fn authorize_in_jar<S>(
    store: &S,
    kind: ChildKind,
    jar_id: &str,
    child_id: &str,
    identity: &Identity,
) -> Result<(), ApiError>
where
    S: AccessStore + ?Sized,
{
    let owner = authorize_child(store, kind, child_id, identity).await?;
    if owner != jar_id {
        debug!(
            target: "jar_ledger::guards",
            kind = kind.table(),
            child_id,
            route_jar = jar_id,
            owner_jar = %owner,
            "cross-jar access denied"
        );
        return Err(forbidden(Some("Forbidden (cross-jar)")).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MemberRole, Membership};
    use anyhow::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryAccess {
        members: Vec<(String, String, MemberRole)>,
        children: HashMap<(ChildKind, String), String>,
        lookups: Mutex<Vec<String>>,
    }

    impl MemoryAccess {
        fn member(mut self, jar: &str, user: &str, role: MemberRole) -> Self {
            self.members.push((jar.into(), user.into(), role));
            self
        }

        fn child(mut self, kind: ChildKind, id: &str, jar: &str) -> Self {
            self.children.insert((kind, id.into()), jar.into());
            self
        }
    }

    #[async_trait]
    impl AccessStore for MemoryAccess {
        async fn find_membership(&self, jar_id: &str, user_id: &str) -> Result<Option<Membership>> {
            self.lookups.lock().unwrap().push(format!("member:{}:{}", jar_id, user_id));
            Ok(self
                .members
                .iter()
                .find(|(j, u, _)| j == jar_id && u == user_id)
                .map(|(j, u, role)| Membership {
                    jar_id: j.clone(),
                    user_id: u.clone(),
                    role: *role,
                }))
        }

        async fn find_child_jar(&self, kind: ChildKind, id: &str) -> Result<Option<String>> {
            self.lookups.lock().unwrap().push(format!("{}:{}", kind.table(), id));
            Ok(self.children.get(&(kind, id.to_string())).cloned())
        }
    }

    fn status_of(err: ApiError) -> u16 {
        match err {
            ApiError::Http(e) => e.status().as_u16(),
            ApiError::Internal(e) => panic!("unexpected internal error: {e}"),
        }
    }

    fn u1() -> Identity {
        Identity::new("u1")
    }

    #[test]
    fn test_every_kind_has_a_table() {
        let tables: std::collections::HashSet<_> =
            ChildKind::ALL.iter().map(|k| k.table()).collect();
        assert_eq!(tables.len(), ChildKind::ALL.len());
    }

    #[tokio::test]
    async fn test_membership_ok_for_any_role() {
        let store = MemoryAccess::default()
            .member("jar1", "u1", MemberRole::Member)
            .member("jar2", "u1", MemberRole::Owner);

        assert!(require_membership(&store, "jar1", &u1()).await.is_ok());
        assert!(require_membership(&store, "jar2", &u1()).await.is_ok());
    }

    #[tokio::test]
    async fn test_membership_missing_is_403() {
        let store = MemoryAccess::default().member("jar1", "u2", MemberRole::Owner);

        let err = require_membership(&store, "jar1", &u1()).await.unwrap_err();
        match err {
            ApiError::Http(e) => {
                assert_eq!(e.status().as_u16(), 403);
                assert_eq!(e.message, "Forbidden");
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_child_returns_owning_jar() {
        let store = MemoryAccess::default()
            .member("jar1", "u1", MemberRole::Owner)
            .child(ChildKind::Transaction, "tx1", "jar1");

        let jar = authorize_child(&store, ChildKind::Transaction, "tx1", &u1()).await.unwrap();
        assert_eq!(jar, "jar1");
        assert_eq!(
            *store.lookups.lock().unwrap(),
            vec!["transactions:tx1".to_string(), "member:jar1:u1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_unknown_child_is_404_for_everyone() {
        let store = MemoryAccess::default().member("jar1", "u1", MemberRole::Owner);

        for user in ["u1", "stranger"] {
            let err = authorize_child(&store, ChildKind::Goal, "missing", &Identity::new(user))
                .await
                .unwrap_err();
            assert_eq!(status_of(err), 404);
        }
        // membership is never consulted for a missing child
        assert!(store.lookups.lock().unwrap().iter().all(|l| !l.starts_with("member:")));
    }

    #[tokio::test]
    async fn test_foreign_child_is_403() {
        let store = MemoryAccess::default()
            .member("jar1", "u1", MemberRole::Owner)
            .child(ChildKind::Transaction, "tx2", "jar2");

        let err = authorize_child(&store, ChildKind::Transaction, "tx2", &u1()).await.unwrap_err();
        assert_eq!(status_of(err), 403);
    }

    #[tokio::test]
    async fn test_kinds_are_dispatched_to_their_own_lookup() {
        let mut store = MemoryAccess::default().member("jar9", "u1", MemberRole::Member);
        for kind in ChildKind::ALL {
            store = store.child(kind, "c1", "jar9");
        }

        for kind in ChildKind::ALL {
            assert_eq!(authorize_child(&store, kind, "c1", &u1()).await.unwrap(), "jar9");
        }
        // same id under another kind does not exist
        let store = MemoryAccess::default()
            .member("jar9", "u1", MemberRole::Member)
            .child(ChildKind::Category, "cat1", "jar9");
        let err = authorize_child(&store, ChildKind::Budget, "cat1", &u1()).await.unwrap_err();
        assert_eq!(status_of(err), 404);
    }

    #[tokio::test]
    async fn test_cross_jar_is_forbidden() {
        let store = MemoryAccess::default()
            .member("jar_A", "u1", MemberRole::Owner)
            .member("jar_B", "u1", MemberRole::Member)
            .child(ChildKind::Transaction, "tx_1", "jar_B");

        let err = authorize_in_jar(&store, ChildKind::Transaction, "jar_A", "tx_1", &u1())
            .await
            .unwrap_err();
        match err {
            ApiError::Http(e) => {
                assert_eq!(e.status().as_u16(), 403);
                assert_eq!(e.message, "Forbidden (cross-jar)");
            }
            other => panic!("expected HttpError, got {other:?}"),
        }

        assert!(authorize_in_jar(&store, ChildKind::Transaction, "jar_B", "tx_1", &u1())
            .await
            .is_ok());
    }
}
