// Jar Ledger - Core Library
// Guards, request wrapper and persistence for the shared-jar finance API

pub mod api;
pub mod config;
pub mod error;
pub mod guards;
pub mod json_safe;
pub mod ledger;
pub mod model;
pub mod routes;
pub mod session;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use api::{wrap, Reply};
pub use config::Config;
pub use error::{
    bad_request, forbidden, unauthorized, ApiError, ApiResult, DenialKind, HttpError,
};
pub use guards::{authorize_child, authorize_in_jar, require_membership, ChildKind};
pub use json_safe::{to_json_value, IntoShape, Shape, ToJson};
pub use ledger::{recent_transactions, TxItem};
pub use model::{
    Category, CategoryType, MemberRole, Membership, Money, NewTransaction, Transaction,
    TransactionFilter, TransactionPatch, TransactionType, TransactionWithCategory,
};
pub use routes::{router, AppState};
pub use session::{
    AuthError, AuthUser, Identity, IdentityProvider, RequestContext, SessionResolver,
};
pub use store::{
    add_member, create_category, create_jar, issue_session, setup_database, AccessStore,
    LedgerStore, SqliteIdentityProvider, SqliteStore,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
