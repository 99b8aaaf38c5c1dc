//! Storage collaborator boundary.
//!
//! The core holds no mutable shared state of its own; everything lives in
//! the store. Uniqueness of emails (case-insensitive) and of
//! (follower, followed) pairs is enforced atomically by the store itself.
//! The application-level checks layered above exist only to produce
//! friendlier error messages; the store constraint is the single source
//! of truth when two operations race for the same key.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Micropost, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage failure surfaced to the core.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("unique constraint violated on {0}")]
    Conflict(&'static str),

    /// A referenced record does not exist.
    #[error("referenced record does not exist")]
    MissingReference,

    /// Any other backend failure; propagated unchanged and never retried.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Column values for a user about to be persisted for the first time.
///
/// Both digests are computed before this record exists; raw secrets never
/// reach the store.
#[derive(Clone, Debug)]
pub struct NewUserRecord {
    pub name: String,
    pub email: String,
    pub password_digest: String,
    pub activation_digest: String,
}

/// Persistence operations the core needs from its storage collaborator.
///
/// All operations may block on I/O. Relationship insertion is idempotent;
/// user deletion cascades to the user's microposts and to relationships
/// in both roles, as explicit logic inside the implementation.
#[allow(async_fn_in_trait)]
pub trait Store: Send + Sync {
    async fn insert_user(&self, record: NewUserRecord) -> Result<User, StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn set_remember_digest(&self, id: Uuid, digest: Option<&str>)
        -> Result<(), StoreError>;
    async fn set_activated(&self, id: Uuid, at: DateTime<Utc>) -> Result<User, StoreError>;
    async fn set_reset_digest(
        &self,
        id: Uuid,
        digest: Option<&str>,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<User, StoreError>;
    async fn set_password_digest(&self, id: Uuid, digest: &str) -> Result<User, StoreError>;
    async fn delete_user(&self, id: Uuid) -> Result<(), StoreError>;

    async fn insert_relationship(&self, follower: Uuid, followed: Uuid)
        -> Result<(), StoreError>;
    async fn delete_relationship(&self, follower: Uuid, followed: Uuid)
        -> Result<(), StoreError>;
    async fn relationship_exists(&self, follower: Uuid, followed: Uuid)
        -> Result<bool, StoreError>;
    async fn following_of(&self, id: Uuid) -> Result<Vec<User>, StoreError>;
    async fn followers_of(&self, id: Uuid) -> Result<Vec<User>, StoreError>;
    async fn following_ids(&self, id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    async fn insert_micropost(&self, author: Uuid, content: &str)
        -> Result<Micropost, StoreError>;
    async fn count_microposts(&self) -> Result<u64, StoreError>;
    /// Posts by any of the given authors, most recent first.
    async fn posts_by_authors(&self, authors: &[Uuid]) -> Result<Vec<Micropost>, StoreError>;
}
