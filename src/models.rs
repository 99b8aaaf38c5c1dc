//! Core entities: users, follow relationships, and microposts.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;
use uuid::Uuid;

/// A registered account.
///
/// Digest fields hold one-way hashes and are never serialized. The email
/// is always stored lower-cased; `activation_digest` is generated exactly
/// once, before the first persistence.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_digest: String,
    pub activated: bool,
    pub activated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub activation_digest: String,
    #[serde(skip_serializing)]
    pub remember_digest: Option<String>,
    #[serde(skip_serializing)]
    pub reset_digest: Option<String>,
    pub reset_sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A directed follower -> followed edge in the social graph.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Relationship {
    pub follower_id: Uuid,
    pub followed_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A short post. Owned by an external collaborator; the feed reads it and
/// the cascade on user deletion removes it, nothing here mutates content.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Micropost {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Signup parameters.
///
/// The raw password and its confirmation live only for the duration of
/// `UserDirectory::create`; they are hashed before anything is persisted.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub password_confirmation: SecretString,
}
