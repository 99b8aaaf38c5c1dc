//! Postgres-backed store.
//!
//! Email and follow-edge uniqueness live in the schema (`migrations/`);
//! unique violations map to [`StoreError::Conflict`] and foreign-key
//! violations to [`StoreError::MissingReference`]. User deletion cascades
//! inside a single transaction so microposts and both relationship roles
//! go with the user.

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{NewUserRecord, Store, StoreError};
use crate::models::{Micropost, User};

const USER_COLUMNS: &str = "id, name, email, password_digest, activated, activated_at, \
     activation_digest, remember_digest, reset_digest, reset_sent_at, created_at";

/// [`Store`] implementation over a Postgres pool.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run migrations")?;
        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23503"),
        _ => false,
    }
}

impl Store for PgStore {
    async fn insert_user(&self, record: NewUserRecord) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (name, email, password_digest, activation_digest)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = %query
        );
        let row = sqlx::query_as::<_, User>(&query)
            .bind(&record.name)
            .bind(&record.email)
            .bind(&record.password_digest)
            .bind(&record.activation_digest)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(user) => Ok(user),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict("users.email")),
            Err(err) => Err(anyhow::Error::new(err)
                .context("failed to insert user")
                .into()),
        }
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = %query
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to find user")?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1) LIMIT 1"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = %query
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to find user by email")?;
        Ok(user)
    }

    async fn set_remember_digest(
        &self,
        id: Uuid,
        digest: Option<&str>,
    ) -> Result<(), StoreError> {
        let query = "UPDATE users SET remember_digest = $2 WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(digest)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to update remember digest")?;
        if result.rows_affected() == 0 {
            return Err(StoreError::MissingReference);
        }
        Ok(())
    }

    async fn set_activated(&self, id: Uuid, at: DateTime<Utc>) -> Result<User, StoreError> {
        let query = format!(
            "UPDATE users SET activated = TRUE, activated_at = $2
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = %query
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(at)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to activate user")?;
        user.ok_or(StoreError::MissingReference)
    }

    async fn set_reset_digest(
        &self,
        id: Uuid,
        digest: Option<&str>,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<User, StoreError> {
        let query = format!(
            "UPDATE users SET reset_digest = $2, reset_sent_at = $3
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = %query
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(digest)
            .bind(sent_at)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to update reset digest")?;
        user.ok_or(StoreError::MissingReference)
    }

    async fn set_password_digest(&self, id: Uuid, digest: &str) -> Result<User, StoreError> {
        let query = format!(
            "UPDATE users SET password_digest = $2
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = %query
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(digest)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to update password digest")?;
        user.ok_or(StoreError::MissingReference)
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        // Explicit cascade: microposts and both relationship roles go in
        // the same transaction as the user row.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin user delete transaction")?;

        let query = "DELETE FROM microposts WHERE user_id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to delete user microposts")?;

        let query = "DELETE FROM relationships WHERE follower_id = $1 OR followed_id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(id)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to delete user relationships")?;

        let query = "DELETE FROM users WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .execute(&mut *tx)
            .instrument(span)
            .await
            .context("failed to delete user")?;

        if result.rows_affected() == 0 {
            let _ = tx.rollback().await;
            return Err(StoreError::MissingReference);
        }

        tx.commit()
            .await
            .context("failed to commit user delete transaction")?;
        Ok(())
    }

    async fn insert_relationship(
        &self,
        follower: Uuid,
        followed: Uuid,
    ) -> Result<(), StoreError> {
        // Idempotent by design; the primary key backstops duplicates.
        let query = "INSERT INTO relationships (follower_id, followed_id)
             VALUES ($1, $2)
             ON CONFLICT DO NOTHING";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(follower)
            .bind(followed)
            .execute(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_foreign_key_violation(&err) => Err(StoreError::MissingReference),
            Err(err) => Err(anyhow::Error::new(err)
                .context("failed to insert relationship")
                .into()),
        }
    }

    async fn delete_relationship(
        &self,
        follower: Uuid,
        followed: Uuid,
    ) -> Result<(), StoreError> {
        // No-op when the edge is absent.
        let query = "DELETE FROM relationships WHERE follower_id = $1 AND followed_id = $2";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(follower)
            .bind(followed)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete relationship")?;
        Ok(())
    }

    async fn relationship_exists(
        &self,
        follower: Uuid,
        followed: Uuid,
    ) -> Result<bool, StoreError> {
        let query =
            "SELECT 1 FROM relationships WHERE follower_id = $1 AND followed_id = $2 LIMIT 1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(follower)
            .bind(followed)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to check relationship")?;
        Ok(row.is_some())
    }

    async fn following_of(&self, id: Uuid) -> Result<Vec<User>, StoreError> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users
             JOIN relationships ON relationships.followed_id = users.id
             WHERE relationships.follower_id = $1
             ORDER BY relationships.created_at"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = %query
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to load following")?;
        Ok(users)
    }

    async fn followers_of(&self, id: Uuid) -> Result<Vec<User>, StoreError> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users
             JOIN relationships ON relationships.follower_id = users.id
             WHERE relationships.followed_id = $1
             ORDER BY relationships.created_at"
        );
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = %query
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to load followers")?;
        Ok(users)
    }

    async fn following_ids(&self, id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let query = "SELECT followed_id FROM relationships WHERE follower_id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let ids = sqlx::query_scalar::<_, Uuid>(query)
            .bind(id)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to load following ids")?;
        Ok(ids)
    }

    async fn insert_micropost(
        &self,
        author: Uuid,
        content: &str,
    ) -> Result<Micropost, StoreError> {
        let query = "INSERT INTO microposts (user_id, content)
             VALUES ($1, $2)
             RETURNING id, user_id, content, created_at";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let result = sqlx::query_as::<_, Micropost>(query)
            .bind(author)
            .bind(content)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match result {
            Ok(post) => Ok(post),
            Err(err) if is_foreign_key_violation(&err) => Err(StoreError::MissingReference),
            Err(err) => Err(anyhow::Error::new(err)
                .context("failed to insert micropost")
                .into()),
        }
    }

    async fn count_microposts(&self) -> Result<u64, StoreError> {
        let query = "SELECT COUNT(*) FROM microposts";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .fetch_one(&self.pool)
            .instrument(span)
            .await
            .context("failed to count microposts")?;
        let count: i64 = row.get(0);
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn posts_by_authors(&self, authors: &[Uuid]) -> Result<Vec<Micropost>, StoreError> {
        // Single round trip for the whole author set; the id tie-break
        // keeps the order deterministic for equal timestamps.
        let query = "SELECT id, user_id, content, created_at FROM microposts
             WHERE user_id = ANY($1)
             ORDER BY created_at DESC, id";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let posts = sqlx::query_as::<_, Micropost>(query)
            .bind(authors)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to load feed posts")?;
        Ok(posts)
    }
}
