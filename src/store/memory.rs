//! In-memory store for tests and lightweight contexts.
//!
//! Enforces the same invariants as the Postgres schema: case-insensitive
//! email uniqueness, unique follow edges, and explicit cascade on user
//! deletion. Insertion order is preserved so feed ordering ties resolve
//! deterministically.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{NewUserRecord, Store, StoreError};
use crate::models::{Micropost, User};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    relationships: Vec<(Uuid, Uuid)>,
    microposts: Vec<Micropost>,
}

/// In-process implementation of [`Store`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend(anyhow::anyhow!("store mutex poisoned")))
    }

    /// Insert an edge without the anti-self-follow guard.
    ///
    /// Exists so tests can simulate corrupted data; the graph itself never
    /// creates self-edges.
    pub fn insert_raw_relationship(&self, follower: Uuid, followed: Uuid) {
        if let Ok(mut inner) = self.inner.lock() {
            if !inner.relationships.contains(&(follower, followed)) {
                inner.relationships.push((follower, followed));
            }
        }
    }
}

impl Store for MemoryStore {
    async fn insert_user(&self, record: NewUserRecord) -> Result<User, StoreError> {
        let mut inner = self.lock()?;
        if inner
            .users
            .iter()
            .any(|user| user.email.eq_ignore_ascii_case(&record.email))
        {
            return Err(StoreError::Conflict("users.email"));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: record.name,
            email: record.email,
            password_digest: record.password_digest,
            activated: false,
            activated_at: None,
            activation_digest: record.activation_digest,
            remember_digest: None,
            reset_digest: None,
            reset_sent_at: None,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn set_remember_digest(
        &self,
        id: Uuid,
        digest: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let user = inner
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or(StoreError::MissingReference)?;
        user.remember_digest = digest.map(str::to_string);
        Ok(())
    }

    async fn set_activated(&self, id: Uuid, at: DateTime<Utc>) -> Result<User, StoreError> {
        let mut inner = self.lock()?;
        let user = inner
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or(StoreError::MissingReference)?;
        user.activated = true;
        user.activated_at = Some(at);
        Ok(user.clone())
    }

    async fn set_reset_digest(
        &self,
        id: Uuid,
        digest: Option<&str>,
        sent_at: Option<DateTime<Utc>>,
    ) -> Result<User, StoreError> {
        let mut inner = self.lock()?;
        let user = inner
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or(StoreError::MissingReference)?;
        user.reset_digest = digest.map(str::to_string);
        user.reset_sent_at = sent_at;
        Ok(user.clone())
    }

    async fn set_password_digest(&self, id: Uuid, digest: &str) -> Result<User, StoreError> {
        let mut inner = self.lock()?;
        let user = inner
            .users
            .iter_mut()
            .find(|user| user.id == id)
            .ok_or(StoreError::MissingReference)?;
        user.password_digest = digest.to_string();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if !inner.users.iter().any(|user| user.id == id) {
            return Err(StoreError::MissingReference);
        }
        inner.microposts.retain(|post| post.user_id != id);
        inner
            .relationships
            .retain(|(follower, followed)| *follower != id && *followed != id);
        inner.users.retain(|user| user.id != id);
        Ok(())
    }

    async fn insert_relationship(
        &self,
        follower: Uuid,
        followed: Uuid,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let both_exist = inner.users.iter().any(|user| user.id == follower)
            && inner.users.iter().any(|user| user.id == followed);
        if !both_exist {
            return Err(StoreError::MissingReference);
        }
        if !inner.relationships.contains(&(follower, followed)) {
            inner.relationships.push((follower, followed));
        }
        Ok(())
    }

    async fn delete_relationship(
        &self,
        follower: Uuid,
        followed: Uuid,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.relationships.retain(|edge| *edge != (follower, followed));
        Ok(())
    }

    async fn relationship_exists(
        &self,
        follower: Uuid,
        followed: Uuid,
    ) -> Result<bool, StoreError> {
        let inner = self.lock()?;
        Ok(inner.relationships.contains(&(follower, followed)))
    }

    async fn following_of(&self, id: Uuid) -> Result<Vec<User>, StoreError> {
        let inner = self.lock()?;
        let ids: Vec<Uuid> = inner
            .relationships
            .iter()
            .filter(|(follower, _)| *follower == id)
            .map(|(_, followed)| *followed)
            .collect();
        Ok(inner
            .users
            .iter()
            .filter(|user| ids.contains(&user.id))
            .cloned()
            .collect())
    }

    async fn followers_of(&self, id: Uuid) -> Result<Vec<User>, StoreError> {
        let inner = self.lock()?;
        let ids: Vec<Uuid> = inner
            .relationships
            .iter()
            .filter(|(_, followed)| *followed == id)
            .map(|(follower, _)| *follower)
            .collect();
        Ok(inner
            .users
            .iter()
            .filter(|user| ids.contains(&user.id))
            .cloned()
            .collect())
    }

    async fn following_ids(&self, id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .relationships
            .iter()
            .filter(|(follower, _)| *follower == id)
            .map(|(_, followed)| *followed)
            .collect())
    }

    async fn insert_micropost(
        &self,
        author: Uuid,
        content: &str,
    ) -> Result<Micropost, StoreError> {
        let mut inner = self.lock()?;
        if !inner.users.iter().any(|user| user.id == author) {
            return Err(StoreError::MissingReference);
        }
        let post = Micropost {
            id: Uuid::new_v4(),
            user_id: author,
            content: content.to_string(),
            created_at: Utc::now(),
        };
        inner.microposts.push(post.clone());
        Ok(post)
    }

    async fn count_microposts(&self) -> Result<u64, StoreError> {
        let inner = self.lock()?;
        Ok(inner.microposts.len() as u64)
    }

    async fn posts_by_authors(&self, authors: &[Uuid]) -> Result<Vec<Micropost>, StoreError> {
        let inner = self.lock()?;
        let authors: HashSet<Uuid> = authors.iter().copied().collect();
        let mut posts: Vec<Micropost> = inner
            .microposts
            .iter()
            .filter(|post| authors.contains(&post.user_id))
            .cloned()
            .collect();
        // Stable sort: equal timestamps keep insertion order.
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }
}
