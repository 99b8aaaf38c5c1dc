//! Directed social-follow graph.
//!
//! Edges point follower -> followed. Self-edges are refused here, before
//! the store is touched, and duplicate edges are no-ops; the store's
//! uniqueness constraint backstops both under concurrency.

use std::sync::Arc;

use crate::error::Error;
use crate::models::User;
use crate::store::Store;

/// Owns follow/unfollow operations and follow-set queries. Depends on the
/// user directory only for identity references, never behavior.
pub struct SocialGraph<S> {
    store: Arc<S>,
}

impl<S: Store> SocialGraph<S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create the follower -> followed edge.
    ///
    /// Self-follow attempts are silent no-ops, as are repeated follows of
    /// the same user.
    pub async fn follow(&self, follower: &User, followed: &User) -> Result<(), Error> {
        if follower.id == followed.id {
            return Ok(());
        }
        self.store
            .insert_relationship(follower.id, followed.id)
            .await?;
        Ok(())
    }

    /// Remove the edge if present; no-op otherwise.
    pub async fn unfollow(&self, follower: &User, followed: &User) -> Result<(), Error> {
        self.store
            .delete_relationship(follower.id, followed.id)
            .await?;
        Ok(())
    }

    pub async fn is_following(&self, follower: &User, followed: &User) -> Result<bool, Error> {
        Ok(self
            .store
            .relationship_exists(follower.id, followed.id)
            .await?)
    }

    /// Users this user follows.
    pub async fn following_of(&self, user: &User) -> Result<Vec<User>, Error> {
        Ok(self.store.following_of(user.id).await?)
    }

    /// Users following this user.
    pub async fn followers_of(&self, user: &User) -> Result<Vec<User>, Error> {
        Ok(self.store.followers_of(user.id).await?)
    }
}
