//! Feed aggregation.
//!
//! A post qualifies for a viewer's feed when its author is the viewer or
//! someone the viewer follows. The author set is resolved first and the
//! posts fetched in one query, never as two concatenated round trips, so
//! deduplication happens by post identity. A corrupt self-edge in the
//! graph therefore cannot double-count anything.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Error;
use crate::models::{Micropost, User};
use crate::store::Store;

/// Read-only feed queries over the follow graph and the post store.
pub struct FeedAggregator<S> {
    store: Arc<S>,
}

impl<S: Store> FeedAggregator<S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Posts by the viewer and everyone they follow, deduplicated and
    /// ordered most recent first.
    pub async fn feed_for(&self, user: &User) -> Result<Vec<Micropost>, Error> {
        let mut authors = self.store.following_ids(user.id).await?;
        authors.push(user.id);

        let posts = self.store.posts_by_authors(&authors).await?;

        // Dedup by post identity, not by join path.
        let mut seen = HashSet::with_capacity(posts.len());
        Ok(posts
            .into_iter()
            .filter(|post| seen.insert(post.id))
            .collect())
    }
}
