//! Follow-graph guarantees and feed aggregation over the in-memory store.

use std::sync::Arc;

use secrecy::SecretString;
use seguito::{
    CoreConfig, FeedAggregator, HashCost, LogMailSender, MemoryStore, Micropost, NewUser,
    SocialGraph, Store, User, UserDirectory,
};

struct Fixture {
    store: Arc<MemoryStore>,
    directory: UserDirectory<MemoryStore>,
    graph: SocialGraph<MemoryStore>,
    feed: FeedAggregator<MemoryStore>,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = CoreConfig::new().with_hash_cost(HashCost::Fast);
        Self {
            directory: UserDirectory::new(store.clone(), Arc::new(LogMailSender), config),
            graph: SocialGraph::new(store.clone()),
            feed: FeedAggregator::new(store.clone()),
            store,
        }
    }

    async fn user(&self, name: &str, email: &str) -> User {
        self.directory
            .create(NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password: SecretString::from("foobar".to_string()),
                password_confirmation: SecretString::from("foobar".to_string()),
            })
            .await
            .unwrap()
    }

    async fn post(&self, author: &User, content: &str) -> Micropost {
        self.store.insert_micropost(author.id, content).await.unwrap()
    }
}

fn ids(posts: &[Micropost]) -> Vec<uuid::Uuid> {
    posts.iter().map(|post| post.id).collect()
}

#[tokio::test]
async fn follow_and_unfollow() {
    let fx = Fixture::new();
    let michael = fx.user("Michael Example", "michael@example.com").await;
    let archer = fx.user("Sterling Archer", "archer@example.com").await;

    assert!(!fx.graph.is_following(&michael, &archer).await.unwrap());

    fx.graph.follow(&michael, &archer).await.unwrap();
    assert!(fx.graph.is_following(&michael, &archer).await.unwrap());
    let follower_ids: Vec<_> = fx
        .graph
        .followers_of(&archer)
        .await
        .unwrap()
        .iter()
        .map(|user| user.id)
        .collect();
    assert!(follower_ids.contains(&michael.id));

    fx.graph.unfollow(&michael, &archer).await.unwrap();
    assert!(!fx.graph.is_following(&michael, &archer).await.unwrap());
}

#[tokio::test]
async fn self_follow_is_a_silent_noop() {
    let fx = Fixture::new();
    let michael = fx.user("Michael Example", "michael@example.com").await;

    fx.graph.follow(&michael, &michael).await.unwrap();
    assert!(!fx.graph.is_following(&michael, &michael).await.unwrap());
    assert!(fx.graph.following_of(&michael).await.unwrap().is_empty());
}

#[tokio::test]
async fn repeated_follow_does_not_duplicate_the_edge() {
    let fx = Fixture::new();
    let michael = fx.user("Michael Example", "michael@example.com").await;
    let archer = fx.user("Sterling Archer", "archer@example.com").await;

    fx.graph.follow(&michael, &archer).await.unwrap();
    fx.graph.follow(&michael, &archer).await.unwrap();

    assert_eq!(fx.graph.following_of(&michael).await.unwrap().len(), 1);
    assert_eq!(fx.graph.followers_of(&archer).await.unwrap().len(), 1);
}

#[tokio::test]
async fn unfollow_of_absent_edge_is_a_noop() {
    let fx = Fixture::new();
    let michael = fx.user("Michael Example", "michael@example.com").await;
    let archer = fx.user("Sterling Archer", "archer@example.com").await;

    fx.graph.unfollow(&michael, &archer).await.unwrap();
    assert!(!fx.graph.is_following(&michael, &archer).await.unwrap());
}

#[tokio::test]
async fn feed_has_the_right_posts() {
    let fx = Fixture::new();
    let michael = fx.user("Michael Example", "michael@example.com").await;
    let archer = fx.user("Sterling Archer", "archer@example.com").await;
    let lana = fx.user("Lana Kane", "lana@example.com").await;

    // Michael follows Lana but not Archer.
    fx.graph.follow(&michael, &lana).await.unwrap();

    let own = fx.post(&michael, "my own post").await;
    let followed_one = fx.post(&lana, "from lana").await;
    let followed_two = fx.post(&lana, "more from lana").await;
    let unfollowed = fx.post(&archer, "from archer").await;

    let feed = fx.feed.feed_for(&michael).await.unwrap();
    let feed_ids = ids(&feed);

    assert!(feed_ids.contains(&own.id));
    assert!(feed_ids.contains(&followed_one.id));
    assert!(feed_ids.contains(&followed_two.id));
    assert!(!feed_ids.contains(&unfollowed.id));
    assert_eq!(feed.len(), 3);
}

#[tokio::test]
async fn feed_is_ordered_most_recent_first() {
    let fx = Fixture::new();
    let michael = fx.user("Michael Example", "michael@example.com").await;
    let lana = fx.user("Lana Kane", "lana@example.com").await;
    fx.graph.follow(&michael, &lana).await.unwrap();

    for n in 0..5 {
        let author = if n % 2 == 0 { &michael } else { &lana };
        fx.post(author, &format!("post {n}")).await;
    }

    let feed = fx.feed.feed_for(&michael).await.unwrap();
    assert_eq!(feed.len(), 5);
    assert!(feed
        .windows(2)
        .all(|pair| pair[0].created_at >= pair[1].created_at));
}

#[tokio::test]
async fn feed_has_no_duplicates() {
    let fx = Fixture::new();
    let michael = fx.user("Michael Example", "michael@example.com").await;
    let lana = fx.user("Lana Kane", "lana@example.com").await;
    fx.graph.follow(&michael, &lana).await.unwrap();

    fx.post(&michael, "one").await;
    fx.post(&lana, "two").await;

    let feed = fx.feed.feed_for(&michael).await.unwrap();
    let mut feed_ids = ids(&feed);
    feed_ids.sort();
    feed_ids.dedup();
    assert_eq!(feed_ids.len(), feed.len());
}

#[tokio::test]
async fn feed_stays_distinct_under_a_corrupt_self_edge() {
    let fx = Fixture::new();
    let michael = fx.user("Michael Example", "michael@example.com").await;

    let own = fx.post(&michael, "my own post").await;
    // Simulate corruption: the graph never creates self-edges, but the
    // feed must stay distinct even if one exists in storage.
    fx.store.insert_raw_relationship(michael.id, michael.id);

    let feed = fx.feed.feed_for(&michael).await.unwrap();
    assert_eq!(ids(&feed), vec![own.id]);
}
