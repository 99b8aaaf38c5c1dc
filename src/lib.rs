//! # Seguito (identity, session tokens, follow graph, and feed core)
//!
//! `seguito` is the core behind a small social service: secure credential
//! storage, opaque single-use and session tokens, a directed follow
//! graph, and the per-user feed query. HTTP routing, rendering, and mail
//! transport live elsewhere and talk to this crate through its traits.
//!
//! ## Identity
//!
//! - **Email normalization:** emails are trimmed and lower-cased before
//!   validation and storage; uniqueness is case-insensitive and enforced
//!   by the storage collaborator's constraint, not only by the pre-check.
//! - **Digests only:** passwords and every token (remember, activation,
//!   reset) are stored exclusively as salted Argon2id digests. Raw tokens
//!   exist only inside the operation that mints them and are handed to
//!   the caller (cookie, email link) once.
//! - **Activation:** the activation digest is generated exactly once, at
//!   creation time, before the first persistence.
//!
//! ## Social graph & feed
//!
//! Follow edges are directed, unique, and never self-referential; both
//! invariants are enforced at the point of creation with the store's
//! constraints as the concurrent backstop. The feed is the deduplicated
//! union of a user's own posts and posts by everyone they follow,
//! most recent first.
//!
//! ## Storage & mail collaborators
//!
//! [`store::Store`] abstracts persistence; [`store::PgStore`] implements
//! it over Postgres and [`store::MemoryStore`] in process. Outbound mail
//! goes through [`mail::MailSender`], fire-and-forget.

pub mod config;
pub mod credentials;
pub mod directory;
pub mod error;
pub mod feed;
pub mod graph;
pub mod mail;
pub mod models;
pub mod store;
pub mod token;

pub use config::CoreConfig;
pub use credentials::{CredentialStore, HashCost};
pub use directory::{TokenKind, UserDirectory};
pub use error::{Error, Field, ValidationError};
pub use feed::FeedAggregator;
pub use graph::SocialGraph;
pub use mail::{LogMailSender, MailSender};
pub use models::{Micropost, NewUser, Relationship, User};
pub use store::{MemoryStore, PgStore, Store, StoreError};
pub use token::TokenIssuer;
