//! User directory: creation, validation, token lifecycle, and deletion.
//!
//! Flow overview for `create`:
//! 1) Normalize the email and validate every constraint, collecting all
//!    violations instead of stopping at the first.
//! 2) Derive the password digest and the activation token digest before
//!    anything is persisted; raw secrets never reach the store.
//! 3) Persist through the storage collaborator. A unique-violation race
//!    re-surfaces as the same validation error the pre-check produces.
//! 4) Trigger the mail collaborator with the raw activation token;
//!    delivery failures are logged and never interrupt the flow.

use std::sync::Arc;

use chrono::{Duration, Utc};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use tracing::error;
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::credentials::CredentialStore;
use crate::error::{Error, Field, ValidationError};
use crate::mail::MailSender;
use crate::models::{NewUser, User};
use crate::store::{NewUserRecord, Store, StoreError};
use crate::token::TokenIssuer;

/// Maximum display-name length.
pub const NAME_MAX_LEN: usize = 50;
/// Maximum email length.
pub const EMAIL_MAX_LEN: usize = 255;
/// Minimum password length.
pub const PASSWORD_MIN_LEN: usize = 6;

// Conservative RFC-lite pattern: word-ish local part, letter/digit/hyphen
// domain labels, alphabetic TLD.
const EMAIL_PATTERN: &str = r"(?i)^[\w+\-.]+@[a-z\d\-]+(\.[a-z\d\-]+)*\.[a-z]+$";

/// Which stored digest to check a candidate secret against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Password,
    Remember,
    Activation,
    Reset,
}

/// Normalize an email for lookup and uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn valid_email(email: &str) -> bool {
    Regex::new(EMAIL_PATTERN).is_ok_and(|regex| regex.is_match(email))
}

/// Owns the user lifecycle. Depends on [`CredentialStore`] and
/// [`TokenIssuer`] for every secret-bearing operation and on the mail
/// collaborator for outbound messages.
pub struct UserDirectory<S> {
    store: Arc<S>,
    mailer: Arc<dyn MailSender>,
    credentials: CredentialStore,
    tokens: TokenIssuer,
    config: CoreConfig,
}

impl<S: Store> UserDirectory<S> {
    #[must_use]
    pub fn new(store: Arc<S>, mailer: Arc<dyn MailSender>, config: CoreConfig) -> Self {
        let credentials = CredentialStore::new(config.hash_cost());
        let tokens = TokenIssuer::new(credentials.clone());
        Self {
            store,
            mailer,
            credentials,
            tokens,
            config,
        }
    }

    /// Create a user from signup parameters.
    ///
    /// The stored email is the lower-cased input. The activation token is
    /// generated exactly once, here, and handed to the mail collaborator;
    /// only its digest is persisted.
    pub async fn create(&self, params: NewUser) -> Result<User, Error> {
        let email = normalize_email(&params.email);
        let mut errors = validate_signup(
            &params.name,
            &email,
            &params.password,
            &params.password_confirmation,
        );

        // Pre-check for a friendlier message; the store's unique
        // constraint is the actual guard against races.
        if !errors.contains(Field::Email)
            && self.store.find_user_by_email(&email).await?.is_some()
        {
            errors.add(Field::Email, "has already been taken");
        }
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let password_digest = self.credentials.hash(params.password.expose_secret())?;
        let activation_token = TokenIssuer::new_token()?;
        let activation_digest = self.tokens.digest_for(&activation_token)?;

        let record = NewUserRecord {
            name: params.name,
            email,
            password_digest,
            activation_digest,
        };
        let user = match self.store.insert_user(record).await {
            Ok(user) => user,
            Err(StoreError::Conflict(_)) => {
                let mut errors = ValidationError::new();
                errors.add(Field::Email, "has already been taken");
                return Err(errors.into());
            }
            Err(err) => return Err(err.into()),
        };

        if let Err(err) = self.mailer.send_activation_email(&user, &activation_token) {
            error!("failed to deliver activation email: {err}");
        }

        Ok(user)
    }

    /// Look up a user by id.
    pub async fn find(&self, id: Uuid) -> Result<User, Error> {
        self.store.find_user(id).await?.ok_or(Error::NotFound)
    }

    /// Look up a user by email, case-insensitively.
    pub async fn find_by_email(&self, email: &str) -> Result<User, Error> {
        let email = normalize_email(email);
        self.store
            .find_user_by_email(&email)
            .await?
            .ok_or(Error::NotFound)
    }

    /// Check a candidate secret against the named stored digest.
    ///
    /// Returns `false` when no digest is set; a missing digest and a
    /// mismatched one are indistinguishable to the caller.
    #[must_use]
    pub fn authenticate(&self, user: &User, kind: TokenKind, candidate: &str) -> bool {
        let digest = match kind {
            TokenKind::Password => Some(user.password_digest.as_str()),
            TokenKind::Remember => user.remember_digest.as_deref(),
            TokenKind::Activation => Some(user.activation_digest.as_str()),
            TokenKind::Reset => user.reset_digest.as_deref(),
        };
        self.credentials.verify(digest, candidate)
    }

    /// Issue a new remember token for a persistent session.
    ///
    /// The digest is persisted; the raw token is returned for the caller
    /// to hand to the transport/session collaborator.
    pub async fn remember(&self, user: &User) -> Result<String, Error> {
        let (token, _digest) = self.issue_remember(user).await?;
        Ok(token)
    }

    /// Return the user's session token digest, issuing one lazily.
    ///
    /// After this call a session token is guaranteed to exist.
    pub async fn session_token(&self, user: &User) -> Result<String, Error> {
        if let Some(digest) = &user.remember_digest {
            return Ok(digest.clone());
        }
        let (_token, digest) = self.issue_remember(user).await?;
        Ok(digest)
    }

    /// Drop the persistent session at logout.
    pub async fn forget(&self, user: &User) -> Result<(), Error> {
        self.store.set_remember_digest(user.id, None).await?;
        Ok(())
    }

    /// Mark the account email-confirmed. Idempotent.
    pub async fn activate(&self, user: &User) -> Result<User, Error> {
        if user.activated {
            return Ok(user.clone());
        }
        Ok(self.store.set_activated(user.id, Utc::now()).await?)
    }

    /// Issue a password-reset token, persist its digest and issuance time,
    /// and trigger the reset email. Returns the raw token.
    pub async fn create_reset_digest(&self, user: &User) -> Result<String, Error> {
        let token = TokenIssuer::new_token()?;
        let digest = self.tokens.digest_for(&token)?;
        let user = self
            .store
            .set_reset_digest(user.id, Some(&digest), Some(Utc::now()))
            .await?;

        if let Err(err) = self.mailer.send_password_reset_email(&user, &token) {
            error!("failed to deliver password reset email: {err}");
        }

        Ok(token)
    }

    /// Whether the user's reset token fell outside the validity window.
    /// A user without an issued reset counts as expired.
    #[must_use]
    pub fn reset_expired(&self, user: &User) -> bool {
        let ttl = Duration::seconds(self.config.reset_token_ttl_seconds());
        user.reset_sent_at
            .is_none_or(|sent_at| sent_at < Utc::now() - ttl)
    }

    /// Store a new password and consume the reset digest.
    pub async fn reset_password(
        &self,
        user: &User,
        password: SecretString,
        password_confirmation: SecretString,
    ) -> Result<User, Error> {
        let mut errors = ValidationError::new();
        validate_password(&mut errors, &password, &password_confirmation);
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let digest = self.credentials.hash(password.expose_secret())?;
        self.store.set_password_digest(user.id, &digest).await?;
        // Reset tokens are single use.
        let user = self.store.set_reset_digest(user.id, None, None).await?;
        Ok(user)
    }

    /// Delete the user, cascading to their microposts and to
    /// relationships in both roles.
    pub async fn destroy(&self, user: &User) -> Result<(), Error> {
        self.store.delete_user(user.id).await?;
        Ok(())
    }

    async fn issue_remember(&self, user: &User) -> Result<(String, String), Error> {
        let token = TokenIssuer::new_token()?;
        let digest = self.tokens.digest_for(&token)?;
        self.store
            .set_remember_digest(user.id, Some(&digest))
            .await?;
        Ok((token, digest))
    }
}

fn validate_signup(
    name: &str,
    email: &str,
    password: &SecretString,
    password_confirmation: &SecretString,
) -> ValidationError {
    let mut errors = ValidationError::new();

    if name.trim().is_empty() {
        errors.add(Field::Name, "can't be blank");
    } else if name.chars().count() > NAME_MAX_LEN {
        errors.add(Field::Name, "is too long (maximum is 50 characters)");
    }

    if email.is_empty() {
        errors.add(Field::Email, "can't be blank");
    } else {
        if email.chars().count() > EMAIL_MAX_LEN {
            errors.add(Field::Email, "is too long (maximum is 255 characters)");
        }
        if !valid_email(email) {
            errors.add(Field::Email, "is invalid");
        }
    }

    validate_password(&mut errors, password, password_confirmation);
    errors
}

fn validate_password(
    errors: &mut ValidationError,
    password: &SecretString,
    password_confirmation: &SecretString,
) {
    let raw = password.expose_secret();
    if raw.trim().is_empty() {
        errors.add(Field::Password, "can't be blank");
    } else if raw.chars().count() < PASSWORD_MIN_LEN {
        errors.add(Field::Password, "is too short (minimum is 6 characters)");
    }
    if raw != password_confirmation.expose_secret() {
        errors.add(Field::PasswordConfirmation, "doesn't match password");
    }
}
