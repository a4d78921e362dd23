//! API users and bearer tokens.
//!
//! Only the SHA-256 of a token is stored; the token itself is shown once when
//! the user is created.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::db::Repository;
use crate::models::Profile;

use super::ServiceError;

const TOKEN_PREFIX: &str = "sk_shopseo_";
const TOKEN_BYTES: usize = 32;

/// A freshly created user and their plaintext token.
#[derive(Debug)]
pub struct NewUser {
    pub profile: Profile,
    pub token: String,
}

/// Generate a new random API token.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    format!("{TOKEN_PREFIX}{}", hex::encode(bytes))
}

/// Hex SHA-256 of a token, as stored in `profiles.api_token_hash`.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Creates users and resolves bearer tokens.
pub struct ProfileService<'a> {
    repo: &'a dyn Repository,
}

impl<'a> ProfileService<'a> {
    #[must_use]
    pub const fn new(repo: &'a dyn Repository) -> Self {
        Self { repo }
    }

    /// Create a user with a new token.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a malformed email and `DuplicateState` if the
    /// email is already registered.
    pub async fn create_user(&self, email: &str) -> Result<NewUser, ServiceError> {
        let email = email.trim().to_lowercase();
        if !is_plausible_email(&email) {
            return Err(ServiceError::Validation(format!("invalid email: {email}")));
        }

        let token = generate_token();
        let profile = self
            .repo
            .create_profile(&email, &hash_token(&token))
            .await?;

        tracing::info!(user_id = %profile.id, "User created");
        Ok(NewUser { profile, token })
    }

    /// Resolve a bearer token to its profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationRequired` for an empty or unknown token.
    pub async fn authenticate(&self, token: &str) -> Result<Profile, ServiceError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ServiceError::AuthenticationRequired);
        }

        self.repo
            .find_profile_by_token_hash(&hash_token(token))
            .await?
            .ok_or(ServiceError::AuthenticationRequired)
    }
}

fn is_plausible_email(email: &str) -> bool {
    email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !email.chars().any(char::is_whitespace)
    })
}
