//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! shopseo users create -e owner@example.com
//! ```
//!
//! The API token is printed once. Only its hash is stored.

use shopseo_server::services::ProfileService;

use super::CommandError;

/// Create a user on the free plan and print their API token.
pub async fn create(email: &str) -> Result<(), CommandError> {
    let repo = super::connect().await?;

    let created = ProfileService::new(&repo).create_user(email).await?;
    tracing::info!(
        "User created! ID: {}, Email: {}",
        created.profile.id,
        created.profile.email
    );

    #[allow(clippy::print_stdout)]
    {
        println!("API token (shown once): {}", created.token);
    }
    Ok(())
}
