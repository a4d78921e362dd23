//! CLI command implementations.

pub mod audits;
pub mod migrate;
pub mod optimize;
pub mod users;

use shopseo_server::config::{self, ConfigError};
use shopseo_server::db::{self, PgRepository};
use shopseo_server::services::ServiceError;
use shopseo_server::state::StateError;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Client setup error: {0}")]
    State(#[from] StateError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Connect to the database named by `SHOPSEO_DATABASE_URL`.
async fn connect() -> Result<PgRepository, CommandError> {
    dotenvy::dotenv().ok();
    let database_url = config::database_url_from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    Ok(PgRepository::new(pool))
}
