//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! shopseo migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPSEO_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! Migrations live in `crates/server/migrations/`.

use super::CommandError;

/// Apply pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let repo = super::connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../server/migrations").run(repo.pool()).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
