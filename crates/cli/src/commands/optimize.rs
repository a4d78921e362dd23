//! Optimization commands.
//!
//! # Usage
//!
//! ```bash
//! shopseo optimize bulk --store 4 --user 1
//! ```
//!
//! Uses the same configuration as the server, since it writes to Shopify.

use std::sync::Arc;

use shopseo_core::{StoreId, UserId};
use shopseo_server::config::ServerConfig;
use shopseo_server::db::{self, PgRepository};
use shopseo_server::state::AppState;

use super::CommandError;

/// Apply all pending optimizations for a store and print the report as JSON.
pub async fn bulk(user_id: UserId, store_id: StoreId) -> Result<(), CommandError> {
    let config = ServerConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    let state = AppState::from_config(&config, Arc::new(PgRepository::new(pool)))?;

    let report = state.optimizer().bulk_optimize(user_id, store_id).await?;
    let failed = report.results.iter().filter(|r| !r.success).count();
    tracing::info!(
        "Bulk optimization finished: {} product(s), {} failed",
        report.total,
        failed
    );

    #[allow(clippy::print_stdout)]
    {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!("Could not render report: {e}"),
        }
    }
    Ok(())
}
