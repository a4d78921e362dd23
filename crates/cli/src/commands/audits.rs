//! Audit maintenance commands.
//!
//! # Usage
//!
//! ```bash
//! shopseo audits upgrade
//! ```
//!
//! Audits saved under an older payload schema are also upgraded lazily when
//! read through the API; this command does all of them at once.

use shopseo_server::services::upgrade_stored_audits;

use super::CommandError;

/// Upgrade every stored audit below the current schema version.
pub async fn upgrade() -> Result<(), CommandError> {
    let repo = super::connect().await?;

    let upgraded = upgrade_stored_audits(&repo).await?;
    tracing::info!("Upgraded {} audit(s)", upgraded);
    Ok(())
}
