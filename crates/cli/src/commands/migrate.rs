//! Database migration command.
//!
//! Migrations live in `crates/api/migrations/` and are embedded into this
//! binary at compile time; running `df-cli migrate` applies any that are
//! pending. The API server never migrates on startup.

use super::{CommandError, connect};

/// Run pending migrations.
pub async fn run() -> Result<(), CommandError> {
    tracing::info!("Connecting to marketplace database...");
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
