//! CLI subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by the subcommands.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] dragonfruit_api::db::RepositoryError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Connect to the marketplace database named by `MARKET_DATABASE_URL`.
pub(crate) async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("MARKET_DATABASE_URL")
        .map_err(|_| CommandError::MissingEnvVar("MARKET_DATABASE_URL"))?;

    Ok(dragonfruit_api::db::create_pool(&SecretString::from(database_url)).await?)
}
