//! CLI subcommands.

pub mod admin;
pub mod catalog;
pub mod migrate;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Failure to reach the storefront database.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect using `EYERIC_DATABASE_URL`, loading `.env` first.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("EYERIC_DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingEnvVar("EYERIC_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(eyeric_storefront::db::create_pool(&database_url).await?)
}
