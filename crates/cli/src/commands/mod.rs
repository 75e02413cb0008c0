pub mod migrate;
pub mod orders;
pub mod widgets;

use bundlewise_core::ShopDomainError;
use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by all commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] bundlewise_admin::db::RepositoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] bundlewise_admin::config::ConfigError),

    #[error("{0}")]
    App(#[from] bundlewise_admin::AppError),

    #[error("Invalid shop domain: {0}")]
    InvalidShop(#[from] ShopDomainError),

    #[error("Widget {0} not found")]
    WidgetNotFound(bundlewise_core::WidgetId),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connect to the database named by `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    Ok(bundlewise_admin::db::create_pool(&database_url).await?)
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CommandError> {
    let out = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{out}");
    }
    Ok(())
}
