//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! skybox migrate
//! ```
//!
//! # Environment Variables
//!
//! - `FUNCTIONS_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! `crates/functions/migrations/`, embedded at build time.

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;

use super::CommandError;

/// Apply pending migrations to the endpoint database.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails, or
/// a migration fails.
pub async fn run() -> Result<(), CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("FUNCTIONS_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| CommandError::MissingEnvVar("FUNCTIONS_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../functions/migrations").run(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
