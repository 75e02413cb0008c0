//! Database migration commands.
//!
//! # Usage
//!
//! ```bash
//! bw-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! # Migration Files
//!
//! `crates/admin/migrations/`, embedded at compile time.

use super::{CommandError, connect};

/// Run all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../admin/migrations").run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
