//! # SQLite database methods
//!
//! This module contains the "low-level" SQLite interactions.
//!
//! Every interaction is a plain function that accepts a `&mut SqliteConnection`. Callers can pass a pooled
//! connection, or a transaction (`&mut *tx`) when several calls must commit as one unit of work.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod commissions;
pub mod notifications;
pub mod orders;
pub mod payments;
pub mod settlements;

const SQLITE_DB_URL: &str = "sqlite://data/boost_store.db";
/// How long a connection waits for another writer to release the database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

pub fn db_url() -> String {
    let result = env::var("BSG_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ BSG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
