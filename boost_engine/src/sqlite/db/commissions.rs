//! Commission configuration and worker override queries.
use log::{debug, info};
use sqlx::SqliteConnection;

use crate::{
    commission::{choose_split, CommissionSplit, DEFAULT_PLATFORM_PERCENTAGE, DEFAULT_WORKER_PERCENTAGE},
    db_types::{CommissionConfig, WorkerProfile},
    traits::LedgerError,
};

pub async fn fetch_enabled_config(conn: &mut SqliteConnection) -> Result<Option<CommissionConfig>, sqlx::Error> {
    let config = sqlx::query_as("SELECT * FROM commission_config WHERE enabled = 1 LIMIT 1").fetch_optional(conn).await?;
    Ok(config)
}

/// Creates the default configuration row unless an enabled one exists.
///
/// This is an idempotent create backed by the unique index on enabled rows, never a check-then-insert. Returns
/// `true` if this call created the row.
pub async fn provision_default_config(conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT INTO commission_config (worker_percentage, platform_percentage, enabled)
            VALUES ($1, $2, 1)
            ON CONFLICT DO NOTHING
        "#,
    )
    .bind(DEFAULT_WORKER_PERCENTAGE)
    .bind(DEFAULT_PLATFORM_PERCENTAGE)
    .execute(conn)
    .await?;
    let created = result.rows_affected() == 1;
    if created {
        info!("💸️ No commission configuration found. Provisioned the default split.");
    }
    Ok(created)
}

/// Returns the enabled configuration, provisioning the default first if needed.
pub async fn fetch_or_provision_config(conn: &mut SqliteConnection) -> Result<CommissionConfig, LedgerError> {
    if let Some(config) = fetch_enabled_config(conn).await? {
        return Ok(config);
    }
    provision_default_config(conn).await?;
    fetch_enabled_config(conn)
        .await?
        .ok_or_else(|| LedgerError::InconsistentData("No enabled commission configuration after provisioning".into()))
}

/// Sets the worker share of the enabled configuration. The platform share is always stored as the complement.
pub async fn update_enabled_config(
    worker_percentage: f64,
    conn: &mut SqliteConnection,
) -> Result<CommissionConfig, LedgerError> {
    provision_default_config(conn).await?;
    let config = sqlx::query_as(
        r#"
            UPDATE commission_config
            SET worker_percentage = $1, platform_percentage = $2, updated_at = CURRENT_TIMESTAMP
            WHERE enabled = 1
            RETURNING *;
        "#,
    )
    .bind(worker_percentage)
    .bind(1.0 - worker_percentage)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| LedgerError::InconsistentData("No enabled commission configuration to update".into()))?;
    debug!("💸️ Commission configuration updated to {worker_percentage} for workers");
    Ok(config)
}

pub async fn fetch_worker_profile(
    worker_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<WorkerProfile>, sqlx::Error> {
    let profile = sqlx::query_as("SELECT * FROM worker_profiles WHERE worker_id = $1")
        .bind(worker_id)
        .fetch_optional(conn)
        .await?;
    Ok(profile)
}

pub async fn upsert_worker_override(
    worker_id: &str,
    percentage: Option<f64>,
    conn: &mut SqliteConnection,
) -> Result<WorkerProfile, sqlx::Error> {
    let profile = sqlx::query_as(
        r#"
            INSERT INTO worker_profiles (worker_id, commission_override) VALUES ($1, $2)
            ON CONFLICT (worker_id) DO UPDATE SET
                commission_override = excluded.commission_override,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(worker_id)
    .bind(percentage)
    .fetch_one(conn)
    .await?;
    Ok(profile)
}

/// Resolves the split for `worker_id` using the given connection.
///
/// Inside a transaction, a provisioned default row is rolled back along with everything else if the transaction
/// fails.
pub async fn resolve_split(worker_id: &str, conn: &mut SqliteConnection) -> Result<CommissionSplit, LedgerError> {
    let worker_override = fetch_worker_profile(worker_id, conn).await?.and_then(|p| p.commission_override);
    let config = fetch_enabled_config(conn).await?;
    if let Some(split) = choose_split(worker_override, config.as_ref()) {
        return Ok(split);
    }
    let created = provision_default_config(conn).await?;
    if created {
        return Ok(CommissionSplit::provisioned_default());
    }
    // Somebody else provisioned a row between our read and our insert. Theirs wins.
    let config = fetch_or_provision_config(conn).await?;
    Ok(CommissionSplit::from_config(&config))
}
