//! Commission and revenue record queries.
use boost_common::Cents;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{CommissionRecord, OrderId, RevenueRecord},
    traits::LedgerError,
};

pub async fn insert_commission_record(
    order_id: &OrderId,
    worker_id: &str,
    order_total: Cents,
    percentage: f64,
    amount: Cents,
    conn: &mut SqliteConnection,
) -> Result<CommissionRecord, LedgerError> {
    let record: CommissionRecord = sqlx::query_as(
        r#"
            INSERT INTO commission_records (order_id, worker_id, order_total, percentage, amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(worker_id)
    .bind(order_total.value())
    .bind(percentage)
    .bind(amount.value())
    .fetch_one(conn)
    .await?;
    debug!("💸️ Commission of {} recorded for {worker_id} on order {order_id}", record.amount);
    Ok(record)
}

/// Updates the revenue record for the `(order_id, admin_id)` stakeholder, or inserts one if there is none.
pub async fn upsert_revenue_record(
    order_id: &OrderId,
    admin_id: Option<&str>,
    order_total: Cents,
    percentage: f64,
    amount: Cents,
    conn: &mut SqliteConnection,
) -> Result<RevenueRecord, LedgerError> {
    let updated: Option<RevenueRecord> = sqlx::query_as(
        r#"
            UPDATE revenue_records SET
                order_total = $1,
                percentage = $2,
                amount = $3,
                status = 'PENDING',
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $4 AND admin_id IS $5
            RETURNING *;
        "#,
    )
    .bind(order_total.value())
    .bind(percentage)
    .bind(amount.value())
    .bind(order_id.as_str())
    .bind(admin_id)
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(record) = updated {
        debug!("💸️ Revenue record #{} for order {order_id} updated", record.id);
        return Ok(record);
    }
    let record: RevenueRecord = sqlx::query_as(
        r#"
            INSERT INTO revenue_records (order_id, admin_id, order_total, percentage, amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id.as_str())
    .bind(admin_id)
    .bind(order_total.value())
    .bind(percentage)
    .bind(amount.value())
    .fetch_one(conn)
    .await?;
    debug!("💸️ Revenue of {} recorded for order {order_id}", record.amount);
    Ok(record)
}

pub async fn fetch_commission_record(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<CommissionRecord>, sqlx::Error> {
    let record = sqlx::query_as("SELECT * FROM commission_records WHERE order_id = $1")
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(record)
}

pub async fn fetch_revenue_records(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<RevenueRecord>, sqlx::Error> {
    let records = sqlx::query_as("SELECT * FROM revenue_records WHERE order_id = $1 ORDER BY id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(records)
}

/// Marks the order's pending commission record `Cancelled`, returning the worker it belonged to.
pub async fn cancel_commission_record(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<String>, sqlx::Error> {
    let worker_id: Option<String> = sqlx::query_scalar(
        r#"
            UPDATE commission_records SET status = 'CANCELLED', updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND status = 'PENDING'
            RETURNING worker_id;
        "#,
    )
    .bind(order_id.as_str())
    .fetch_optional(conn)
    .await?;
    Ok(worker_id)
}

/// Marks every pending revenue record of the order `Cancelled`. Returns the number of records cancelled.
pub async fn cancel_revenue_records(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE revenue_records SET status = 'CANCELLED', updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $1 AND status = 'PENDING'
        "#,
    )
    .bind(order_id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
