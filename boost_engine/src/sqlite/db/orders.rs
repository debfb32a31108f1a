//! Order ledger queries.
//!
//! Every status change in here is a *conditional* update. The caller learns whether it won from the number of rows
//! the update touched, never from an earlier read.
use boost_common::Cents;
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    commission::CommissionSplit,
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    traits::LedgerError,
};

/// Inserts the order, returning `false` in the second parameter if an order with the same id already exists.
///
/// The insert is a single statement, so concurrent inserts of the same order are safe.
pub async fn idempotent_insert(order: NewOrder, conn: &mut SqliteConnection) -> Result<(Order, bool), LedgerError> {
    if !order.total_price.is_positive() {
        return Err(LedgerError::InvalidPrice(order.order_id));
    }
    let inserted: Option<Order> = sqlx::query_as(
        r#"
            INSERT INTO orders (order_id, owner_id, service_id, admin_id, total_price, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (order_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(&order.owner_id)
    .bind(&order.service_id)
    .bind(order.admin_id.as_deref())
    .bind(order.total_price.value())
    .bind(order.created_at)
    .fetch_optional(&mut *conn)
    .await?;
    match inserted {
        Some(o) => {
            debug!("🗃️ Order {} inserted with id {}", o.order_id, o.id);
            Ok((o, true))
        },
        None => {
            let existing = fetch_order_by_order_id(&order.order_id, conn)
                .await?
                .ok_or_else(|| LedgerError::InconsistentData(format!("Order {} vanished after insert", order.order_id)))?;
            trace!("🗃️ Order {} already exists", existing.order_id);
            Ok((existing, false))
        },
    }
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Assigns `worker_id` to the order, only while the order is `Paid` and has no worker.
///
/// Returns the number of rows affected. `1` means this caller won the claim; `0` means it lost (or the order is not
/// claimable). This single statement is the only thing standing between concurrent claimants, so it must never be
/// split into a read and a write.
pub async fn assign_worker_if_unclaimed(
    order_id: &OrderId,
    worker_id: &str,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE orders
            SET worker_id = $1, status = 'ASSIGNED', updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $2 AND status = 'PAID' AND worker_id IS NULL
        "#,
    )
    .bind(worker_id)
    .bind(order_id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Sets the order status to `new_status`, but only if the current status is one of `expected` (and, when `worker_id`
/// is given, only if that worker is assigned to the order).
///
/// Statuses that do not hold a worker clear `worker_id` in the same statement.
/// Returns the number of rows affected.
pub async fn update_status_if(
    order_id: &OrderId,
    expected: &[OrderStatusType],
    new_status: OrderStatusType,
    worker_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    if expected.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP, status = ");
    builder.push_bind(new_status.to_string());
    if !new_status.holds_worker() {
        builder.push(", worker_id = NULL");
    }
    builder.push(" WHERE order_id = ");
    builder.push_bind(order_id.as_str());
    builder.push(" AND status IN (");
    let mut statuses = builder.separated(", ");
    for status in expected {
        statuses.push_bind(status.to_string());
    }
    statuses.push_unseparated(")");
    if let Some(worker_id) = worker_id {
        builder.push(" AND worker_id = ");
        builder.push_bind(worker_id);
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}

/// Writes the denormalized settlement snapshot onto the order row.
pub async fn store_settlement_snapshot(
    order_id: &OrderId,
    split: &CommissionSplit,
    commission: Cents,
    revenue: Cents,
    conn: &mut SqliteConnection,
) -> Result<(), LedgerError> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET
                worker_commission = $1,
                admin_revenue = $2,
                worker_percentage = $3,
                platform_percentage = $4,
                updated_at = CURRENT_TIMESTAMP
            WHERE order_id = $5
        "#,
    )
    .bind(commission.value())
    .bind(revenue.value())
    .bind(split.worker_percentage)
    .bind(split.platform_percentage)
    .bind(order_id.as_str())
    .execute(conn)
    .await?;
    if result.rows_affected() == 1 {
        Ok(())
    } else {
        Err(LedgerError::OrderNotFound(order_id.clone()))
    }
}
