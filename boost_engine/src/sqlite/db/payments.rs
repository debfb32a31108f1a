use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, OrderId, Payment, PaymentStatus},
    traits::LedgerError,
};

/// Inserts the payment, returning `false` in the second parameter if a payment with the same provider id already
/// exists. The payment's order must exist.
pub async fn idempotent_insert(
    payment: NewPayment,
    conn: &mut SqliteConnection,
) -> Result<(Payment, bool), LedgerError> {
    let inserted: Option<Payment> = sqlx::query_as(
        r#"
            INSERT INTO payments (provider_id, order_id, amount)
            SELECT $1, order_id, $3 FROM orders WHERE order_id = $2
            ON CONFLICT (provider_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(&payment.provider_id)
    .bind(payment.order_id.as_str())
    .bind(payment.amount.value())
    .fetch_optional(&mut *conn)
    .await?;
    if let Some(p) = inserted {
        debug!("🗃️ Payment {} for order {} inserted", p.provider_id, p.order_id);
        return Ok((p, true));
    }
    match fetch_payment_by_provider_id(&payment.provider_id, conn).await? {
        Some(existing) => Ok((existing, false)),
        None => Err(LedgerError::OrderNotFound(payment.order_id)),
    }
}

pub async fn fetch_payment_by_provider_id(
    provider_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment =
        sqlx::query_as("SELECT * FROM payments WHERE provider_id = $1").bind(provider_id).fetch_optional(conn).await?;
    Ok(payment)
}

pub async fn fetch_payments_for_order(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let payments = sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY id")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(payments)
}

/// Moves the payment from `from` to `to`. Returns the updated payment, or `None` if the payment was not in the `from`
/// state (or does not exist).
pub async fn update_status_if(
    provider_id: &str,
    from: PaymentStatus,
    to: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment = sqlx::query_as(
        r#"
            UPDATE payments SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE provider_id = $2 AND status = $3
            RETURNING *;
        "#,
    )
    .bind(to.to_string())
    .bind(provider_id)
    .bind(from.to_string())
    .fetch_optional(conn)
    .await?;
    Ok(payment)
}
