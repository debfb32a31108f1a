//! `SqliteDatabase` is the SQLite implementation of the settlement engine backend.
//!
//! It owns the connection pool and opens the transaction (unit of work) for every multi-record operation. The
//! queries themselves live in [`super::db`].
//!
//! SQLite allows a single writer at a time. Units of work that must not lose a race issue their conditional write as
//! the *first* statement of the transaction, so the write lock is taken before anything inside the transaction is
//! read. Fast-fail precondition reads happen on a pooled connection, outside the transaction.
use std::fmt::Debug;

use log::*;
use sqlx::{SqliteConnection, SqlitePool};

use super::db::{commissions, db_url, new_pool, notifications, orders, payments, settlements};
use crate::{
    commission::CommissionSplit,
    db_types::{
        CommissionConfig,
        CommissionRecord,
        NewNotification,
        NewOrder,
        NewPayment,
        Notification,
        NotificationType,
        Order,
        OrderId,
        OrderStatusType,
        Payment,
        PaymentStatus,
        RevenueRecord,
        WorkerProfile,
    },
    traits::{
        ClaimAttempt,
        ClaimedOrder,
        CommissionManagement,
        IgnoreReason,
        LedgerError,
        OrderManagement,
        PaymentTransition,
        SettlementDatabase,
        WebhookAck,
    },
};

const CANCELLABLE: [OrderStatusType; 3] = [OrderStatusType::Pending, OrderStatusType::Paid, OrderStatusType::InProgress];

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SettlementDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), LedgerError> {
        // A RETURNING row can arrive before an autocommit statement is committed, so commit explicitly
        let mut tx = self.pool.begin().await?;
        let result = orders::idempotent_insert(order, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<(Payment, bool), LedgerError> {
        let mut tx = self.pool.begin().await?;
        let result = payments::idempotent_insert(payment, &mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }

    async fn try_claim_order(&self, order_id: &OrderId, worker_id: &str) -> Result<ClaimAttempt, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let affected = orders::assign_worker_if_unclaimed(order_id, worker_id, &mut tx).await?;
        if affected == 0 {
            // Release the write lock before looking at who beat us
            tx.rollback().await?;
            let mut conn = self.pool.acquire().await?;
            let order = orders::fetch_order_by_order_id(order_id, &mut conn)
                .await?
                .ok_or_else(|| LedgerError::OrderNotFound(order_id.clone()))?;
            debug!("🤝️ Claim of {order_id} by {worker_id} touched no rows. The order is {}", order.status);
            return Ok(ClaimAttempt::Lost(order));
        }
        debug!("🤝️ {worker_id} won the claim for {order_id}. Settling.");
        // Any error from here on drops `tx`, which rolls the assignment back too
        let claimed = settle_claim(order_id, worker_id, &mut tx).await?;
        tx.commit().await?;
        info!(
            "💸️ Order {order_id} settled: {} to {worker_id}, {} to the platform",
            claimed.commission.amount, claimed.revenue.amount
        );
        Ok(ClaimAttempt::Won(claimed))
    }

    async fn transition_order(
        &self,
        order_id: &OrderId,
        expected: &[OrderStatusType],
        new_status: OrderStatusType,
    ) -> Result<Order, LedgerError> {
        check_transitions(expected, new_status)?;
        if new_status == OrderStatusType::Assigned {
            // Only a claim may assign a worker
            return Err(LedgerError::IllegalTransition { from: OrderStatusType::Paid, to: new_status });
        }
        if new_status == OrderStatusType::Cancelled {
            return self.cancel_from(order_id, expected, "Cancelled by the platform").await;
        }
        let mut tx = self.pool.begin().await?;
        let affected = orders::update_status_if(order_id, expected, new_status, None, &mut tx).await?;
        if affected == 0 {
            tx.rollback().await?;
            return Err(self.transition_failure(order_id, new_status).await);
        }
        let order = fetch_order_in(order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} is now {new_status}");
        Ok(order)
    }

    async fn start_order(&self, order_id: &OrderId, worker_id: &str) -> Result<Order, LedgerError> {
        let new_status = OrderStatusType::InProgress;
        let expected = [OrderStatusType::Assigned];
        let mut tx = self.pool.begin().await?;
        let affected = orders::update_status_if(order_id, &expected, new_status, Some(worker_id), &mut tx).await?;
        if affected == 0 {
            tx.rollback().await?;
            return Err(self.worker_transition_failure(order_id, worker_id, new_status).await);
        }
        let order = fetch_order_in(order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ {worker_id} started work on order {order_id}");
        Ok(order)
    }

    async fn complete_order(&self, order_id: &OrderId, worker_id: &str) -> Result<Order, LedgerError> {
        let new_status = OrderStatusType::Completed;
        let expected = [OrderStatusType::Assigned, OrderStatusType::InProgress];
        let mut tx = self.pool.begin().await?;
        let affected = orders::update_status_if(order_id, &expected, new_status, Some(worker_id), &mut tx).await?;
        if affected == 0 {
            tx.rollback().await?;
            return Err(self.worker_transition_failure(order_id, worker_id, new_status).await);
        }
        let order = fetch_order_in(order_id, &mut tx).await?;
        let note = NewNotification::new(
            order.owner_id.as_str(),
            NotificationType::OrderCompleted,
            "Order completed",
            format!("Your order {order_id} has been completed."),
        )
        .for_order(order_id);
        notifications::insert_notification(note, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ {worker_id} completed order {order_id}");
        Ok(order)
    }

    async fn cancel_order(&self, order_id: &OrderId, reason: &str) -> Result<Order, LedgerError> {
        self.cancel_from(order_id, &CANCELLABLE, reason).await
    }

    async fn dispute_order(&self, order_id: &OrderId) -> Result<Order, LedgerError> {
        self.transition_order(
            order_id,
            &[OrderStatusType::InProgress, OrderStatusType::Completed],
            OrderStatusType::Disputed,
        )
        .await
    }

    async fn apply_payment_event(&self, provider_id: &str, status: PaymentStatus) -> Result<WebhookAck, LedgerError> {
        let from = payment_preconditions(status);
        if from.is_empty() {
            return Ok(WebhookAck::Ignored(IgnoreReason::UnrecognisedEvent));
        }
        let mut tx = self.pool.begin().await?;
        // The first statement is a write, so the whole unit of work runs under the write lock
        let mut updated = None;
        for previous in from {
            if let Some(payment) = payments::update_status_if(provider_id, *previous, status, &mut tx).await? {
                updated = Some((payment, *previous));
                break;
            }
        }
        let Some((payment, previous_status)) = updated else {
            tx.rollback().await?;
            return self.classify_ignored_event(provider_id, status).await;
        };
        let order = fetch_order_in(&payment.order_id, &mut tx).await?;
        let transition = match status {
            PaymentStatus::Paid => apply_paid(payment, previous_status, order, &mut tx).await?,
            PaymentStatus::Refunded => apply_refund(payment, previous_status, order, &mut tx).await?,
            PaymentStatus::Expired | PaymentStatus::Cancelled => {
                apply_lapsed(payment, previous_status, order, &mut tx).await?
            },
            PaymentStatus::Pending => {
                tx.rollback().await?;
                return Ok(WebhookAck::Ignored(IgnoreReason::UnrecognisedEvent));
            },
        };
        tx.commit().await?;
        info!(
            "🪝️ Payment {provider_id} moved {previous_status} -> {}. Order {} is {}",
            transition.payment.status, transition.order.order_id, transition.order.status
        );
        Ok(WebhookAck::Applied(transition))
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_order_id(order_id, &mut conn).await?)
    }

    async fn fetch_payment(&self, provider_id: &str) -> Result<Option<Payment>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payment_by_provider_id(provider_id, &mut conn).await?)
    }

    async fn fetch_payments_for_order(&self, order_id: &OrderId) -> Result<Vec<Payment>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payments_for_order(order_id, &mut conn).await?)
    }

    async fn fetch_commission_record(&self, order_id: &OrderId) -> Result<Option<CommissionRecord>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settlements::fetch_commission_record(order_id, &mut conn).await?)
    }

    async fn fetch_revenue_records(&self, order_id: &OrderId) -> Result<Vec<RevenueRecord>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settlements::fetch_revenue_records(order_id, &mut conn).await?)
    }

    async fn fetch_notifications(&self, user_id: &str) -> Result<Vec<Notification>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::fetch_notifications_for_user(user_id, &mut conn).await?)
    }
}

impl CommissionManagement for SqliteDatabase {
    async fn fetch_commission_config(&self) -> Result<CommissionConfig, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        commissions::fetch_or_provision_config(&mut conn).await
    }

    async fn update_commission_config(&self, worker_percentage: f64) -> Result<CommissionConfig, LedgerError> {
        if !crate::commission::is_valid_percentage(worker_percentage) {
            return Err(LedgerError::InvalidPercentage(worker_percentage));
        }
        let mut tx = self.pool.begin().await?;
        let config = commissions::update_enabled_config(worker_percentage, &mut tx).await?;
        tx.commit().await?;
        Ok(config)
    }

    async fn fetch_worker_profile(&self, worker_id: &str) -> Result<Option<WorkerProfile>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        Ok(commissions::fetch_worker_profile(worker_id, &mut conn).await?)
    }

    async fn set_worker_override(
        &self,
        worker_id: &str,
        percentage: Option<f64>,
    ) -> Result<WorkerProfile, LedgerError> {
        if let Some(pct) = percentage {
            if !crate::commission::is_valid_percentage(pct) {
                return Err(LedgerError::InvalidPercentage(pct));
            }
        }
        let mut tx = self.pool.begin().await?;
        let profile = commissions::upsert_worker_override(worker_id, percentage, &mut tx).await?;
        tx.commit().await?;
        debug!("💸️ Commission override for {worker_id} set to {percentage:?}");
        Ok(profile)
    }

    async fn resolve_split(&self, worker_id: &str) -> Result<CommissionSplit, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        commissions::resolve_split(worker_id, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using `BSG_DATABASE_URL` (or the default) as the database URL.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await
    }

    async fn cancel_from(
        &self,
        order_id: &OrderId,
        expected: &[OrderStatusType],
        reason: &str,
    ) -> Result<Order, LedgerError> {
        check_transitions(expected, OrderStatusType::Cancelled)?;
        let mut tx = self.pool.begin().await?;
        let Some(order) = cancel_in(order_id, expected, reason, &mut tx).await? else {
            tx.rollback().await?;
            return Err(self.transition_failure(order_id, OrderStatusType::Cancelled).await);
        };
        tx.commit().await?;
        info!("🗃️ Order {order_id} cancelled: {reason}");
        Ok(order)
    }

    /// Explains why a conditional transition touched no rows, from a fresh read.
    async fn transition_failure(&self, order_id: &OrderId, to: OrderStatusType) -> LedgerError {
        match self.fetch_order(order_id).await {
            Ok(Some(order)) => LedgerError::InvalidTransition { order_id: order_id.clone(), from: order.status, to },
            Ok(None) => LedgerError::OrderNotFound(order_id.clone()),
            Err(e) => e,
        }
    }

    async fn worker_transition_failure(&self, order_id: &OrderId, worker_id: &str, to: OrderStatusType) -> LedgerError {
        match self.fetch_order(order_id).await {
            Ok(Some(order)) if order.worker_id.as_deref() != Some(worker_id) => {
                LedgerError::WorkerNotAssigned { order_id: order_id.clone(), worker_id: worker_id.to_string() }
            },
            Ok(Some(order)) => LedgerError::InvalidTransition { order_id: order_id.clone(), from: order.status, to },
            Ok(None) => LedgerError::OrderNotFound(order_id.clone()),
            Err(e) => e,
        }
    }

    async fn classify_ignored_event(&self, provider_id: &str, status: PaymentStatus) -> Result<WebhookAck, LedgerError> {
        let reason = match self.fetch_payment(provider_id).await? {
            None => {
                warn!("🪝️ Received a {status} event for unknown payment {provider_id}. Acknowledging without changes.");
                IgnoreReason::UnknownPayment
            },
            Some(p) if p.status == status => {
                debug!("🪝️ Payment {provider_id} is already {status}. Ignoring the replay.");
                IgnoreReason::AlreadyApplied
            },
            Some(p) => {
                info!("🪝️ Payment {provider_id} is {}. A {status} event does not apply. Ignoring.", p.status);
                IgnoreReason::PreconditionNotMet
            },
        };
        Ok(WebhookAck::Ignored(reason))
    }
}

fn check_transitions(expected: &[OrderStatusType], to: OrderStatusType) -> Result<(), LedgerError> {
    match expected.iter().find(|from| !from.can_transition_to(to)) {
        Some(from) => Err(LedgerError::IllegalTransition { from: *from, to }),
        None if expected.is_empty() => {
            Err(LedgerError::InconsistentData(format!("No source statuses were given for a transition to {to}")))
        },
        None => Ok(()),
    }
}

/// The local payment statuses an incoming status may be applied to.
fn payment_preconditions(status: PaymentStatus) -> &'static [PaymentStatus] {
    use PaymentStatus::*;
    match status {
        Paid | Expired | Cancelled => &[Pending],
        Refunded => &[Pending, Paid, Expired, Cancelled],
        Pending => &[],
    }
}

async fn fetch_order_in(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Order, LedgerError> {
    orders::fetch_order_by_order_id(order_id, conn).await?.ok_or_else(|| LedgerError::OrderNotFound(order_id.clone()))
}

/// Everything a won claim writes, after the worker has been assigned. Must run inside the claim's transaction.
async fn settle_claim(
    order_id: &OrderId,
    worker_id: &str,
    conn: &mut SqliteConnection,
) -> Result<ClaimedOrder, LedgerError> {
    // Re-read inside the unit of work, for the total and the revenue stakeholder
    let order = fetch_order_in(order_id, conn).await?;
    let split = commissions::resolve_split(worker_id, conn).await?;
    let amounts = split.split_amount(order.total_price);
    trace!("💸️ Split for {worker_id} on {order_id}: {split:?} -> {amounts:?}");
    let commission = settlements::insert_commission_record(
        order_id,
        worker_id,
        order.total_price,
        split.worker_percentage,
        amounts.commission,
        conn,
    )
    .await?;
    let revenue = settlements::upsert_revenue_record(
        order_id,
        order.admin_id.as_deref(),
        order.total_price,
        split.platform_percentage,
        amounts.revenue,
        conn,
    )
    .await?;
    orders::store_settlement_snapshot(order_id, &split, amounts.commission, amounts.revenue, conn).await?;
    let to_worker = NewNotification::new(
        worker_id,
        NotificationType::OrderClaimed,
        "Order claimed",
        format!("You claimed order {order_id}. Your commission is {}.", amounts.commission),
    )
    .for_order(order_id);
    notifications::insert_notification(to_worker, conn).await?;
    let to_owner = NewNotification::new(
        order.owner_id.as_str(),
        NotificationType::OrderClaimed,
        "A booster has been assigned",
        format!("Your order {order_id} has been picked up."),
    )
    .for_order(order_id);
    notifications::insert_notification(to_owner, conn).await?;
    let order = fetch_order_in(order_id, conn).await?;
    Ok(ClaimedOrder { order, commission, revenue })
}

/// Cancels the order if its status is one of `expected`, inside the caller's transaction.
///
/// Returns `None` if the order was not in an expected status. The worker is detached, the settlement records are
/// marked cancelled and the parties are notified.
async fn cancel_in(
    order_id: &OrderId,
    expected: &[OrderStatusType],
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, LedgerError> {
    let affected = orders::update_status_if(order_id, expected, OrderStatusType::Cancelled, None, conn).await?;
    if affected == 0 {
        return Ok(None);
    }
    let worker = settlements::cancel_commission_record(order_id, conn).await?;
    let revenue_count = settlements::cancel_revenue_records(order_id, conn).await?;
    trace!("🗃️ Cancelled settlement records for {order_id}: worker {worker:?}, {revenue_count} revenue record(s)");
    let order = fetch_order_in(order_id, conn).await?;
    let to_owner = NewNotification::new(
        order.owner_id.clone(),
        NotificationType::OrderCancelled,
        "Order cancelled",
        format!("Your order {order_id} was cancelled. {reason}"),
    )
    .for_order(order_id);
    notifications::insert_notification(to_owner, conn).await?;
    if let Some(worker_id) = worker {
        let to_worker = NewNotification::new(
            worker_id,
            NotificationType::OrderCancelled,
            "Order cancelled",
            format!("Order {order_id} was cancelled and its commission voided. {reason}"),
        )
        .for_order(order_id);
        notifications::insert_notification(to_worker, conn).await?;
    }
    Ok(Some(order))
}

async fn apply_paid(
    payment: Payment,
    previous_status: PaymentStatus,
    order: Order,
    conn: &mut SqliteConnection,
) -> Result<PaymentTransition, LedgerError> {
    let order_id = order.order_id.clone();
    let expected = [OrderStatusType::Pending];
    if order.status != OrderStatusType::Pending {
        debug!("🪝️ Order {order_id} is already {}. Recording the payment only.", order.status);
        return Ok(PaymentTransition { payment, previous_status, order, previous_order_status: None });
    }
    let affected = orders::update_status_if(&order_id, &expected, OrderStatusType::Paid, None, conn).await?;
    if affected == 0 {
        return Err(LedgerError::InconsistentData(format!("Order {order_id} changed while the write lock was held")));
    }
    let note = NewNotification::new(
        order.owner_id.as_str(),
        NotificationType::OrderPaid,
        "Payment received",
        format!("Payment for order {order_id} was received. It is now open for boosters."),
    )
    .for_order(&order_id);
    notifications::insert_notification(note, conn).await?;
    let order = fetch_order_in(&order_id, conn).await?;
    Ok(PaymentTransition { payment, previous_status, order, previous_order_status: Some(OrderStatusType::Pending) })
}

async fn apply_refund(
    payment: Payment,
    previous_status: PaymentStatus,
    order: Order,
    conn: &mut SqliteConnection,
) -> Result<PaymentTransition, LedgerError> {
    let order_id = order.order_id.clone();
    let note = NewNotification::new(
        order.owner_id.as_str(),
        NotificationType::PaymentRefunded,
        "Payment refunded",
        format!("Your payment {} for order {order_id} was refunded.", payment.provider_id),
    )
    .for_order(&order_id);
    notifications::insert_notification(note, conn).await?;
    if order.status == OrderStatusType::Cancelled {
        return Ok(PaymentTransition { payment, previous_status, order, previous_order_status: None });
    }
    // A refund cancels the order whatever state it is in
    let previous_order_status = order.status;
    let cancelled = cancel_in(&order_id, &[previous_order_status], "The payment was refunded.", conn)
        .await?
        .ok_or_else(|| LedgerError::InconsistentData(format!("Order {order_id} changed while the write lock was held")))?;
    Ok(PaymentTransition {
        payment,
        previous_status,
        order: cancelled,
        previous_order_status: Some(previous_order_status),
    })
}

async fn apply_lapsed(
    payment: Payment,
    previous_status: PaymentStatus,
    order: Order,
    conn: &mut SqliteConnection,
) -> Result<PaymentTransition, LedgerError> {
    let (notification_type, title, what) = match payment.status {
        PaymentStatus::Expired => (NotificationType::PaymentExpired, "Payment expired", "expired"),
        _ => (NotificationType::PaymentCancelled, "Payment cancelled", "was cancelled"),
    };
    let note = NewNotification::new(
        order.owner_id.as_str(),
        notification_type,
        title,
        format!("Your payment {} for order {} {what}.", payment.provider_id, order.order_id),
    )
    .for_order(&order.order_id);
    notifications::insert_notification(note, conn).await?;
    Ok(PaymentTransition { payment, previous_status, order, previous_order_status: None })
}
