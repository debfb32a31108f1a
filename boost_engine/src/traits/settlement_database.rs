use thiserror::Error;

use crate::{
    db_types::{NewOrder, NewPayment, Order, OrderId, OrderStatusType, Payment, PaymentStatus},
    traits::{ClaimAttempt, WebhookAck},
};

/// Mutating behaviour for backends supporting the settlement engine.
///
/// Every method is atomic. If any statement inside a method fails, the backend rolls back all the changes the method
/// made before returning the error.
#[allow(async_fn_in_trait)]
pub trait SettlementDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new order in the `Pending` state. This call is idempotent on the order id.
    ///
    /// Returns the stored order, and `false` in the second parameter if the order already existed.
    async fn insert_order(&self, order: NewOrder) -> Result<(Order, bool), LedgerError>;

    /// Stores a new `Pending` payment against an existing order. This call is idempotent on the provider id.
    ///
    /// Returns the stored payment, and `false` in the second parameter if the payment already existed.
    async fn insert_payment(&self, payment: NewPayment) -> Result<(Payment, bool), LedgerError>;

    /// Tries to assign `worker_id` to the order, and settle the commission for it, in one unit of work.
    ///
    /// The assignment must be a single conditional update that only succeeds while the order is still `Paid` and has
    /// no worker. The number of affected rows decides the race:
    /// * one row: the claim is won. The split is resolved, the commission and revenue records are written, the
    ///   settlement snapshot is stored on the order and the parties are notified. Everything commits together.
    /// * no rows: somebody else won (or the order changed state). Nothing is written and
    ///   [`ClaimAttempt::Lost`] carries a fresh copy of the order.
    ///
    /// Any failure after a won update rolls the claim back, leaving the order `Paid` and unassigned.
    async fn try_claim_order(&self, order_id: &OrderId, worker_id: &str) -> Result<ClaimAttempt, LedgerError>;

    /// Moves the order to `new_status`, but only if its current status is one of `expected`.
    ///
    /// The transition must also appear in the order ledger's transition table. A mismatch is reported as
    /// [`LedgerError::InvalidTransition`]. It is never silently ignored.
    async fn transition_order(
        &self,
        order_id: &OrderId,
        expected: &[OrderStatusType],
        new_status: OrderStatusType,
    ) -> Result<Order, LedgerError>;

    /// `Assigned -> InProgress`, for the assigned worker only.
    async fn start_order(&self, order_id: &OrderId, worker_id: &str) -> Result<Order, LedgerError>;

    /// `Assigned | InProgress -> Completed`, for the assigned worker only. The order owner is notified.
    async fn complete_order(&self, order_id: &OrderId, worker_id: &str) -> Result<Order, LedgerError>;

    /// Cancels the order from `Pending`, `Paid` or `InProgress`.
    ///
    /// The worker is detached, the order's commission and revenue records are marked `Cancelled`, and the owner (and
    /// the worker, if there was one) are notified.
    async fn cancel_order(&self, order_id: &OrderId, reason: &str) -> Result<Order, LedgerError>;

    /// `InProgress | Completed -> Disputed`. The worker stays attached.
    async fn dispute_order(&self, order_id: &OrderId) -> Result<Order, LedgerError>;

    /// Applies a payment provider's status update for the payment identified by `provider_id`.
    ///
    /// The payment status change, any resulting order change, and the notifications all commit together.
    /// Unknown payments, replays and updates whose precondition does not hold are acknowledged with
    /// [`WebhookAck::Ignored`]. Only store failures are errors.
    async fn apply_payment_event(&self, provider_id: &str, status: PaymentStatus) -> Result<WebhookAck, LedgerError>;
}

#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {order_id} cannot move to {to}. It is currently {from}.")]
    InvalidTransition { order_id: OrderId, from: OrderStatusType, to: OrderStatusType },
    #[error("{from} -> {to} is not a legal order transition")]
    IllegalTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("Order {order_id} is not assigned to worker {worker_id}")]
    WorkerNotAssigned { order_id: OrderId, worker_id: String },
    #[error("Order {0} must have a positive total price")]
    InvalidPrice(OrderId),
    #[error("Commission percentage {0} is outside the range [0, 1]")]
    InvalidPercentage(f64),
    #[error("The stored data is inconsistent: {0}")]
    InconsistentData(String),
}

impl LedgerError {
    /// Store failures are the only errors that are worth retrying from a fresh read.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::DatabaseError(_))
    }
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::DatabaseError(e.to_string())
    }
}
