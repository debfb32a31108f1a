use crate::{
    db_types::{CommissionRecord, Notification, Order, OrderId, Payment, RevenueRecord},
    traits::LedgerError,
};

/// Read-only queries over the order ledger and its settlement records.
///
/// None of these calls lock anything. A value returned here may be stale by the time the caller acts on it, which is
/// why mutations always re-check their preconditions in the store.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, LedgerError>;

    async fn fetch_payment(&self, provider_id: &str) -> Result<Option<Payment>, LedgerError>;

    async fn fetch_payments_for_order(&self, order_id: &OrderId) -> Result<Vec<Payment>, LedgerError>;

    /// There is at most one commission record per order.
    async fn fetch_commission_record(&self, order_id: &OrderId) -> Result<Option<CommissionRecord>, LedgerError>;

    async fn fetch_revenue_records(&self, order_id: &OrderId) -> Result<Vec<RevenueRecord>, LedgerError>;

    /// Notifications for the user, most recent first.
    async fn fetch_notifications(&self, user_id: &str) -> Result<Vec<Notification>, LedgerError>;
}
