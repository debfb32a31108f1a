use serde::{Deserialize, Serialize};

use crate::db_types::{CommissionRecord, Order, OrderStatusType, Payment};

/// A worker won the claim race and the settlement has been committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderClaimedEvent {
    pub order: Order,
    pub commission: CommissionRecord,
}

impl OrderClaimedEvent {
    pub fn new(order: Order, commission: CommissionRecord) -> Self {
        Self { order, commission }
    }
}

/// A payment provider confirmed payment and the order moved to `Paid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub payment: Payment,
}

impl OrderPaidEvent {
    pub fn new(order: Order, payment: Payment) -> Self {
        Self { order, payment }
    }
}

/// The order was cancelled, or a dispute was raised against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub status: OrderStatusType,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        let status = order.status;
        Self { order, status }
    }
}
