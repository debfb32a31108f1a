use serde::{Deserialize, Serialize};

use crate::db_types::{CommissionRecord, Order, OrderStatusType, Payment, PaymentStatus, RevenueRecord};

/// The records written by a successful claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimedOrder {
    pub order: Order,
    pub commission: CommissionRecord,
    pub revenue: RevenueRecord,
}

/// The outcome of the conditional assignment at the heart of a claim.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimAttempt {
    /// This worker won the claim, and the settlement has been committed.
    Won(ClaimedOrder),
    /// The conditional update touched no rows. The order, as it was re-read after the update, is attached.
    Lost(Order),
}

/// The settlement view of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub order: Order,
    pub commission: Option<CommissionRecord>,
    pub revenue: Vec<RevenueRecord>,
}

/// The effect of an applied payment event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransition {
    pub payment: Payment,
    pub previous_status: PaymentStatus,
    pub order: Order,
    /// The order status before the event, if the event changed it.
    pub previous_order_status: Option<OrderStatusType>,
}

impl PaymentTransition {
    pub fn order_changed(&self) -> bool {
        self.previous_order_status.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// No local payment has the event's provider id.
    UnknownPayment,
    /// The local payment already has the event's status.
    AlreadyApplied,
    /// The local payment is in a state the event does not apply to.
    PreconditionNotMet,
    /// The event does not carry a status this system acts on.
    UnrecognisedEvent,
}

/// Payment events are always acknowledged. `Ignored` events change nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", content = "detail", rename_all = "snake_case")]
pub enum WebhookAck {
    Applied(PaymentTransition),
    Ignored(IgnoreReason),
}

impl WebhookAck {
    pub fn is_applied(&self) -> bool {
        matches!(self, WebhookAck::Applied(_))
    }
}
