use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType},
    traits::{ClaimedOrder, LedgerError},
};

#[derive(Debug, Clone, Error)]
pub enum ClaimError {
    #[error("Order {0} has already been taken by another booster")]
    AlreadyAssigned(OrderId),
    #[error("Order {order_id} cannot be claimed while it is {status}")]
    NotPayable { order_id: OrderId, status: OrderStatusType },
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("The settlement for order {0} could not be recorded. The claim was rolled back. {1}")]
    SettlementFailed(OrderId, String),
    #[error("The claim could not be completed because of a temporary problem. {0}")]
    Transient(String),
}

impl ClaimError {
    /// Whether the caller may retry the claim, starting from a fresh read of the order.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClaimError::Transient(_) | ClaimError::SettlementFailed(..))
    }

    /// A message that is safe to show to the booster who tried to claim.
    pub fn user_message(&self) -> String {
        match self {
            ClaimError::AlreadyAssigned(_) => "This order was already taken by another booster.".into(),
            ClaimError::NotPayable { status: OrderStatusType::Pending, .. } => {
                "This order has not been paid for yet.".into()
            },
            ClaimError::NotPayable { status, .. } => format!("This order is {status} and cannot be claimed."),
            ClaimError::OrderNotFound(id) => format!("Order {id} does not exist."),
            ClaimError::SettlementFailed(..) | ClaimError::Transient(_) => {
                "Something went wrong on our side. Please try again.".into()
            },
        }
    }

    pub(crate) fn from_ledger(order_id: &OrderId, e: LedgerError) -> Self {
        match e {
            LedgerError::OrderNotFound(id) => ClaimError::OrderNotFound(id),
            LedgerError::DatabaseError(s) => ClaimError::Transient(s),
            other => ClaimError::SettlementFailed(order_id.clone(), other.to_string()),
        }
    }
}

/// The exit contract of a claim, flattened for callers that only need to know which way it went.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "settlement", rename_all = "snake_case")]
pub enum ClaimOutcome {
    Assigned(ClaimedOrder),
    AlreadyAssigned,
    NotPayable,
    TransientError,
}

impl From<Result<ClaimedOrder, ClaimError>> for ClaimOutcome {
    fn from(result: Result<ClaimedOrder, ClaimError>) -> Self {
        match result {
            Ok(claimed) => ClaimOutcome::Assigned(claimed),
            Err(ClaimError::AlreadyAssigned(_)) => ClaimOutcome::AlreadyAssigned,
            Err(ClaimError::NotPayable { .. } | ClaimError::OrderNotFound(_)) => ClaimOutcome::NotPayable,
            Err(ClaimError::SettlementFailed(..) | ClaimError::Transient(_)) => ClaimOutcome::TransientError,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CommissionError {
    #[error("Commission percentage {0} is outside the range [0, 1]")]
    InvalidPercentage(f64),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<LedgerError> for CommissionError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InvalidPercentage(p) => CommissionError::InvalidPercentage(p),
            other => CommissionError::DatabaseError(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum PaymentEventError {
    #[error("The payment event could not be parsed: {0}")]
    InvalidPayload(String),
    #[error("The payment event does not identify a payment")]
    MissingProviderId,
    #[error("{0}")]
    Store(#[from] LedgerError),
}
