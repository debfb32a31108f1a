//! Data types shared by the engine API and its database backends.
//!
//! Row types derive `FromRow`, and enum columns are stored as their `SCREAMING_SNAKE_CASE` variant names.
use std::{fmt::Display, str::FromStr};

use boost_common::Cents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------        OrderId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been placed, but the client has not paid for it yet.
    Pending,
    /// The order is paid for and waiting for a worker to claim it.
    Paid,
    /// A worker has claimed the order.
    Assigned,
    /// The assigned worker has started on the order.
    InProgress,
    /// The worker has delivered the order.
    Completed,
    /// The order was cancelled by the client, an admin, or a payment refund.
    Cancelled,
    /// The client or worker has raised a dispute over the order.
    Disputed,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 7] = [
        OrderStatusType::Pending,
        OrderStatusType::Paid,
        OrderStatusType::Assigned,
        OrderStatusType::InProgress,
        OrderStatusType::Completed,
        OrderStatusType::Cancelled,
        OrderStatusType::Disputed,
    ];

    /// Whether an order in this status must have a worker attached.
    pub fn holds_worker(&self) -> bool {
        matches!(self, Self::Assigned | Self::InProgress | Self::Completed | Self::Disputed)
    }

    /// `Completed` and `Cancelled` end the claim and settlement lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// The order ledger transition table.
    ///
    /// | From \ To   | Paid | Assigned | InProgress | Completed | Cancelled | Disputed |
    /// |-------------|------|----------|------------|-----------|-----------|----------|
    /// | Pending     | ✓    |          |            |           | ✓         |          |
    /// | Paid        |      | ✓        |            |           | ✓         |          |
    /// | Assigned    |      |          | ✓          | ✓         |           |          |
    /// | InProgress  |      |          |            | ✓         | ✓         | ✓        |
    /// | Completed   |      |          |            |           |           | ✓        |
    ///
    /// `Paid -> Assigned` is only ever performed by the claim coordinator.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, next),
            (Pending, Paid) |
                (Pending, Cancelled) |
                (Paid, Assigned) |
                (Paid, Cancelled) |
                (Assigned, InProgress) |
                (Assigned, Completed) |
                (InProgress, Completed) |
                (InProgress, Cancelled) |
                (InProgress, Disputed) |
                (Completed, Disputed)
        )
    }

    /// All the statuses from which `next` can be reached.
    pub fn predecessors_of(next: OrderStatusType) -> Vec<OrderStatusType> {
        Self::ALL.into_iter().filter(|s| s.can_transition_to(next)).collect()
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "PENDING"),
            OrderStatusType::Paid => write!(f, "PAID"),
            OrderStatusType::Assigned => write!(f, "ASSIGNED"),
            OrderStatusType::InProgress => write!(f, "IN_PROGRESS"),
            OrderStatusType::Completed => write!(f, "COMPLETED"),
            OrderStatusType::Cancelled => write!(f, "CANCELLED"),
            OrderStatusType::Disputed => write!(f, "DISPUTED"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "ASSIGNED" => Ok(Self::Assigned),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "DISPUTED" => Ok(Self::Disputed),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------        Order       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    /// The client that placed the order
    pub owner_id: String,
    /// The worker that claimed the order. Only set while the status holds a worker.
    pub worker_id: Option<String>,
    pub service_id: String,
    /// The platform stakeholder that revenue for this order is attributed to
    pub admin_id: Option<String>,
    pub total_price: Cents,
    pub status: OrderStatusType,
    /// Denormalized settlement snapshot, written when the order is claimed
    pub worker_commission: Option<Cents>,
    pub admin_revenue: Option<Cents>,
    pub worker_percentage: Option<f64>,
    pub platform_percentage: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_claimable(&self) -> bool {
        self.status == OrderStatusType::Paid && self.worker_id.is_none()
    }
}

//--------------------------------------        NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub owner_id: String,
    pub service_id: String,
    pub admin_id: Option<String>,
    /// The total price of the order. Must be positive.
    pub total_price: Cents,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(order_id: OrderId, owner_id: String, service_id: String, total_price: Cents) -> Self {
        Self { order_id, owner_id, service_id, admin_id: None, total_price, created_at: Utc::now() }
    }

    pub fn with_admin(mut self, admin_id: String) -> Self {
        self.admin_id = Some(admin_id);
        self
    }
}

//-----------------------------------------   PaymentStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
    Expired,
    Cancelled,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 5] =
        [PaymentStatus::Pending, PaymentStatus::Paid, PaymentStatus::Refunded, PaymentStatus::Expired, PaymentStatus::Cancelled];
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Paid => write!(f, "PAID"),
            PaymentStatus::Refunded => write!(f, "REFUNDED"),
            PaymentStatus::Expired => write!(f, "EXPIRED"),
            PaymentStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            "REFUNDED" => Ok(Self::Refunded),
            "EXPIRED" => Ok(Self::Expired),
            "CANCELLED" | "CANCELED" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------        Payment       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    /// The identifier the payment provider uses for this payment
    pub provider_id: String,
    pub order_id: OrderId,
    pub amount: Cents,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub provider_id: String,
    pub order_id: OrderId,
    pub amount: Cents,
}

impl NewPayment {
    pub fn new(provider_id: String, order_id: OrderId, amount: Cents) -> Self {
        Self { provider_id, order_id, amount }
    }
}

//--------------------------------------   CommissionConfig    ---------------------------------------------------------
/// The global default split. Only the single `enabled` row is ever consulted.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CommissionConfig {
    pub id: i64,
    pub worker_percentage: f64,
    /// Stored for reporting only. The engine always derives the platform share as the complement of the worker share.
    pub platform_percentage: f64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     WorkerProfile     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub worker_id: String,
    pub commission_override: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   SettlementStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    Pending,
    Paid,
    Cancelled,
}

impl Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementStatus::Pending => write!(f, "PENDING"),
            SettlementStatus::Paid => write!(f, "PAID"),
            SettlementStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

//--------------------------------------   CommissionRecord    ---------------------------------------------------------
/// The worker's share of a claimed order. There is at most one of these per order.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct CommissionRecord {
    pub id: i64,
    pub order_id: OrderId,
    pub worker_id: String,
    /// Snapshot of the order total at claim time
    pub order_total: Cents,
    pub percentage: f64,
    pub amount: Cents,
    pub status: SettlementStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     RevenueRecord     ---------------------------------------------------------
/// The platform's share of a claimed order. A `None` admin id attributes the revenue to the platform itself.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct RevenueRecord {
    pub id: i64,
    pub order_id: OrderId,
    pub admin_id: Option<String>,
    pub order_total: Cents,
    pub percentage: f64,
    pub amount: Cents,
    pub status: SettlementStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   NotificationType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    OrderPaid,
    OrderClaimed,
    OrderCompleted,
    OrderCancelled,
    PaymentRefunded,
    PaymentExpired,
    PaymentCancelled,
}

impl Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationType::OrderPaid => "ORDER_PAID",
            NotificationType::OrderClaimed => "ORDER_CLAIMED",
            NotificationType::OrderCompleted => "ORDER_COMPLETED",
            NotificationType::OrderCancelled => "ORDER_CANCELLED",
            NotificationType::PaymentRefunded => "PAYMENT_REFUNDED",
            NotificationType::PaymentExpired => "PAYMENT_EXPIRED",
            NotificationType::PaymentCancelled => "PAYMENT_CANCELLED",
        };
        f.write_str(s)
    }
}

//--------------------------------------     Notification      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub order_id: Option<OrderId>,
}

impl NewNotification {
    pub fn new(
        user_id: impl Into<String>,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            notification_type,
            title: title.into(),
            message: message.into(),
            order_id: None,
        }
    }

    pub fn for_order(mut self, order_id: &OrderId) -> Self {
        self.order_id = Some(order_id.clone());
        self
    }
}

//--------------------------------------         Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Client,
    Booster,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Client => write!(f, "CLIENT"),
            Role::Booster => write!(f, "BOOSTER"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CLIENT" | "USER" => Ok(Self::Client),
            "BOOSTER" | "WORKER" => Ok(Self::Booster),
            "ADMIN" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}
