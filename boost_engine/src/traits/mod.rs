//! # Backend contracts
//!
//! This module defines the behaviour a storage backend must expose to host the settlement engine.
//!
//! * [`SettlementDatabase`] holds every *mutating* operation. Each method is one unit of work: the backend commits all
//!   of its writes, or none of them.
//! * [`OrderManagement`] provides read-only queries over orders, payments, settlement records and notifications.
//! * [`CommissionManagement`] covers the commission configuration, worker overrides and split resolution.
//!
//! The engine APIs in this crate are generic over these traits, so the business rules never depend on a particular
//! store.
mod commission_management;
mod data_objects;
mod order_management;
mod settlement_database;

pub use commission_management::CommissionManagement;
pub use data_objects::{ClaimAttempt, ClaimedOrder, IgnoreReason, PaymentTransition, Settlement, WebhookAck};
pub use order_management::OrderManagement;
pub use settlement_database::{LedgerError, SettlementDatabase};
