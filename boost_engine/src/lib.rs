//! Boost Settlement Engine
//!
//! The engine coordinates paid service orders between clients, boosters (the workers who fulfil them) and the
//! platform. It guarantees that exactly one booster can claim an order, settles the commission split in the same
//! unit of work as the claim, and consumes payment provider callbacks idempotently.
//!
//! The library is divided into these sections:
//! 1. Backend contracts ([`mod@traits`]) and the SQLite backend ([`SqliteDatabase`]). You should never need to
//!    access the database directly. Use the public APIs instead. The data types stored in the database are defined
//!    in [`mod@db_types`] and are public.
//! 2. The engine APIs ([`ClaimApi`], [`LedgerApi`], [`CommissionApi`] and [`PaymentEventApi`]).
//! 3. Commission resolution ([`mod@commission`]), which is pure logic with no side effects.
//!
//! The engine also publishes events after each committed change (an order being claimed, paid for, or annulled).
//! Hook into them with [`events::EventHooks`].
pub mod commission;
pub mod db_types;
pub mod events;
pub mod traits;

mod engine_api;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use engine_api::{
    claim_api::ClaimApi,
    commission_api::CommissionApi,
    errors::{ClaimError, ClaimOutcome, CommissionError, PaymentEventError},
    ledger_api::LedgerApi,
    payment_event_api::PaymentEventApi,
    payment_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{
    ClaimAttempt,
    ClaimedOrder,
    CommissionManagement,
    IgnoreReason,
    LedgerError,
    OrderManagement,
    PaymentTransition,
    Settlement,
    SettlementDatabase,
    WebhookAck,
};
