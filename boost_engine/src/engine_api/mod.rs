//! # Settlement engine public API
//!
//! The API is split by concern, so hosts can pick the parts they need. Each API is created from a backend that
//! implements the traits the API requires:
//!
//! * [`ledger_api`] covers order intake, order lifecycle transitions and settlement queries.
//! * [`claim_api`] is the race-safe claim coordinator.
//! * [`commission_api`] manages the commission configuration and resolves splits.
//! * [`payment_event_api`] consumes payment provider callbacks idempotently.
//!
//! ```rust,ignore
//! use boost_engine::{ClaimApi, SqliteDatabase, events::EventProducers};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = ClaimApi::new(db, EventProducers::default());
//! let claimed = api.claim(&order_id, "booster-7").await?;
//! ```
pub mod claim_api;
pub mod commission_api;
pub mod errors;
pub mod ledger_api;
pub mod payment_event_api;
pub mod payment_objects;
