//! # Boost settlement server
//! This crate hosts the settlement engine behind an HTTP API. It is responsible for:
//! * Receiving payment provider callbacks, checking their HMAC signatures and handing them to the engine.
//! * Letting boosters claim, start and complete orders.
//! * Letting admins cancel orders, inspect settlements and manage the commission configuration.
//!
//! The server holds no business rules. Everything it does is a call into `boost_engine`.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/webhook/payments`: Payment provider callbacks. Requires a valid `X-Boost-Hmac-SHA256` header.
//! * `/api/...`: Order and commission routes. Require a bearer token issued by the auth service.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;
