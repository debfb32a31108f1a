//! Helpers for tests that need a throw-away database.
pub mod prepare_env;
