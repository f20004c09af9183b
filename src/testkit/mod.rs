//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`domain`] - Builders for trades, exits and trade requests.
//! - [`store`] - A memory store seeded with an account.

pub mod domain;
pub mod store;
