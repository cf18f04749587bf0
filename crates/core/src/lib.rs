//! Food Delivery Core - Shared domain library.
//!
//! This crate holds the parts of the platform that do not touch I/O:
//! - `types` - IDs, money, the order lifecycle, roles and capabilities
//! - `pricing` - line totals, the shipping threshold and order totals
//! - `filter` - parsing of order list filters and their predicates
//! - `analytics` - day windows and the restaurant dashboard counters
//!
//! The `api` crate persists and serves these types; the `cli` crate seeds
//! them. Enable the `postgres` feature for `sqlx` encode/decode support.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod filter;
pub mod pricing;
pub mod types;

pub use types::*;
