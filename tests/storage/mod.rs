//! Shared storage integration tests.
//!
//! Tests the OrderStore interface against all SQL implementations.
//! Each implementation module imports these test functions and runs them.

#[macro_use]
pub mod order_store_tests;
