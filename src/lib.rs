//! Order Service
//!
//! Consumes order records from a message channel, persists each one
//! transactionally into a relational store, and serves them from an
//! in-memory read cache that is rebuilt from the store on startup.
//!
//! ```text
//! [bus] -> IngestHandler -> OrderPipeline -> OrderStore (SQL)
//!                                        \-> OrderCache <- api (HTTP)
//! ```

pub mod api;
pub mod bus;
pub mod cache;
pub mod config;
pub mod handlers;
pub mod model;
pub mod services;
pub mod storage;
pub mod utils;
