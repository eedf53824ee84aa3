//! Bus handlers that feed inbound payloads into the services.

pub mod ingest;

pub use ingest::IngestHandler;
